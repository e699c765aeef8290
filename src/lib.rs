//! # Rampart
//!
//! Compliance-assessment data engine for security-requirement catalogs.
//!
//! This crate models control catalogs in the NIST SP 800-171 style
//! (families, requirements, assessment objectives), tracks per-objective
//! assessment status, and derives everything an assessment produces:
//! rollups, SPRS-style scores, catalog-migration reports, and
//! shared-responsibility summaries. It is a pure data engine: no network
//! surface, no storage, no rendering beyond plain text and JSON.
//!
//! ## Features
//!
//! - **Catalog Taxonomy**: validated family/control/objective stores with
//!   O(1) lookups and reverse navigation
//! - **Assessment State**: per-objective status records with evidence
//!   references and derived control/family status
//! - **Scoring**: baseline-minus-deductions scoring with configurable
//!   baseline and floor (SPRS defaults: 110 / -203)
//! - **Crosswalks**: change-typed catalog mappings with validated shape
//!   rules and lossless renumbering migration
//! - **Responsibility**: cloud shared-responsibility classification with
//!   provider templates
//! - **Reporting**: builder-style document assembly with evidence
//!   resolution, JSON export, and plain-text rendering
//!
//! ## Quick Start
//!
//! ```ignore
//! use rampart::prelude::*;
//!
//! let taxonomy = TaxonomyStore::load(definition)?;
//! let mut state = AssessmentStateStore::new(&taxonomy);
//! state.set_status("3.1.1[a]", ObjectiveStatus::Met)?;
//!
//! let engine = ScoringEngine::new(ScoringConfig::from_env());
//! let breakdown = engine.score_breakdown(&state, &weights);
//!
//! let document = ReportAssembler::new()
//!     .taxonomy(&taxonomy)
//!     .state(&state)
//!     .score(breakdown)
//!     .responsibility(classifier.summarize(&taxonomy))
//!     .organization(profile)
//!     .evidence(&evidence)
//!     .assemble()?;
//! ```
//!
//! ## Validation Policy
//!
//! Structure is validated eagerly at `load`/`build` time; downstream
//! computations assume a closed world and fail only when handed an id the
//! paired catalog does not contain. A failed mutation never disturbs
//! prior state.

pub mod crosswalk;
pub mod error;
pub mod observability;
pub mod prelude;
pub mod report;
pub mod responsibility;
pub mod scoring;
pub mod state;
pub mod taxonomy;

// Re-exports
pub use error::{Error, ErrorKind, Result};
pub use report::{AssessmentDocument, ReportAssembler};
pub use scoring::{ScoringConfig, ScoringEngine, WeightTable};
pub use state::{AssessmentStateStore, ControlStatus, ObjectiveStatus};
pub use taxonomy::TaxonomyStore;
