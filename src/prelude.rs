//! Rampart Prelude - Common imports for assessment tooling
//!
//! Re-exports the most commonly used types so an assessment pipeline can
//! pull the whole engine surface with a single import.
//!
//! # Usage
//!
//! ```ignore
//! use rampart::prelude::*;
//!
//! let taxonomy = TaxonomyStore::load(definition)?;
//! let mut state = AssessmentStateStore::new(&taxonomy);
//! ```
//!
//! # What's Included
//!
//! ## Catalog Taxonomy
//! - [`TaxonomyStore`], [`CatalogDefinition`], [`Family`], [`Control`], [`Objective`]
//!
//! ## Assessment State
//! - [`AssessmentStateStore`], [`AssessmentRecord`], [`ObjectiveStatus`],
//!   [`ControlStatus`], [`FamilyRollup`]
//!
//! ## Scoring
//! - [`ScoringEngine`], [`ScoringConfig`], [`WeightTable`], [`ScoreBreakdown`]
//!
//! ## Crosswalks
//! - [`CrosswalkEngine`], [`CrosswalkEntry`], [`ChangeType`], [`MigrationReport`]
//!
//! ## Responsibility
//! - [`ResponsibilityClassifier`], [`ResponsibilityType`], [`ProviderTemplate`]
//!
//! ## Reporting
//! - [`ReportAssembler`], [`AssessmentDocument`], [`EvidenceSource`],
//!   [`EvidenceCatalog`], [`OrganizationProfile`]
//!
//! ## Error Handling
//! - [`Error`], [`ErrorKind`], [`Result`]

// =============================================================================
// Catalog Taxonomy
// =============================================================================

pub use crate::taxonomy::{CatalogDefinition, Control, Family, Objective, TaxonomyStore};

// =============================================================================
// Assessment State
// =============================================================================

pub use crate::state::{
    AssessmentRecord, AssessmentStateStore, ControlStatus, FamilyRollup, ObjectiveStatus,
};

// =============================================================================
// Scoring
// =============================================================================

pub use crate::scoring::{ScoreBreakdown, ScoringConfig, ScoringEngine, WeightTable};

// =============================================================================
// Crosswalks
// =============================================================================

pub use crate::crosswalk::{ChangeType, CrosswalkEngine, CrosswalkEntry, MigrationReport};

// =============================================================================
// Responsibility
// =============================================================================

pub use crate::responsibility::{
    ProviderTemplate, ResponsibilityClassifier, ResponsibilitySummary, ResponsibilityType,
};

// =============================================================================
// Reporting
// =============================================================================

pub use crate::report::{
    AssessmentDocument, EvidenceCatalog, EvidenceSource, OrganizationProfile, ReportAssembler,
};

// =============================================================================
// Error Handling
// =============================================================================

pub use crate::error::{Error, ErrorKind, Result};
