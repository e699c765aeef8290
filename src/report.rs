//! Assessment Report Assembly
//!
//! Composes the outputs of the other engines into one sectioned assessment
//! document. The assembler is a builder: collaborator outputs are attached
//! one by one, and [`ReportAssembler::assemble`] either produces a complete
//! document or fails naming the first missing required input. There is no
//! partial document.
//!
//! # Usage
//!
//! ```ignore
//! use rampart::report::{EvidenceCatalog, OrganizationProfile, ReportAssembler};
//!
//! let document = ReportAssembler::new()
//!     .taxonomy(&taxonomy)
//!     .state(&state)
//!     .score(engine.score_breakdown(&state, &weights))
//!     .responsibility(classifier.summarize(&taxonomy))
//!     .organization(profile)
//!     .evidence(&evidence)
//!     .assemble()?;
//!
//! println!("{document}");
//! std::fs::write("assessment.json", document.to_json()?)?;
//! ```

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::crosswalk::MigrationReport;
use crate::error::{Error, Result};
use crate::responsibility::ResponsibilitySummary;
use crate::scoring::ScoreBreakdown;
use crate::state::{AssessmentStateStore, ControlStatus, FamilyRollup, ObjectiveStatus};
use crate::taxonomy::TaxonomyStore;

// ============================================================================
// Evidence
// ============================================================================

/// One resolved piece of supporting evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// The reference that resolved to this item
    pub reference: String,

    /// What the evidence is
    pub description: String,

    /// Where the evidence lives, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Resolves the opaque evidence references carried by assessment records
///
/// Records store references, not evidence; callers own the actual evidence
/// inventory. An unresolvable reference is not an error, it surfaces in
/// the document's `unresolved_refs` so the gap is visible.
pub trait EvidenceSource {
    /// Resolve one reference, `None` when unknown
    fn resolve(&self, reference: &str) -> Option<EvidenceItem>;
}

/// Map-backed [`EvidenceSource`]
#[derive(Debug, Clone, Default)]
pub struct EvidenceCatalog {
    items: HashMap<String, EvidenceItem>,
}

impl EvidenceCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an evidence item, keyed by its reference
    pub fn add(
        &mut self,
        reference: impl Into<String>,
        description: impl Into<String>,
        location: Option<String>,
    ) {
        let reference = reference.into();
        self.items.insert(
            reference.clone(),
            EvidenceItem {
                reference,
                description: description.into(),
                location,
            },
        );
    }

    /// Number of items in the catalog
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl EvidenceSource for EvidenceCatalog {
    fn resolve(&self, reference: &str) -> Option<EvidenceItem> {
        self.items.get(reference).cloned()
    }
}

// ============================================================================
// Document Types
// ============================================================================

/// Who was assessed, by whom, and what the assessment covered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationProfile {
    /// Assessed organization
    pub name: String,

    /// Assessed system
    pub system_name: String,

    /// Assessor name or team
    pub assessed_by: String,

    /// Scope statement, when one was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_scope: Option<String>,
}

/// Document header and catalog identification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOverview {
    /// Who/what was assessed
    pub organization: OrganizationProfile,

    /// Version label of the assessed catalog
    pub catalog_version: String,

    /// Catalog size: families
    pub family_count: usize,

    /// Catalog size: controls
    pub control_count: usize,

    /// Catalog size: objectives
    pub objective_count: usize,

    /// Objectives with a written record
    pub assessed_objective_count: usize,

    /// When the document was assembled
    pub generated_at: DateTime<Utc>,
}

/// Objective-level detail row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveRow {
    /// The objective
    pub objective_id: String,

    /// Recorded status, `not-assessed` when no record exists
    pub status: ObjectiveStatus,

    /// Evidence the source resolved
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<EvidenceItem>,

    /// References the source could not resolve
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_refs: Vec<String>,
}

/// Control-level detail row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlRow {
    /// The control
    pub control_id: String,

    /// Its catalog name
    pub name: String,

    /// Derived status
    pub status: ControlStatus,

    /// Responsibility label, `not-assigned` when unclassified
    pub responsibility: String,

    /// Per-objective rows, in catalog order
    pub objectives: Vec<ObjectiveRow>,
}

/// One family's section of the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilySection {
    /// The family
    pub family_id: String,

    /// Its catalog name
    pub name: String,

    /// Derived control status counts
    pub rollup: FamilyRollup,

    /// Per-control rows, in catalog order
    pub controls: Vec<ControlRow>,
}

/// Complete assembled assessment document
///
/// Sections appear in fixed order: overview, per-family control tables,
/// score summary, responsibility summary, then the migration summary when
/// one was supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentDocument {
    /// Document header
    pub overview: ReportOverview,

    /// Per-family control tables
    pub families: Vec<FamilySection>,

    /// Score computation with per-control accounting
    pub score: ScoreBreakdown,

    /// Responsibility buckets over the catalog
    pub responsibility: ResponsibilitySummary,

    /// Migration accounting, when the assessment followed a catalog
    /// migration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration: Option<MigrationReport>,
}

impl AssessmentDocument {
    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Serialize to compact JSON
    pub fn to_json_compact(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for AssessmentDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Assessment Report ===")?;
        writeln!(
            f,
            "Organization: {} ({})",
            self.overview.organization.name, self.overview.organization.system_name
        )?;
        writeln!(f, "Assessed by:  {}", self.overview.organization.assessed_by)?;
        writeln!(f, "Catalog:      {}", self.overview.catalog_version)?;
        writeln!(
            f,
            "Coverage:     {}/{} objectives assessed",
            self.overview.assessed_objective_count, self.overview.objective_count
        )?;
        writeln!(f)?;

        for family in &self.families {
            writeln!(f, "--- {} {} ---", family.family_id, family.name)?;
            for control in &family.controls {
                writeln!(
                    f,
                    "  {} {} [{}] ({})",
                    control.control_id, control.name, control.status, control.responsibility
                )?;
                for objective in &control.objectives {
                    writeln!(f, "    {} {}", objective.objective_id, objective.status)?;
                }
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Score: {} (baseline {}, floor {}{})",
            self.score.score,
            self.score.baseline,
            self.score.floor,
            if self.score.clamped { ", clamped" } else { "" }
        )?;
        for deduction in &self.score.deductions {
            writeln!(
                f,
                "  -{} {} [{}]",
                deduction.weight, deduction.control_id, deduction.status
            )?;
        }

        writeln!(f)?;
        let counts = &self.responsibility.counts;
        writeln!(f, "Responsibility:")?;
        writeln!(f, "  fully-inherited: {}", counts.fully_inherited)?;
        writeln!(f, "  shared:          {}", counts.shared)?;
        writeln!(f, "  customer:        {}", counts.customer)?;
        writeln!(f, "  hybrid:          {}", counts.hybrid)?;
        writeln!(f, "  not-assigned:    {}", counts.not_assigned)?;

        if let Some(migration) = &self.migration {
            writeln!(f)?;
            write!(f, "{migration}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Assembler
// ============================================================================

/// Builder that composes engine outputs into an [`AssessmentDocument`]
///
/// Required inputs: taxonomy, state, score breakdown, responsibility
/// summary, organization profile, evidence source. Optional: migration
/// report.
pub struct ReportAssembler<'a> {
    taxonomy: Option<&'a TaxonomyStore>,
    state: Option<&'a AssessmentStateStore<'a>>,
    score: Option<ScoreBreakdown>,
    responsibility: Option<ResponsibilitySummary>,
    organization: Option<OrganizationProfile>,
    evidence: Option<&'a dyn EvidenceSource>,
    migration: Option<MigrationReport>,
}

impl<'a> ReportAssembler<'a> {
    /// Create an assembler with no inputs attached
    pub fn new() -> Self {
        Self {
            taxonomy: None,
            state: None,
            score: None,
            responsibility: None,
            organization: None,
            evidence: None,
            migration: None,
        }
    }

    /// Attach the assessed taxonomy
    pub fn taxonomy(mut self, taxonomy: &'a TaxonomyStore) -> Self {
        self.taxonomy = Some(taxonomy);
        self
    }

    /// Attach the assessment state
    pub fn state(mut self, state: &'a AssessmentStateStore<'a>) -> Self {
        self.state = Some(state);
        self
    }

    /// Attach the score breakdown
    pub fn score(mut self, score: ScoreBreakdown) -> Self {
        self.score = Some(score);
        self
    }

    /// Attach the responsibility summary
    pub fn responsibility(mut self, summary: ResponsibilitySummary) -> Self {
        self.responsibility = Some(summary);
        self
    }

    /// Attach the organization profile
    pub fn organization(mut self, profile: OrganizationProfile) -> Self {
        self.organization = Some(profile);
        self
    }

    /// Attach the evidence source
    pub fn evidence(mut self, source: &'a dyn EvidenceSource) -> Self {
        self.evidence = Some(source);
        self
    }

    /// Attach a migration report (optional section)
    pub fn migration(mut self, report: MigrationReport) -> Self {
        self.migration = Some(report);
        self
    }

    /// Assemble the document
    ///
    /// Fails [`Error::MissingInput`] naming the first absent required
    /// input; no partial document is ever produced.
    pub fn assemble(self) -> Result<AssessmentDocument> {
        let taxonomy = self.taxonomy.ok_or(Error::MissingInput("taxonomy"))?;
        let state = self.state.ok_or(Error::MissingInput("state"))?;
        let score = self.score.ok_or(Error::MissingInput("score breakdown"))?;
        let responsibility = self
            .responsibility
            .ok_or(Error::MissingInput("responsibility summary"))?;
        let organization = self
            .organization
            .ok_or(Error::MissingInput("organization profile"))?;
        let evidence = self.evidence.ok_or(Error::MissingInput("evidence source"))?;

        let responsibility_by_control: HashMap<&str, &str> = responsibility
            .rows
            .iter()
            .map(|row| {
                let label = row
                    .assignment
                    .as_ref()
                    .map(|a| a.responsibility.label())
                    .unwrap_or("not-assigned");
                (row.control_id.as_str(), label)
            })
            .collect();

        let families = taxonomy
            .families()
            .iter()
            .map(|family| {
                let controls = family
                    .controls
                    .iter()
                    .map(|control| {
                        let objectives = control
                            .objectives
                            .iter()
                            .map(|objective| {
                                let mut items = Vec::new();
                                let mut unresolved = Vec::new();
                                if let Some(record) = state.record(&objective.id) {
                                    for reference in &record.evidence_refs {
                                        match evidence.resolve(reference) {
                                            Some(item) => items.push(item),
                                            None => unresolved.push(reference.clone()),
                                        }
                                    }
                                }
                                ObjectiveRow {
                                    objective_id: objective.id.clone(),
                                    status: state.status(&objective.id),
                                    evidence: items,
                                    unresolved_refs: unresolved,
                                }
                            })
                            .collect();
                        ControlRow {
                            control_id: control.id.clone(),
                            name: control.name.clone(),
                            status: state.control_status(control),
                            responsibility: responsibility_by_control
                                .get(control.id.as_str())
                                .copied()
                                .unwrap_or("not-assigned")
                                .to_string(),
                            objectives,
                        }
                    })
                    .collect();
                FamilySection {
                    family_id: family.id.clone(),
                    name: family.name.clone(),
                    rollup: state.family_rollup(family),
                    controls,
                }
            })
            .collect();

        let overview = ReportOverview {
            organization,
            catalog_version: taxonomy.version().to_string(),
            family_count: taxonomy.family_count(),
            control_count: taxonomy.control_count(),
            objective_count: taxonomy.objective_count(),
            assessed_objective_count: state.record_count(),
            generated_at: Utc::now(),
        };

        info!(
            catalog_version = overview.catalog_version,
            score = score.score,
            "assessment document assembled"
        );

        Ok(AssessmentDocument {
            overview,
            families,
            score,
            responsibility,
            migration: self.migration,
        })
    }
}

impl Default for ReportAssembler<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::responsibility::{ResponsibilityClassifier, ResponsibilityType};
    use crate::scoring::{ScoringConfig, ScoringEngine, WeightTable};
    use crate::taxonomy::CatalogDefinition;

    fn catalog() -> TaxonomyStore {
        let definition: CatalogDefinition = serde_json::from_value(serde_json::json!({
            "version": "rev2",
            "families": [
                {
                    "id": "3.1",
                    "name": "Access Control",
                    "controls": [
                        {
                            "id": "3.1.1",
                            "name": "Limit system access",
                            "description": "",
                            "objectives": [
                                { "id": "3.1.1[a]", "text": "a" },
                                { "id": "3.1.1[b]", "text": "b" }
                            ]
                        }
                    ]
                }
            ]
        }))
        .unwrap();
        TaxonomyStore::load(definition).unwrap()
    }

    fn profile() -> OrganizationProfile {
        OrganizationProfile {
            name: "Acme Defense".to_string(),
            system_name: "Contract Data Enclave".to_string(),
            assessed_by: "Internal Audit".to_string(),
            assessment_scope: None,
        }
    }

    #[test]
    fn test_assemble_requires_every_input() {
        let err = ReportAssembler::new().assemble().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingInput);
        assert!(err.to_string().contains("taxonomy"));

        let taxonomy = catalog();
        let err = ReportAssembler::new()
            .taxonomy(&taxonomy)
            .assemble()
            .unwrap_err();
        assert!(err.to_string().contains("state"));
    }

    #[test]
    fn test_assemble_full_document() {
        let taxonomy = catalog();
        let mut state = AssessmentStateStore::new(&taxonomy);
        state
            .set_status_with_evidence("3.1.1[a]", ObjectiveStatus::Met, ["pol-1", "ghost-ref"])
            .unwrap();
        state
            .set_status("3.1.1[b]", ObjectiveStatus::NotMet)
            .unwrap();

        let engine = ScoringEngine::new(ScoringConfig::default());
        let weights = WeightTable::from_iter([("3.1.1", 5u32)]);

        let mut classifier = ResponsibilityClassifier::new();
        classifier.assign("3.1.1", ResponsibilityType::Shared, None, None);

        let mut evidence = EvidenceCatalog::new();
        evidence.add("pol-1", "Access control policy", Some("wiki/acp".to_string()));

        let document = ReportAssembler::new()
            .taxonomy(&taxonomy)
            .state(&state)
            .score(engine.score_breakdown(&state, &weights))
            .responsibility(classifier.summarize(&taxonomy))
            .organization(profile())
            .evidence(&evidence)
            .assemble()
            .unwrap();

        assert_eq!(document.overview.assessed_objective_count, 2);
        assert_eq!(document.families.len(), 1);

        let control = &document.families[0].controls[0];
        assert_eq!(control.status, ControlStatus::Partial);
        assert_eq!(control.responsibility, "shared");

        let objective = &control.objectives[0];
        assert_eq!(objective.evidence.len(), 1);
        assert_eq!(objective.evidence[0].reference, "pol-1");
        assert_eq!(objective.unresolved_refs, vec!["ghost-ref".to_string()]);

        assert_eq!(document.score.score, 105);
        assert!(document.migration.is_none());
    }

    #[test]
    fn test_document_section_order_in_json() {
        let taxonomy = catalog();
        let state = AssessmentStateStore::new(&taxonomy);
        let engine = ScoringEngine::new(ScoringConfig::default());
        let classifier = ResponsibilityClassifier::new();
        let evidence = EvidenceCatalog::new();

        let document = ReportAssembler::new()
            .taxonomy(&taxonomy)
            .state(&state)
            .score(engine.score_breakdown(&state, &WeightTable::new()))
            .responsibility(classifier.summarize(&taxonomy))
            .organization(profile())
            .evidence(&evidence)
            .assemble()
            .unwrap();

        // keys unique to each section
        let json = document.to_json().unwrap();
        let overview_at = json.find("\"generated_at\"").unwrap();
        let families_at = json.find("\"rollup\"").unwrap();
        let score_at = json.find("\"deductions\"").unwrap();
        let responsibility_at = json.find("\"percentages\"").unwrap();
        assert!(overview_at < families_at);
        assert!(families_at < score_at);
        assert!(score_at < responsibility_at);
    }

    #[test]
    fn test_display_renders_sections() {
        let taxonomy = catalog();
        let mut state = AssessmentStateStore::new(&taxonomy);
        state.set_status("3.1.1[a]", ObjectiveStatus::Met).unwrap();

        let engine = ScoringEngine::new(ScoringConfig::default());
        let classifier = ResponsibilityClassifier::new();
        let evidence = EvidenceCatalog::new();

        let document = ReportAssembler::new()
            .taxonomy(&taxonomy)
            .state(&state)
            .score(engine.score_breakdown(&state, &WeightTable::new()))
            .responsibility(classifier.summarize(&taxonomy))
            .organization(profile())
            .evidence(&evidence)
            .assemble()
            .unwrap();

        let text = document.to_string();
        assert!(text.contains("=== Assessment Report ==="));
        assert!(text.contains("Acme Defense"));
        assert!(text.contains("3.1.1 Limit system access"));
        assert!(text.contains("not-assigned"));
        assert!(text.contains("Score: 110"));
    }
}
