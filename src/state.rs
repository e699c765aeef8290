//! Assessment State Tracking
//!
//! Records the assessed status of individual objectives and derives
//! control- and family-level status from them. The store holds exactly one
//! record per assessed objective; setting a status again overwrites in
//! place. Objectives with no record read as `not-assessed`.
//!
//! # Usage
//!
//! ```ignore
//! use rampart::state::{AssessmentStateStore, ObjectiveStatus};
//!
//! let mut state = AssessmentStateStore::new(&taxonomy);
//! state.set_status("3.1.1[a]", ObjectiveStatus::Met)?;
//! state.set_status("3.1.1[b]", ObjectiveStatus::NotMet)?;
//!
//! let control = taxonomy.control("3.1.1")?;
//! assert_eq!(state.control_status(control), ControlStatus::Partial);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Entity, Error, Result};
use crate::taxonomy::{Control, Family, TaxonomyStore};

// ============================================================================
// Status Vocabulary
// ============================================================================

/// Assessed status of a single objective
///
/// The wire vocabulary is kebab-case: `met`, `partial`, `not-met`,
/// `not-applicable`, `not-assessed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectiveStatus {
    /// The objective is fully satisfied
    Met,
    /// The objective is satisfied in part
    Partial,
    /// The objective is not satisfied
    NotMet,
    /// The objective does not apply to the assessed system
    NotApplicable,
    /// No assessment has been recorded
    #[default]
    NotAssessed,
}

impl ObjectiveStatus {
    /// Parse from a loosely-formatted string
    ///
    /// Accepts the kebab-case wire form plus common snake_case and
    /// spelled-out variants, case-insensitively.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "met" | "satisfied" | "pass" => Some(Self::Met),
            "partial" | "partially-met" | "partially_met" => Some(Self::Partial),
            "not-met" | "not_met" | "unmet" | "fail" => Some(Self::NotMet),
            "not-applicable" | "not_applicable" | "na" | "n/a" => Some(Self::NotApplicable),
            "not-assessed" | "not_assessed" | "unassessed" => Some(Self::NotAssessed),
            _ => None,
        }
    }

    /// The kebab-case wire label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Met => "met",
            Self::Partial => "partial",
            Self::NotMet => "not-met",
            Self::NotApplicable => "not-applicable",
            Self::NotAssessed => "not-assessed",
        }
    }
}

impl fmt::Display for ObjectiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Derived status of a control, computed from its objectives
///
/// Unlike [`ObjectiveStatus`] there is no `not-assessed` value: a control
/// whose objectives are all unassessed derives `not-met`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlStatus {
    /// Every applicable objective is met
    Met,
    /// A mix of met and unmet objectives
    Partial,
    /// No objective is met
    NotMet,
    /// Every objective is not-applicable
    NotApplicable,
}

impl ControlStatus {
    /// The kebab-case wire label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Met => "met",
            Self::Partial => "partial",
            Self::NotMet => "not-met",
            Self::NotApplicable => "not-applicable",
        }
    }
}

impl fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Records
// ============================================================================

/// One assessed objective: status, evidence references, and when it was
/// last touched
///
/// This is also the flat persisted interchange shape; callers own storage
/// and hand the map back through [`AssessmentStateStore::from_records`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    /// Id of the assessed objective
    pub objective_id: String,

    /// Recorded status
    pub status: ObjectiveStatus,

    /// Opaque references to supporting evidence, resolved at report time
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub evidence_refs: BTreeSet<String>,

    /// When this record was last written
    pub last_updated: DateTime<Utc>,
}

/// Per-family counts of derived control statuses
///
/// A family is never collapsed to a single label; callers get the full
/// distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRollup {
    /// Controls deriving `met`
    pub met: usize,
    /// Controls deriving `partial`
    pub partial: usize,
    /// Controls deriving `not-met`
    pub not_met: usize,
    /// Controls deriving `not-applicable`
    pub not_applicable: usize,
}

impl FamilyRollup {
    /// Total controls counted
    pub fn total(&self) -> usize {
        self.met + self.partial + self.not_met + self.not_applicable
    }
}

// ============================================================================
// State Store
// ============================================================================

/// Mutable assessment state paired with the taxonomy it assesses
///
/// Borrows the taxonomy so every mutation can be validated against the
/// catalog; a record is never created for an objective the catalog does
/// not contain.
#[derive(Debug, Clone)]
pub struct AssessmentStateStore<'a> {
    taxonomy: &'a TaxonomyStore,
    records: BTreeMap<String, AssessmentRecord>,
}

impl<'a> AssessmentStateStore<'a> {
    /// Create an empty store over a taxonomy
    pub fn new(taxonomy: &'a TaxonomyStore) -> Self {
        Self {
            taxonomy,
            records: BTreeMap::new(),
        }
    }

    /// Rebuild a store from the flat persisted record map
    ///
    /// Every key must be an objective id the taxonomy contains; the first
    /// foreign id fails [`Error::NotFound`] and no store is produced.
    pub fn from_records(
        taxonomy: &'a TaxonomyStore,
        records: BTreeMap<String, AssessmentRecord>,
    ) -> Result<Self> {
        for id in records.keys() {
            if !taxonomy.contains_objective(id) {
                return Err(Error::not_found(Entity::Objective, id));
            }
        }
        debug!(count = records.len(), "assessment state imported");
        Ok(Self { taxonomy, records })
    }

    /// The taxonomy this state is assessed against
    pub fn taxonomy(&self) -> &'a TaxonomyStore {
        self.taxonomy
    }

    /// Record a status for an objective, keeping any existing evidence refs
    ///
    /// Fails [`Error::NotFound`] for an id foreign to the taxonomy; the
    /// prior record (if any) is left untouched on failure.
    pub fn set_status(&mut self, objective_id: &str, status: ObjectiveStatus) -> Result<()> {
        if !self.taxonomy.contains_objective(objective_id) {
            return Err(Error::not_found(Entity::Objective, objective_id));
        }
        let evidence_refs = self
            .records
            .get(objective_id)
            .map(|r| r.evidence_refs.clone())
            .unwrap_or_default();
        self.write_record(objective_id, status, evidence_refs);
        Ok(())
    }

    /// Record a status together with a replacement set of evidence refs
    pub fn set_status_with_evidence<I, S>(
        &mut self,
        objective_id: &str,
        status: ObjectiveStatus,
        evidence_refs: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.taxonomy.contains_objective(objective_id) {
            return Err(Error::not_found(Entity::Objective, objective_id));
        }
        let refs = evidence_refs.into_iter().map(Into::into).collect();
        self.write_record(objective_id, status, refs);
        Ok(())
    }

    /// Record a status arriving as an untyped string
    ///
    /// The string is parsed at the boundary; an unrecognized value fails
    /// [`Error::Validation`] before any mutation.
    pub fn set_status_str(&mut self, objective_id: &str, status: &str) -> Result<()> {
        let parsed = ObjectiveStatus::from_str_loose(status).ok_or(Error::Validation {
            field: "status",
            actual: status.to_string(),
            expected: "one of met, partial, not-met, not-applicable, not-assessed",
        })?;
        self.set_status(objective_id, parsed)
    }

    fn write_record(
        &mut self,
        objective_id: &str,
        status: ObjectiveStatus,
        evidence_refs: BTreeSet<String>,
    ) {
        debug!(objective_id, status = %status, "objective status recorded");
        self.records.insert(
            objective_id.to_string(),
            AssessmentRecord {
                objective_id: objective_id.to_string(),
                status,
                evidence_refs,
                last_updated: Utc::now(),
            },
        );
    }

    /// The recorded status of an objective, `not-assessed` when no record
    /// exists
    ///
    /// Never fails, even for ids foreign to the taxonomy.
    pub fn status(&self, objective_id: &str) -> ObjectiveStatus {
        self.records
            .get(objective_id)
            .map(|r| r.status)
            .unwrap_or_default()
    }

    /// The full record for an objective, if one has been written
    pub fn record(&self, objective_id: &str) -> Option<&AssessmentRecord> {
        self.records.get(objective_id)
    }

    /// Remove the record for an objective, returning it
    ///
    /// Fails [`Error::NotFound`] for ids foreign to the taxonomy. Returns
    /// `Ok(None)` when the objective exists but was never assessed.
    pub fn clear_status(&mut self, objective_id: &str) -> Result<Option<AssessmentRecord>> {
        if !self.taxonomy.contains_objective(objective_id) {
            return Err(Error::not_found(Entity::Objective, objective_id));
        }
        let removed = self.records.remove(objective_id);
        if removed.is_some() {
            debug!(objective_id, "objective status cleared");
        }
        Ok(removed)
    }

    /// The flat persisted record map, keyed by objective id
    pub fn records(&self) -> &BTreeMap<String, AssessmentRecord> {
        &self.records
    }

    /// Number of objectives with a written record
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    // ------------------------------------------------------------------------
    // Derived status
    // ------------------------------------------------------------------------

    /// Derive the status of a control from its objectives
    ///
    /// - every objective `not-applicable` → `not-applicable`
    /// - every objective `met` or `not-applicable` (at least one `met`) → `met`
    /// - every objective `not-met` or `not-assessed` → `not-met`
    /// - anything else → `partial`
    pub fn control_status(&self, control: &Control) -> ControlStatus {
        let mut met = 0usize;
        let mut not_applicable = 0usize;
        let mut unmet = 0usize;
        let total = control.objectives.len();

        for objective in &control.objectives {
            match self.status(&objective.id) {
                ObjectiveStatus::Met => met += 1,
                ObjectiveStatus::NotApplicable => not_applicable += 1,
                ObjectiveStatus::NotMet | ObjectiveStatus::NotAssessed => unmet += 1,
                ObjectiveStatus::Partial => {}
            }
        }

        if not_applicable == total {
            ControlStatus::NotApplicable
        } else if met + not_applicable == total {
            ControlStatus::Met
        } else if unmet == total {
            ControlStatus::NotMet
        } else {
            ControlStatus::Partial
        }
    }

    /// Derive the status of a control looked up by id
    pub fn control_status_by_id(&self, control_id: &str) -> Result<ControlStatus> {
        let control = self.taxonomy.control(control_id)?;
        Ok(self.control_status(control))
    }

    /// Count derived control statuses across one family
    pub fn family_rollup(&self, family: &Family) -> FamilyRollup {
        let mut rollup = FamilyRollup::default();
        for control in &family.controls {
            match self.control_status(control) {
                ControlStatus::Met => rollup.met += 1,
                ControlStatus::Partial => rollup.partial += 1,
                ControlStatus::NotMet => rollup.not_met += 1,
                ControlStatus::NotApplicable => rollup.not_applicable += 1,
            }
        }
        rollup
    }

    /// Count derived control statuses for a family looked up by id
    pub fn family_rollup_by_id(&self, family_id: &str) -> Result<FamilyRollup> {
        let family = self.taxonomy.family(family_id)?;
        Ok(self.family_rollup(family))
    }
}
