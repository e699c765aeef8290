//! Assessment State Migration
//!
//! Carries assessment records from a source catalog to a target catalog
//! across a validated crosswalk. Migration never loses a record silently:
//! every record either moves, or lands in one of the report's dropped
//! buckets (retired, unmapped, conflicted) with its id listed.
//!
//! Conflicts are never auto-resolved. When two source controls with
//! different derived statuses feed one target control, the target is
//! flagged for manual review and its records are withheld; after
//! [`MigrationReport::apply`] the target reads as `not-assessed` until a
//! human decides.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Entity, Error, Result};
use crate::state::{AssessmentRecord, AssessmentStateStore, ControlStatus};
use crate::taxonomy::TaxonomyStore;

use super::{ChangeType, CrosswalkEngine, CrosswalkEntry};

// ============================================================================
// Report Types
// ============================================================================

/// Per-entry migration outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOutcome {
    /// Source control id, absent for `new` entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_id: Option<String>,

    /// Target control id, absent for outright-retired entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_id: Option<String>,

    /// Change type of the entry
    pub change_type: ChangeType,

    /// Objective records carried into the target under this entry
    pub records_moved: usize,

    /// Objective records dropped under this entry
    pub records_dropped: usize,
}

/// One source control feeding a conflicted target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSource {
    /// The source control id
    pub control_id: String,

    /// Its derived status at migration time
    pub status: ControlStatus,
}

/// A target control fed by sources with conflicting derived statuses
///
/// Flagged for manual review; the records of every feeding source are
/// withheld from the migrated state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationConflict {
    /// The disputed target control
    pub target_control_id: String,

    /// Every feeding source and its derived status
    pub sources: Vec<ConflictSource>,
}

/// Full accounting of one migration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Version label of the source catalog
    pub source_version: String,

    /// Version label of the target catalog
    pub target_version: String,

    /// When the migration ran
    pub generated_at: DateTime<Utc>,

    /// Per-entry outcomes, in source catalog order
    pub outcomes: Vec<EntryOutcome>,

    /// Target controls no source maps onto; they start `not-assessed`
    pub new_in_target: Vec<String>,

    /// Targets flagged for manual review
    pub conflicts: Vec<MigrationConflict>,

    /// Objective records the remapper could not place (dropped)
    pub unmapped_objectives: Vec<String>,

    /// Objective records under outright-retired controls (dropped)
    pub retired: Vec<String>,

    /// The migrated records, keyed by target objective id
    pub records: BTreeMap<String, AssessmentRecord>,
}

impl MigrationReport {
    /// Whether any target needs manual review
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Total records dropped across every bucket
    pub fn dropped_count(&self) -> usize {
        self.unmapped_objectives.len() + self.retired.len()
    }

    /// Materialize the migrated records into a state store over the
    /// target taxonomy
    ///
    /// Conflicted targets stay unwritten and read as `not-assessed`.
    pub fn apply<'a>(&self, target: &'a TaxonomyStore) -> Result<AssessmentStateStore<'a>> {
        AssessmentStateStore::from_records(target, self.records.clone())
    }

    /// Serialize the report to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Serialize the report to compact JSON
    pub fn to_json_compact(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Migration {} -> {}",
            self.source_version, self.target_version
        )?;
        writeln!(f, "  records moved:   {}", self.records.len())?;
        writeln!(f, "  records dropped: {}", self.dropped_count())?;
        writeln!(f, "  new in target:   {}", self.new_in_target.len())?;
        writeln!(f, "  conflicts:       {}", self.conflicts.len())?;
        for conflict in &self.conflicts {
            let feeds: Vec<String> = conflict
                .sources
                .iter()
                .map(|s| format!("{} ({})", s.control_id, s.status))
                .collect();
            writeln!(
                f,
                "    {} <- {} [manual review]",
                conflict.target_control_id,
                feeds.join(", ")
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// Migration
// ============================================================================

impl CrosswalkEngine {
    /// Migrate assessment state from the source catalog to a target
    ///
    /// Walks every source control in catalog order, resolves its entry,
    /// and re-keys each objective record through the caller-supplied
    /// remapper. The remapper sees the source objective id and the entry
    /// and answers with the target objective id, or `None` when the
    /// objective has no counterpart.
    ///
    /// Fails [`Error::NotFound`] when an entry or the remapper names a
    /// control or objective the target taxonomy does not contain, and
    /// when the state's taxonomy holds a control the crosswalk was not
    /// built over.
    pub fn migrate<F>(
        &self,
        state: &AssessmentStateStore<'_>,
        target: &TaxonomyStore,
        remap: F,
    ) -> Result<MigrationReport>
    where
        F: Fn(&str, &CrosswalkEntry) -> Option<String>,
    {
        let source = state.taxonomy();
        let conflicted = self.conflicted_targets(state);

        let mut outcomes = Vec::new();
        let mut unmapped_objectives = Vec::new();
        let mut retired = Vec::new();
        let mut records: BTreeMap<String, AssessmentRecord> = BTreeMap::new();

        for control in source.controls() {
            let entry = self.forward(&control.id)?;
            let assessed: Vec<&AssessmentRecord> = control
                .objectives
                .iter()
                .filter_map(|o| state.record(&o.id))
                .collect();

            let mut moved = 0usize;
            let mut dropped = 0usize;

            match &entry.to_id {
                None => {
                    // withdrawn outright; shape validation guarantees the
                    // change type
                    for record in &assessed {
                        retired.push(record.objective_id.clone());
                        dropped += 1;
                    }
                }
                Some(to_id) => {
                    if !target.contains_control(to_id) {
                        return Err(Error::not_found(Entity::Control, to_id));
                    }
                    if conflicted.contains_key(to_id) {
                        dropped = assessed.len();
                    } else {
                        for record in &assessed {
                            match remap(&record.objective_id, entry) {
                                None => {
                                    unmapped_objectives.push(record.objective_id.clone());
                                    dropped += 1;
                                }
                                Some(target_id) => {
                                    if !target.contains_objective(&target_id) {
                                        return Err(Error::not_found(Entity::Objective, target_id));
                                    }
                                    if merge_record(&mut records, target_id, record) {
                                        moved += 1;
                                    } else {
                                        unmapped_objectives.push(record.objective_id.clone());
                                        dropped += 1;
                                    }
                                }
                            }
                        }
                    }
                }
            }

            outcomes.push(EntryOutcome {
                from_id: entry.from_id.clone(),
                to_id: entry.to_id.clone(),
                change_type: entry.change_type,
                records_moved: moved,
                records_dropped: dropped,
            });
        }

        let new_in_target: Vec<String> = target
            .controls()
            .filter(|c| {
                self.reverse(&c.id)
                    .iter()
                    .all(|entry| entry.from_id.is_none())
            })
            .map(|c| c.id.clone())
            .collect();

        let conflicts: Vec<MigrationConflict> = conflicted
            .into_iter()
            .map(|(target_control_id, sources)| MigrationConflict {
                target_control_id,
                sources,
            })
            .collect();

        if !conflicts.is_empty() {
            warn!(
                conflicts = conflicts.len(),
                "migration flagged targets for manual review"
            );
        }
        info!(
            source_version = source.version(),
            target_version = target.version(),
            records_moved = records.len(),
            records_dropped = unmapped_objectives.len() + retired.len(),
            "assessment state migrated"
        );

        let mut report = MigrationReport {
            source_version: source.version().to_string(),
            target_version: target.version().to_string(),
            generated_at: Utc::now(),
            outcomes,
            new_in_target,
            conflicts,
            unmapped_objectives,
            retired,
            records,
        };
        report
            .conflicts
            .sort_by(|a, b| a.target_control_id.cmp(&b.target_control_id));
        Ok(report)
    }

    /// Find target controls fed by two or more source controls whose
    /// derived statuses disagree
    fn conflicted_targets(
        &self,
        state: &AssessmentStateStore<'_>,
    ) -> HashMap<String, Vec<ConflictSource>> {
        let mut feeders: HashMap<String, Vec<ConflictSource>> = HashMap::new();
        for control in state.taxonomy().controls() {
            let Ok(entry) = self.forward(&control.id) else {
                continue;
            };
            if let Some(to_id) = &entry.to_id {
                feeders.entry(to_id.clone()).or_default().push(ConflictSource {
                    control_id: control.id.clone(),
                    status: state.control_status(control),
                });
            }
        }
        feeders.retain(|_, sources| {
            let distinct: BTreeSet<&str> = sources.iter().map(|s| s.status.label()).collect();
            sources.len() >= 2 && distinct.len() >= 2
        });
        feeders
    }
}

/// Write a record under its target id, merging on collision
///
/// Colliding records with the same status merge evidence and keep the
/// latest timestamp; a status disagreement drops the incoming record.
fn merge_record(
    records: &mut BTreeMap<String, AssessmentRecord>,
    target_id: String,
    incoming: &AssessmentRecord,
) -> bool {
    match records.get_mut(&target_id) {
        None => {
            let mut record = incoming.clone();
            record.objective_id = target_id.clone();
            records.insert(target_id, record);
            true
        }
        Some(existing) if existing.status == incoming.status => {
            existing
                .evidence_refs
                .extend(incoming.evidence_refs.iter().cloned());
            if incoming.last_updated > existing.last_updated {
                existing.last_updated = incoming.last_updated;
            }
            true
        }
        Some(_) => false,
    }
}
