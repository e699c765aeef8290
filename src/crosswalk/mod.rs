//! Catalog Crosswalks
//!
//! Maps controls of one catalog revision onto another and migrates
//! assessment state across the mapping. A crosswalk is a set of
//! change-typed entries; building an engine over them validates that every
//! source control resolves to exactly one entry, so lookups and migration
//! can assume a closed world.
//!
//! # Overview
//!
//! Catalog revisions renumber, merge, withdraw, and introduce controls.
//! Each [`CrosswalkEntry`] records one such change. The [`CrosswalkEngine`]
//! indexes entries in both directions and drives migration of an
//! [`AssessmentStateStore`](crate::state::AssessmentStateStore) from the
//! source catalog to the target, producing a
//! [`MigrationReport`](migrate::MigrationReport) that accounts for every
//! record.
//!
//! See the [`rev3`] module for a built-in SP 800-171 rev2 → rev3 excerpt.
//!
//! # Usage
//!
//! ```ignore
//! use rampart::crosswalk::{CrosswalkEngine, rev3};
//!
//! let engine = CrosswalkEngine::build(rev3::entries(), &rev2_taxonomy)?;
//!
//! let entry = engine.forward("3.1.1")?;
//! assert_eq!(entry.to_id.as_deref(), Some("03.01.01"));
//!
//! let report = engine.migrate(&state, &rev3_taxonomy, rev3::remap_objective)?;
//! let migrated = report.apply(&rev3_taxonomy)?;
//! ```

pub mod migrate;
pub mod rev3;

pub use migrate::{EntryOutcome, MigrationConflict, MigrationReport};

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Entity, Error, Result, SchemaViolation};
use crate::taxonomy::TaxonomyStore;

// ============================================================================
// Change Types
// ============================================================================

/// How a source control relates to the target catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeType {
    /// Same requirement under a new identifier
    Renumbered,
    /// Carried forward with expanded or strengthened requirements
    Enhanced,
    /// Consolidated with other source controls into one target
    Merged,
    /// Removed from the target catalog, optionally absorbed by a survivor
    Withdrawn,
    /// Present only in the target catalog
    New,
}

impl ChangeType {
    /// Parse from a loosely-formatted string
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "renumbered" | "renumber" | "moved" => Some(Self::Renumbered),
            "enhanced" | "enhance" | "expanded" => Some(Self::Enhanced),
            "merged" | "merge" | "consolidated" => Some(Self::Merged),
            "withdrawn" | "withdraw" | "removed" => Some(Self::Withdrawn),
            "new" | "added" => Some(Self::New),
            _ => None,
        }
    }

    /// The kebab-case wire label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Renumbered => "renumbered",
            Self::Enhanced => "enhanced",
            Self::Merged => "merged",
            Self::Withdrawn => "withdrawn",
            Self::New => "new",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Entries
// ============================================================================

/// One control-level mapping between catalog revisions
///
/// The from/to shape depends on the change type:
///
/// - `new`: no `from_id`, a `to_id`
/// - `withdrawn`: a `from_id`; `to_id` names the absorbing survivor, or is
///   `None` when the control retires outright
/// - all other types: both ids present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrosswalkEntry {
    /// Source-catalog control id, absent for `new` entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_id: Option<String>,

    /// Target-catalog control id, absent for outright-retired `withdrawn`
    /// entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_id: Option<String>,

    /// How the source control relates to the target
    pub change_type: ChangeType,

    /// Free-form annotation carried into migration reports
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl CrosswalkEntry {
    /// A control renumbered without semantic change
    pub fn renumbered(from_id: impl Into<String>, to_id: impl Into<String>) -> Self {
        Self {
            from_id: Some(from_id.into()),
            to_id: Some(to_id.into()),
            change_type: ChangeType::Renumbered,
            notes: String::new(),
        }
    }

    /// A control carried forward with strengthened requirements
    pub fn enhanced(from_id: impl Into<String>, to_id: impl Into<String>) -> Self {
        Self {
            from_id: Some(from_id.into()),
            to_id: Some(to_id.into()),
            change_type: ChangeType::Enhanced,
            notes: String::new(),
        }
    }

    /// A control merged into a consolidated target
    pub fn merged(from_id: impl Into<String>, to_id: impl Into<String>) -> Self {
        Self {
            from_id: Some(from_id.into()),
            to_id: Some(to_id.into()),
            change_type: ChangeType::Merged,
            notes: String::new(),
        }
    }

    /// A control withdrawn, optionally absorbed by a surviving target
    pub fn withdrawn(from_id: impl Into<String>, to_id: Option<String>) -> Self {
        Self {
            from_id: Some(from_id.into()),
            to_id,
            change_type: ChangeType::Withdrawn,
            notes: String::new(),
        }
    }

    /// A control introduced by the target catalog
    pub fn new_in_target(to_id: impl Into<String>) -> Self {
        Self {
            from_id: None,
            to_id: Some(to_id.into()),
            change_type: ChangeType::New,
            notes: String::new(),
        }
    }

    /// Attach an annotation
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Best-effort identifier for error messages
    fn label(&self) -> String {
        match (&self.from_id, &self.to_id) {
            (Some(from), Some(to)) => format!("{from} -> {to}"),
            (Some(from), None) => from.clone(),
            (None, Some(to)) => format!("-> {to}"),
            (None, None) => self.change_type.label().to_string(),
        }
    }

    /// Check the from/to shape against the change type
    fn validate_shape(&self) -> Result<()> {
        let reason = match self.change_type {
            ChangeType::New => match (&self.from_id, &self.to_id) {
                (None, Some(_)) => return Ok(()),
                (Some(_), _) => "new entries must not carry a from id",
                (None, None) => "new entries must carry a to id",
            },
            ChangeType::Withdrawn => match &self.from_id {
                Some(_) => return Ok(()),
                None => "withdrawn entries must carry a from id",
            },
            _ => match (&self.from_id, &self.to_id) {
                (Some(_), Some(_)) => return Ok(()),
                _ => "entry must carry both a from id and a to id",
            },
        };
        Err(SchemaViolation::MalformedEntry {
            label: self.label(),
            reason: reason.to_string(),
        }
        .into())
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Validated, indexed crosswalk between two catalog revisions
///
/// Built over a source taxonomy; construction fails unless every source
/// control resolves to exactly one entry.
#[derive(Debug, Clone)]
pub struct CrosswalkEngine {
    entries: Vec<CrosswalkEntry>,
    forward: HashMap<String, usize>,
    reverse: HashMap<String, Vec<usize>>,
}

impl CrosswalkEngine {
    /// Validate entries against a source taxonomy and build the indexes
    ///
    /// Fails [`Error::Schema`] on a malformed entry shape, on a source
    /// control claimed by more than one entry, or when source controls are
    /// left unmapped; the unmapped-controls violation lists every missing
    /// id.
    pub fn build(entries: Vec<CrosswalkEntry>, source: &TaxonomyStore) -> Result<Self> {
        let mut forward: HashMap<String, usize> = HashMap::new();
        let mut reverse: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, entry) in entries.iter().enumerate() {
            entry.validate_shape()?;

            if let Some(from_id) = &entry.from_id {
                if forward.insert(from_id.clone(), idx).is_some() {
                    let count = entries
                        .iter()
                        .filter(|e| e.from_id.as_deref() == Some(from_id.as_str()))
                        .count();
                    return Err(SchemaViolation::DuplicateMapping {
                        id: from_id.clone(),
                        count,
                    }
                    .into());
                }
            }
            if let Some(to_id) = &entry.to_id {
                reverse.entry(to_id.clone()).or_default().push(idx);
            }
        }

        let unmapped: Vec<String> = source
            .controls()
            .filter(|c| !forward.contains_key(&c.id))
            .map(|c| c.id.clone())
            .collect();
        if !unmapped.is_empty() {
            return Err(SchemaViolation::UnmappedControls { ids: unmapped }.into());
        }

        info!(
            entries = entries.len(),
            source_version = source.version(),
            "crosswalk built"
        );

        Ok(Self {
            entries,
            forward,
            reverse,
        })
    }

    /// The entry mapping a source control forward
    pub fn forward(&self, from_id: &str) -> Result<&CrosswalkEntry> {
        self.forward
            .get(from_id)
            .map(|&idx| &self.entries[idx])
            .ok_or_else(|| Error::not_found(Entity::CrosswalkEntry, from_id))
    }

    /// Every entry mapping onto a target control
    ///
    /// Returns an empty slice-like vector for targets nothing maps onto;
    /// merged targets return one entry per absorbed source.
    pub fn reverse(&self, to_id: &str) -> Vec<&CrosswalkEntry> {
        self.reverse
            .get(to_id)
            .map(|idxs| idxs.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    /// All entries, in construction order
    pub fn entries(&self) -> &[CrosswalkEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::taxonomy::CatalogDefinition;

    fn source_taxonomy() -> TaxonomyStore {
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
                            "objectives": [{ "id": "3.1.1[a]", "text": "a" }]
                        },
                        {
                            "id": "3.1.2",
                            "name": "Limit transaction functions",
                            "description": "",
                            "objectives": [{ "id": "3.1.2[a]", "text": "a" }]
                        }
                    ]
                }
            ]
        }))
        .unwrap();
        TaxonomyStore::load(definition).unwrap()
    }

    #[test]
    fn test_change_type_from_str_loose() {
        assert_eq!(
            ChangeType::from_str_loose("renumbered"),
            Some(ChangeType::Renumbered)
        );
        assert_eq!(
            ChangeType::from_str_loose("WITHDRAWN"),
            Some(ChangeType::Withdrawn)
        );
        assert_eq!(ChangeType::from_str_loose("sideways"), None);
    }

    #[test]
    fn test_build_indexes_both_directions() {
        let taxonomy = source_taxonomy();
        let entries = vec![
            CrosswalkEntry::renumbered("3.1.1", "03.01.01"),
            CrosswalkEntry::merged("3.1.2", "03.01.01"),
            CrosswalkEntry::new_in_target("03.17.01"),
        ];
        let engine = CrosswalkEngine::build(entries, &taxonomy).unwrap();

        let entry = engine.forward("3.1.1").unwrap();
        assert_eq!(entry.change_type, ChangeType::Renumbered);
        assert_eq!(engine.reverse("03.01.01").len(), 2);
        assert_eq!(engine.reverse("03.17.01").len(), 1);
        assert!(engine.reverse("03.99.99").is_empty());
    }

    #[test]
    fn test_forward_unknown_id_fails() {
        let taxonomy = source_taxonomy();
        let entries = vec![
            CrosswalkEntry::renumbered("3.1.1", "03.01.01"),
            CrosswalkEntry::renumbered("3.1.2", "03.01.02"),
        ];
        let engine = CrosswalkEngine::build(entries, &taxonomy).unwrap();
        let err = engine.forward("3.9.9").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("3.9.9"));
    }

    #[test]
    fn test_build_rejects_unmapped_controls_listing_each() {
        let taxonomy = source_taxonomy();
        let entries = vec![CrosswalkEntry::renumbered("3.1.1", "03.01.01")];
        let err = CrosswalkEngine::build(entries, &taxonomy).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("3.1.2"));
    }

    #[test]
    fn test_build_rejects_duplicate_mapping() {
        let taxonomy = source_taxonomy();
        let entries = vec![
            CrosswalkEntry::renumbered("3.1.1", "03.01.01"),
            CrosswalkEntry::merged("3.1.1", "03.01.02"),
            CrosswalkEntry::renumbered("3.1.2", "03.01.02"),
        ];
        let err = CrosswalkEngine::build(entries, &taxonomy).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("3.1.1"));
        assert!(err.to_string().contains("2 crosswalk entries"));
    }

    #[test]
    fn test_build_rejects_malformed_shapes() {
        let taxonomy = source_taxonomy();

        // new with a from id
        let bad_new = CrosswalkEntry {
            from_id: Some("3.1.1".to_string()),
            to_id: Some("03.17.01".to_string()),
            change_type: ChangeType::New,
            notes: String::new(),
        };
        let err = CrosswalkEngine::build(vec![bad_new], &taxonomy).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);

        // renumbered missing its to id
        let bad_renumber = CrosswalkEntry {
            from_id: Some("3.1.1".to_string()),
            to_id: None,
            change_type: ChangeType::Renumbered,
            notes: String::new(),
        };
        let err = CrosswalkEngine::build(vec![bad_renumber], &taxonomy).unwrap_err();
        assert!(err.to_string().contains("both a from id and a to id"));
    }

    #[test]
    fn test_withdrawn_without_survivor_is_valid() {
        let taxonomy = source_taxonomy();
        let entries = vec![
            CrosswalkEntry::renumbered("3.1.1", "03.01.01"),
            CrosswalkEntry::withdrawn("3.1.2", None),
        ];
        let engine = CrosswalkEngine::build(entries, &taxonomy).unwrap();
        let entry = engine.forward("3.1.2").unwrap();
        assert_eq!(entry.change_type, ChangeType::Withdrawn);
        assert!(entry.to_id.is_none());
    }

    #[test]
    fn test_entry_serde_kebab_case() {
        let entry = CrosswalkEntry::withdrawn("3.1.13", Some("03.01.12".to_string()))
            .with_notes("absorbed by remote-access control");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["change_type"], "withdrawn");
        assert_eq!(json["from_id"], "3.1.13");

        let parsed: CrosswalkEntry = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, entry);
    }
}
