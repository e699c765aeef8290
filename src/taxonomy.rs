//! Control Catalog Model
//!
//! Immutable definition of one catalog version: families, controls, and
//! assessment objectives, with per-control metadata (description, source
//! reference, organization-defined-parameter slots).
//!
//! A [`TaxonomyStore`] is loaded once from a [`CatalogDefinition`], validated
//! eagerly, and referenced by id thereafter. Structure is never mutated in
//! place; a different catalog version means loading a different store.
//!
//! # Usage
//!
//! ```ignore
//! use rampart::taxonomy::{CatalogDefinition, TaxonomyStore};
//!
//! let definition: CatalogDefinition = serde_json::from_str(&catalog_json)?;
//! let taxonomy = TaxonomyStore::load(definition)?;
//!
//! let control = taxonomy.control("3.1.1")?;
//! for objective in &control.objectives {
//!     println!("{}: {}", objective.id, objective.text);
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Entity, Error, Result, SchemaViolation};

/// An organization-defined parameter slot referenced by a control
///
/// Purely descriptive: a named placeholder the implementing organization
/// must fill with a concrete value. Never affects scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OdpSlot {
    /// Parameter name (e.g., "maximum inactivity period")
    pub name: String,

    /// What the parameter governs
    pub description: String,

    /// A suggested starting value
    pub suggested_value: String,
}

/// A discrete, independently assessable sub-statement of a control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    /// Objective id, globally unique within a store; the join key used by
    /// the assessment state store
    pub id: String,

    /// The objective statement text
    pub text: String,
}

/// A single security requirement within a family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    /// Control id, unique within a store (e.g., "3.1.1")
    pub id: String,

    /// Human-readable control name
    pub name: String,

    /// Full requirement text
    pub description: String,

    /// Assessment objectives owned by this control; always at least one
    pub objectives: Vec<Objective>,

    /// Reference into the source publication (e.g., "NIST SP 800-171r2 3.1.1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<String>,

    /// Organization-defined parameter slots the control references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub odp_slots: Vec<OdpSlot>,
}

/// A named grouping of related controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    /// Family id (e.g., "3.1")
    pub id: String,

    /// Family name (e.g., "Access Control")
    pub name: String,

    /// Controls owned by this family, in catalog order
    pub controls: Vec<Control>,
}

/// The nested input shape a [`TaxonomyStore`] is constructed from
///
/// Supplied once at construction; typically deserialized from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDefinition {
    /// Catalog version label (e.g., "rev2", "rev3")
    pub version: String,

    /// Families in catalog order
    pub families: Vec<Family>,
}

/// Immutable store for one catalog version
///
/// Validates on load that every control has at least one objective and that
/// family, control, and objective ids are each unique store-wide, then
/// indexes every entity for O(1) lookup.
#[derive(Debug, Clone)]
pub struct TaxonomyStore {
    version: String,
    families: Vec<Family>,
    family_index: HashMap<String, usize>,
    control_index: HashMap<String, (usize, usize)>,
    objective_index: HashMap<String, (usize, usize, usize)>,
}

impl TaxonomyStore {
    /// Load and validate a catalog definition
    ///
    /// Fails with [`Error::Schema`] naming the first duplicate id or
    /// empty-objectives control found, in catalog order.
    pub fn load(definition: CatalogDefinition) -> Result<Self> {
        let mut family_index = HashMap::new();
        let mut control_index = HashMap::new();
        let mut objective_index = HashMap::new();

        for (fi, family) in definition.families.iter().enumerate() {
            if family_index.insert(family.id.clone(), fi).is_some() {
                return Err(SchemaViolation::DuplicateId {
                    entity: Entity::Family,
                    id: family.id.clone(),
                }
                .into());
            }

            for (ci, control) in family.controls.iter().enumerate() {
                if control_index.insert(control.id.clone(), (fi, ci)).is_some() {
                    return Err(SchemaViolation::DuplicateId {
                        entity: Entity::Control,
                        id: control.id.clone(),
                    }
                    .into());
                }

                if control.objectives.is_empty() {
                    return Err(SchemaViolation::EmptyControl {
                        id: control.id.clone(),
                    }
                    .into());
                }

                for (oi, objective) in control.objectives.iter().enumerate() {
                    if objective_index
                        .insert(objective.id.clone(), (fi, ci, oi))
                        .is_some()
                    {
                        return Err(SchemaViolation::DuplicateId {
                            entity: Entity::Objective,
                            id: objective.id.clone(),
                        }
                        .into());
                    }
                }
            }
        }

        let store = Self {
            version: definition.version,
            families: definition.families,
            family_index,
            control_index,
            objective_index,
        };

        info!(
            version = %store.version,
            families = store.family_count(),
            controls = store.control_count(),
            objectives = store.objective_count(),
            "catalog loaded"
        );

        Ok(store)
    }

    /// Catalog version label
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Families in catalog order
    pub fn families(&self) -> &[Family] {
        &self.families
    }

    /// Look up a family by id
    pub fn family(&self, id: &str) -> Result<&Family> {
        self.family_index
            .get(id)
            .map(|&fi| &self.families[fi])
            .ok_or_else(|| Error::not_found(Entity::Family, id))
    }

    /// Look up a control by id
    pub fn control(&self, id: &str) -> Result<&Control> {
        self.control_index
            .get(id)
            .map(|&(fi, ci)| &self.families[fi].controls[ci])
            .ok_or_else(|| Error::not_found(Entity::Control, id))
    }

    /// Look up an objective by id
    pub fn objective(&self, id: &str) -> Result<&Objective> {
        self.objective_index
            .get(id)
            .map(|&(fi, ci, oi)| &self.families[fi].controls[ci].objectives[oi])
            .ok_or_else(|| Error::not_found(Entity::Objective, id))
    }

    /// The family owning a control
    pub fn family_of(&self, control_id: &str) -> Result<&Family> {
        self.control_index
            .get(control_id)
            .map(|&(fi, _)| &self.families[fi])
            .ok_or_else(|| Error::not_found(Entity::Control, control_id))
    }

    /// The control owning an objective
    pub fn control_of(&self, objective_id: &str) -> Result<&Control> {
        self.objective_index
            .get(objective_id)
            .map(|&(fi, ci, _)| &self.families[fi].controls[ci])
            .ok_or_else(|| Error::not_found(Entity::Objective, objective_id))
    }

    /// Whether an objective id exists in this catalog
    pub fn contains_objective(&self, id: &str) -> bool {
        self.objective_index.contains_key(id)
    }

    /// Whether a control id exists in this catalog
    pub fn contains_control(&self, id: &str) -> bool {
        self.control_index.contains_key(id)
    }

    /// Number of families
    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// Number of controls across all families
    pub fn control_count(&self) -> usize {
        self.families.iter().map(|f| f.controls.len()).sum()
    }

    /// Number of objectives across the whole catalog
    pub fn objective_count(&self) -> usize {
        self.objective_index.len()
    }

    /// Every control across all families, in catalog order
    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.families.iter().flat_map(|f| f.controls.iter())
    }

    /// Every objective id across the whole catalog, in catalog order
    ///
    /// Lazy, finite, and restartable: each call produces a fresh iterator.
    /// Walking it enumerates the full assessable surface, including
    /// objectives never touched by an assessor.
    pub fn all_objective_ids(&self) -> impl Iterator<Item = &str> {
        self.controls()
            .flat_map(|c| c.objectives.iter())
            .map(|o| o.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn objective(id: &str) -> Objective {
        Objective {
            id: id.to_string(),
            text: format!("Determine if {id} is satisfied"),
        }
    }

    fn control(id: &str, objectives: Vec<Objective>) -> Control {
        Control {
            id: id.to_string(),
            name: format!("Requirement {id}"),
            description: format!("Full text of {id}"),
            objectives,
            source_reference: None,
            odp_slots: Vec::new(),
        }
    }

    fn small_catalog() -> CatalogDefinition {
        CatalogDefinition {
            version: "rev2".to_string(),
            families: vec![
                Family {
                    id: "3.1".to_string(),
                    name: "Access Control".to_string(),
                    controls: vec![
                        control("3.1.1", vec![objective("3.1.1[a]"), objective("3.1.1[b]")]),
                        control("3.1.2", vec![objective("3.1.2[a]")]),
                    ],
                },
                Family {
                    id: "3.4".to_string(),
                    name: "Configuration Management".to_string(),
                    controls: vec![control("3.4.1", vec![objective("3.4.1[a]")])],
                },
            ],
        }
    }

    #[test]
    fn test_load_and_lookup() {
        let store = TaxonomyStore::load(small_catalog()).unwrap();
        assert_eq!(store.version(), "rev2");
        assert_eq!(store.family_count(), 2);
        assert_eq!(store.control_count(), 3);
        assert_eq!(store.objective_count(), 4);

        assert_eq!(store.family("3.1").unwrap().name, "Access Control");
        assert_eq!(store.control("3.1.2").unwrap().objectives.len(), 1);
        assert_eq!(store.objective("3.4.1[a]").unwrap().id, "3.4.1[a]");
    }

    #[test]
    fn test_reverse_lookups() {
        let store = TaxonomyStore::load(small_catalog()).unwrap();
        assert_eq!(store.family_of("3.4.1").unwrap().id, "3.4");
        assert_eq!(store.control_of("3.1.1[b]").unwrap().id, "3.1.1");
    }

    #[test]
    fn test_not_found() {
        let store = TaxonomyStore::load(small_catalog()).unwrap();
        let err = store.control("9.9.9").unwrap_err();
        assert_eq!(err.to_string(), "control '9.9.9' not found");
        assert!(store.family("9.9").is_err());
        assert!(store.objective("missing").is_err());
        assert!(!store.contains_objective("missing"));
        assert!(store.contains_control("3.1.1"));
    }

    #[test]
    fn test_empty_control_rejected() {
        let mut def = small_catalog();
        def.families[0].controls.push(control("3.1.3", vec![]));
        let err = TaxonomyStore::load(def).unwrap_err();
        assert_eq!(
            err.to_string(),
            "control '3.1.3' has no assessment objectives"
        );
    }

    #[test]
    fn test_duplicate_control_rejected() {
        let mut def = small_catalog();
        let dup = control("3.1.1", vec![objective("3.4.9[a]")]);
        def.families[1].controls.push(dup);
        let err = TaxonomyStore::load(def).unwrap_err();
        assert_eq!(err.to_string(), "duplicate control id '3.1.1'");
    }

    #[test]
    fn test_duplicate_objective_rejected() {
        let mut def = small_catalog();
        def.families[1].controls[0]
            .objectives
            .push(objective("3.1.1[a]"));
        let err = TaxonomyStore::load(def).unwrap_err();
        assert_eq!(err.to_string(), "duplicate objective id '3.1.1[a]'");
    }

    #[test]
    fn test_duplicate_family_rejected() {
        let mut def = small_catalog();
        def.families.push(Family {
            id: "3.1".to_string(),
            name: "Access Control Again".to_string(),
            controls: vec![control("3.9.1", vec![objective("3.9.1[a]")])],
        });
        let err = TaxonomyStore::load(def).unwrap_err();
        assert_eq!(err.to_string(), "duplicate family id '3.1'");
    }

    #[test]
    fn test_all_objective_ids_is_restartable_and_ordered() {
        let store = TaxonomyStore::load(small_catalog()).unwrap();
        let first: Vec<&str> = store.all_objective_ids().collect();
        let second: Vec<&str> = store.all_objective_ids().collect();
        assert_eq!(first, vec!["3.1.1[a]", "3.1.1[b]", "3.1.2[a]", "3.4.1[a]"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_definition_deserializes_with_defaults() {
        let json = r#"{
            "version": "rev3",
            "families": [{
                "id": "03.01",
                "name": "Access Control",
                "controls": [{
                    "id": "03.01.01",
                    "name": "Account Management",
                    "description": "Manage system accounts.",
                    "objectives": [{"id": "03.01.01.a", "text": "Account types are defined."}]
                }]
            }]
        }"#;
        let def: CatalogDefinition = serde_json::from_str(json).unwrap();
        assert!(def.families[0].controls[0].source_reference.is_none());
        assert!(def.families[0].controls[0].odp_slots.is_empty());
        let store = TaxonomyStore::load(def).unwrap();
        assert_eq!(store.control_count(), 1);
    }
}
