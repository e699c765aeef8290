//! Shared-Responsibility Classification
//!
//! Classifies each control by who carries it when the assessed system runs
//! on cloud infrastructure: fully inherited from the provider, shared,
//! entirely the customer's, or a hybrid arrangement. Assignments are
//! per-control; [`ResponsibilityClassifier::summarize`] buckets the full
//! catalog, counting controls with no assignment separately rather than
//! guessing.
//!
//! # Usage
//!
//! ```ignore
//! use rampart::responsibility::{ResponsibilityClassifier, ResponsibilityType};
//!
//! let mut classifier = ResponsibilityClassifier::with_builtin_templates();
//! classifier.apply_template("govcloud-iaas")?;
//! classifier.assign("3.1.1", ResponsibilityType::Customer, None, None);
//!
//! let summary = classifier.summarize(&taxonomy);
//! println!("{}% inherited", summary.percentages.fully_inherited);
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Entity, Error, Result};
use crate::taxonomy::TaxonomyStore;

// ============================================================================
// Types
// ============================================================================

/// Who carries a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponsibilityType {
    /// The provider satisfies the control outright
    FullyInherited,
    /// Provider and customer each carry part of the control
    Shared,
    /// The customer satisfies the control alone
    Customer,
    /// Different system components split the control differently
    Hybrid,
}

impl ResponsibilityType {
    /// Parse from a loosely-formatted string
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fully-inherited" | "fully_inherited" | "inherited" | "provider" => {
                Some(Self::FullyInherited)
            }
            "shared" => Some(Self::Shared),
            "customer" | "agency" => Some(Self::Customer),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }

    /// The kebab-case wire label
    pub fn label(&self) -> &'static str {
        match self {
            Self::FullyInherited => "fully-inherited",
            Self::Shared => "shared",
            Self::Customer => "customer",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for ResponsibilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One control's responsibility assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsibilityAssignment {
    /// The assigned control
    pub control_id: String,

    /// Who carries it
    pub responsibility: ResponsibilityType,

    /// Provider the responsibility derives from, when one applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    /// Free-form annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A provider's canned responsibility mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTemplate {
    /// Template identifier (e.g. `govcloud-iaas`)
    pub id: String,

    /// Human-readable provider and service-model name
    pub name: String,

    /// Control id -> responsibility for every control the template covers
    pub mapping: HashMap<String, ResponsibilityType>,
}

// ============================================================================
// Built-in Templates
// ============================================================================

/// Built-in provider templates
///
/// Excerpted shared-responsibility matrices for common hosting
/// arrangements, keyed by SP 800-171 rev 2 requirement ids.
pub mod templates {
    /// One template row: control id and its responsibility label
    pub struct TemplateRow {
        /// Assigned control id
        pub control_id: &'static str,
        /// Kebab-case responsibility label
        pub responsibility: &'static str,
    }

    /// Government-cloud IaaS: physical and infrastructure controls
    /// inherited, platform controls shared, everything else stays with
    /// the customer
    pub const GOVCLOUD_IAAS: &[TemplateRow] = &[
        TemplateRow {
            control_id: "3.1.1",
            responsibility: "shared",
        },
        TemplateRow {
            control_id: "3.1.2",
            responsibility: "customer",
        },
        TemplateRow {
            control_id: "3.1.12",
            responsibility: "shared",
        },
        TemplateRow {
            control_id: "3.8.1",
            responsibility: "fully-inherited",
        },
        TemplateRow {
            control_id: "3.8.2",
            responsibility: "fully-inherited",
        },
        TemplateRow {
            control_id: "3.8.3",
            responsibility: "fully-inherited",
        },
        TemplateRow {
            control_id: "3.10.1",
            responsibility: "fully-inherited",
        },
        TemplateRow {
            control_id: "3.10.2",
            responsibility: "fully-inherited",
        },
        TemplateRow {
            control_id: "3.13.1",
            responsibility: "shared",
        },
        TemplateRow {
            control_id: "3.13.2",
            responsibility: "hybrid",
        },
    ];

    /// Commercial SaaS: the provider carries most technical controls,
    /// account and data governance stay with the customer
    pub const COMMERCIAL_SAAS: &[TemplateRow] = &[
        TemplateRow {
            control_id: "3.1.1",
            responsibility: "shared",
        },
        TemplateRow {
            control_id: "3.1.2",
            responsibility: "shared",
        },
        TemplateRow {
            control_id: "3.4.1",
            responsibility: "fully-inherited",
        },
        TemplateRow {
            control_id: "3.4.2",
            responsibility: "fully-inherited",
        },
        TemplateRow {
            control_id: "3.8.1",
            responsibility: "fully-inherited",
        },
        TemplateRow {
            control_id: "3.10.1",
            responsibility: "fully-inherited",
        },
        TemplateRow {
            control_id: "3.13.1",
            responsibility: "fully-inherited",
        },
        TemplateRow {
            control_id: "3.13.11",
            responsibility: "fully-inherited",
        },
    ];
}

// ============================================================================
// Classifier
// ============================================================================

/// Per-control responsibility state with template support
///
/// Assignments are independent of assessment state; a control may be
/// classified before it is ever assessed. Assigning does not validate the
/// control id against a taxonomy, so classifications can be prepared ahead
/// of catalog load; [`summarize`](Self::summarize) only reports controls
/// the taxonomy actually contains.
#[derive(Debug, Clone, Default)]
pub struct ResponsibilityClassifier {
    assignments: HashMap<String, ResponsibilityAssignment>,
    templates: HashMap<String, ProviderTemplate>,
}

impl ResponsibilityClassifier {
    /// Create an empty classifier with no templates
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier preloaded with the built-in provider templates
    pub fn with_builtin_templates() -> Self {
        let mut classifier = Self::new();
        for (id, name, rows) in [
            (
                "govcloud-iaas",
                "Government Cloud IaaS",
                templates::GOVCLOUD_IAAS,
            ),
            (
                "commercial-saas",
                "Commercial SaaS",
                templates::COMMERCIAL_SAAS,
            ),
        ] {
            let mapping = rows
                .iter()
                .filter_map(|row| {
                    ResponsibilityType::from_str_loose(row.responsibility)
                        .map(|r| (row.control_id.to_string(), r))
                })
                .collect();
            classifier.register_template(ProviderTemplate {
                id: id.to_string(),
                name: name.to_string(),
                mapping,
            });
        }
        classifier
    }

    /// Register a caller-supplied template, replacing any with the same id
    pub fn register_template(&mut self, template: ProviderTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    /// Ids of every registered template
    pub fn template_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Assign a responsibility to a control, overwriting any prior
    /// assignment
    pub fn assign(
        &mut self,
        control_id: impl Into<String>,
        responsibility: ResponsibilityType,
        provider_id: Option<String>,
        notes: Option<String>,
    ) {
        let control_id = control_id.into();
        self.assignments.insert(
            control_id.clone(),
            ResponsibilityAssignment {
                control_id,
                responsibility,
                provider_id,
                notes,
            },
        );
    }

    /// Bulk-assign from a registered template
    ///
    /// Only the controls the template names are touched; existing
    /// assignments for other controls survive. Returns how many controls
    /// were assigned. Fails [`Error::NotFound`] for an unknown template id.
    pub fn apply_template(&mut self, template_id: &str) -> Result<usize> {
        let template = self
            .templates
            .get(template_id)
            .ok_or_else(|| Error::not_found(Entity::Template, template_id))?
            .clone();

        for (control_id, responsibility) in &template.mapping {
            self.assign(
                control_id.clone(),
                *responsibility,
                Some(template.id.clone()),
                None,
            );
        }
        info!(
            template_id,
            assigned = template.mapping.len(),
            "responsibility template applied"
        );
        Ok(template.mapping.len())
    }

    /// The assignment for a control, if one exists
    pub fn assignment(&self, control_id: &str) -> Option<&ResponsibilityAssignment> {
        self.assignments.get(control_id)
    }

    /// Remove the assignment for a control, returning it
    pub fn clear_assignment(&mut self, control_id: &str) -> Option<ResponsibilityAssignment> {
        self.assignments.remove(control_id)
    }

    /// Bucket every control of a taxonomy
    ///
    /// Percentages are computed over the full catalog size, so the five
    /// buckets (four responsibility types plus `not-assigned`) sum to
    /// roughly 100.
    pub fn summarize(&self, taxonomy: &TaxonomyStore) -> ResponsibilitySummary {
        let mut rows = Vec::new();
        let mut counts = ResponsibilityCounts::default();

        for control in taxonomy.controls() {
            let assignment = self.assignments.get(&control.id);
            match assignment.map(|a| a.responsibility) {
                Some(ResponsibilityType::FullyInherited) => counts.fully_inherited += 1,
                Some(ResponsibilityType::Shared) => counts.shared += 1,
                Some(ResponsibilityType::Customer) => counts.customer += 1,
                Some(ResponsibilityType::Hybrid) => counts.hybrid += 1,
                None => counts.not_assigned += 1,
            }
            rows.push(ControlResponsibility {
                control_id: control.id.clone(),
                assignment: assignment.cloned(),
            });
        }

        let percentages = ResponsibilityPercentages::from_counts(&counts);
        ResponsibilitySummary {
            rows,
            counts,
            percentages,
        }
    }
}

// ============================================================================
// Summary Types
// ============================================================================

/// One summary row: a control and its assignment, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponsibility {
    /// The control
    pub control_id: String,

    /// Its assignment; `None` reports as the `not-assigned` bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<ResponsibilityAssignment>,
}

/// Control counts per responsibility bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsibilityCounts {
    /// Controls fully inherited from a provider
    pub fully_inherited: usize,
    /// Controls shared with a provider
    pub shared: usize,
    /// Controls carried by the customer alone
    pub customer: usize,
    /// Controls split across components
    pub hybrid: usize,
    /// Controls with no assignment
    pub not_assigned: usize,
}

impl ResponsibilityCounts {
    /// Total controls counted
    pub fn total(&self) -> usize {
        self.fully_inherited + self.shared + self.customer + self.hybrid + self.not_assigned
    }
}

/// Bucket percentages over the full catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsibilityPercentages {
    /// Percent fully inherited
    pub fully_inherited: f64,
    /// Percent shared
    pub shared: f64,
    /// Percent customer-only
    pub customer: f64,
    /// Percent hybrid
    pub hybrid: f64,
    /// Percent unassigned
    pub not_assigned: f64,
}

impl ResponsibilityPercentages {
    fn from_counts(counts: &ResponsibilityCounts) -> Self {
        let total = counts.total();
        if total == 0 {
            return Self::default();
        }
        let pct = |n: usize| (n as f64) * 100.0 / (total as f64);
        Self {
            fully_inherited: pct(counts.fully_inherited),
            shared: pct(counts.shared),
            customer: pct(counts.customer),
            hybrid: pct(counts.hybrid),
            not_assigned: pct(counts.not_assigned),
        }
    }

    /// Sum of every bucket, approximately 100 for a non-empty catalog
    pub fn sum(&self) -> f64 {
        self.fully_inherited + self.shared + self.customer + self.hybrid + self.not_assigned
    }
}

/// Full responsibility picture for one taxonomy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsibilitySummary {
    /// One row per catalog control, in catalog order
    pub rows: Vec<ControlResponsibility>,

    /// Counts per bucket
    pub counts: ResponsibilityCounts,

    /// Percentages per bucket over the full catalog
    pub percentages: ResponsibilityPercentages,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::taxonomy::CatalogDefinition;

    fn catalog() -> TaxonomyStore {
        let controls: Vec<serde_json::Value> = (1..=4)
            .map(|n| {
                serde_json::json!({
                    "id": format!("3.1.{n}"),
                    "name": format!("Requirement {n}"),
                    "description": "",
                    "objectives": [{ "id": format!("3.1.{n}[a]"), "text": "a" }]
                })
            })
            .collect();
        let definition: CatalogDefinition = serde_json::from_value(serde_json::json!({
            "version": "rev2",
            "families": [
                { "id": "3.1", "name": "Access Control", "controls": controls }
            ]
        }))
        .unwrap();
        TaxonomyStore::load(definition).unwrap()
    }

    #[test]
    fn test_responsibility_from_str_loose() {
        assert_eq!(
            ResponsibilityType::from_str_loose("fully-inherited"),
            Some(ResponsibilityType::FullyInherited)
        );
        assert_eq!(
            ResponsibilityType::from_str_loose("INHERITED"),
            Some(ResponsibilityType::FullyInherited)
        );
        assert_eq!(
            ResponsibilityType::from_str_loose("shared"),
            Some(ResponsibilityType::Shared)
        );
        assert_eq!(ResponsibilityType::from_str_loose("mine"), None);
    }

    #[test]
    fn test_assign_overwrites() {
        let mut classifier = ResponsibilityClassifier::new();
        classifier.assign("3.1.1", ResponsibilityType::Customer, None, None);
        classifier.assign(
            "3.1.1",
            ResponsibilityType::Shared,
            Some("govcloud-iaas".to_string()),
            None,
        );

        let assignment = classifier.assignment("3.1.1").unwrap();
        assert_eq!(assignment.responsibility, ResponsibilityType::Shared);
        assert_eq!(assignment.provider_id.as_deref(), Some("govcloud-iaas"));
    }

    #[test]
    fn test_apply_template_touches_only_named_controls() {
        let mut classifier = ResponsibilityClassifier::with_builtin_templates();
        classifier.assign("9.9.9", ResponsibilityType::Customer, None, None);

        let assigned = classifier.apply_template("govcloud-iaas").unwrap();
        assert_eq!(assigned, templates::GOVCLOUD_IAAS.len());

        // untouched by the template
        assert_eq!(
            classifier.assignment("9.9.9").unwrap().responsibility,
            ResponsibilityType::Customer
        );
        // template rows carry the template id as provider
        assert_eq!(
            classifier
                .assignment("3.8.1")
                .unwrap()
                .provider_id
                .as_deref(),
            Some("govcloud-iaas")
        );
    }

    #[test]
    fn test_apply_unknown_template_fails() {
        let mut classifier = ResponsibilityClassifier::with_builtin_templates();
        let err = classifier.apply_template("no-such-template").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("no-such-template"));
    }

    #[test]
    fn test_register_template_and_apply() {
        let mut classifier = ResponsibilityClassifier::new();
        classifier.register_template(ProviderTemplate {
            id: "on-prem".to_string(),
            name: "On-Premises".to_string(),
            mapping: HashMap::from([
                ("3.1.1".to_string(), ResponsibilityType::Customer),
                ("3.1.2".to_string(), ResponsibilityType::Customer),
            ]),
        });
        assert_eq!(classifier.apply_template("on-prem").unwrap(), 2);
        assert_eq!(classifier.template_ids(), vec!["on-prem"]);
    }

    #[test]
    fn test_summary_counts_and_percentages() {
        let taxonomy = catalog();
        let mut classifier = ResponsibilityClassifier::new();
        classifier.assign("3.1.1", ResponsibilityType::FullyInherited, None, None);
        classifier.assign("3.1.2", ResponsibilityType::Shared, None, None);
        // 3.1.3 and 3.1.4 left unassigned; foreign control never reported
        classifier.assign("9.9.9", ResponsibilityType::Hybrid, None, None);

        let summary = classifier.summarize(&taxonomy);
        assert_eq!(summary.rows.len(), 4);
        assert_eq!(summary.counts.fully_inherited, 1);
        assert_eq!(summary.counts.shared, 1);
        assert_eq!(summary.counts.not_assigned, 2);
        assert_eq!(summary.counts.total(), 4);

        assert!((summary.percentages.fully_inherited - 25.0).abs() < f64::EPSILON);
        assert!((summary.percentages.not_assigned - 50.0).abs() < f64::EPSILON);
        assert!((summary.percentages.sum() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_serializes_kebab_case() {
        let taxonomy = catalog();
        let mut classifier = ResponsibilityClassifier::new();
        classifier.assign("3.1.1", ResponsibilityType::FullyInherited, None, None);

        let summary = classifier.summarize(&taxonomy);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            json["rows"][0]["assignment"]["responsibility"],
            "fully-inherited"
        );
        assert_eq!(json["counts"]["not_assigned"], 3);
    }
}
