//! SPRS-Style Scoring
//!
//! Computes an assessment score by starting from a configured baseline and
//! subtracting the full weight of every control whose derived status is not
//! `met`, clamped at a configured floor. The defaults match the NIST SP
//! 800-171 SPRS methodology (baseline 110, floor -203), but both numbers
//! are configuration.
//!
//! # Usage
//!
//! ```ignore
//! use rampart::scoring::{ScoringConfig, ScoringEngine, WeightTable};
//!
//! let engine = ScoringEngine::new(ScoringConfig::default());
//! let weights = WeightTable::from_iter([("3.1.1", 5), ("3.1.2", 3)]);
//!
//! let score = engine.compute_score(&state, &weights);
//! let breakdown = engine.score_breakdown(&state, &weights);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::state::{AssessmentStateStore, ControlStatus};

// ============================================================================
// Configuration
// ============================================================================

/// Baseline and floor for score computation
///
/// # Examples
///
/// ```ignore
/// // SPRS defaults
/// let config = ScoringConfig::default();
///
/// // Custom methodology
/// let config = ScoringConfig::builder().baseline(100).floor(0).build();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Score with every control met
    pub baseline: i64,

    /// Lowest score the computation may produce
    pub floor: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            baseline: 110,
            floor: -203,
        }
    }
}

impl ScoringConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    ///
    /// - `SPRS_BASELINE`: integer (default: 110)
    /// - `SPRS_FLOOR`: integer (default: -203)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let baseline = std::env::var("SPRS_BASELINE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.baseline);

        let floor = std::env::var("SPRS_FLOOR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.floor);

        Self { baseline, floor }
    }

    /// Create a new builder for programmatic configuration
    pub fn builder() -> ScoringConfigBuilder {
        ScoringConfigBuilder::default()
    }
}

/// Builder for [`ScoringConfig`]
#[derive(Debug, Default)]
pub struct ScoringConfigBuilder {
    config: ScoringConfig,
}

impl ScoringConfigBuilder {
    /// Set the baseline score
    pub fn baseline(mut self, baseline: i64) -> Self {
        self.config.baseline = baseline;
        self
    }

    /// Set the score floor
    pub fn floor(mut self, floor: i64) -> Self {
        self.config.floor = floor;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> ScoringConfig {
        self.config
    }
}

// ============================================================================
// Weight Table
// ============================================================================

/// Per-control deduction weights
///
/// Maps control id to a non-negative weight. Controls absent from the
/// table carry weight 0 and never affect the score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable(HashMap<String, u32>);

impl WeightTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The weight of a control, 0 when absent
    pub fn get(&self, control_id: &str) -> u32 {
        self.0.get(control_id).copied().unwrap_or(0)
    }

    /// Set the weight of a control
    pub fn set(&mut self, control_id: impl Into<String>, weight: u32) {
        self.0.insert(control_id.into(), weight);
    }

    /// Number of controls with an explicit weight
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table carries no weights
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, u32>> for WeightTable {
    fn from(map: HashMap<String, u32>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, u32)> for WeightTable {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, w)| (k.into(), w)).collect())
    }
}

// ============================================================================
// Engine
// ============================================================================

/// One control's contribution to the deduction total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    /// The deducting control
    pub control_id: String,

    /// Its derived status at computation time
    pub status: ControlStatus,

    /// Weight subtracted from the baseline
    pub weight: u32,
}

/// Full accounting of one score computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Baseline the computation started from
    pub baseline: i64,

    /// Floor the score was clamped at
    pub floor: i64,

    /// Per-control deductions, in catalog order
    pub deductions: Vec<Deduction>,

    /// Sum of all deduction weights
    pub total_weight_deducted: u64,

    /// Final score after clamping
    pub score: i64,

    /// Whether the floor clamp activated
    pub clamped: bool,
}

/// Computes scores over an assessment state
///
/// Deduction is binary: a `partial` control deducts its full weight,
/// exactly like `not-met`. Derived `not-applicable` controls never deduct.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    /// Create an engine with the given configuration
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Compute the score for an assessment state
    pub fn compute_score(&self, state: &AssessmentStateStore<'_>, weights: &WeightTable) -> i64 {
        self.score_breakdown(state, weights).score
    }

    /// Compute the score with full per-control accounting
    ///
    /// Walks every control in the paired taxonomy in catalog order; each
    /// control whose derived status is `partial` or `not-met` contributes
    /// its weight to the deduction total.
    pub fn score_breakdown(
        &self,
        state: &AssessmentStateStore<'_>,
        weights: &WeightTable,
    ) -> ScoreBreakdown {
        let mut deductions = Vec::new();
        let mut total_weight_deducted: u64 = 0;

        for control in state.taxonomy().controls() {
            let status = state.control_status(control);
            if !matches!(status, ControlStatus::Partial | ControlStatus::NotMet) {
                continue;
            }
            let weight = weights.get(&control.id);
            total_weight_deducted += u64::from(weight);
            deductions.push(Deduction {
                control_id: control.id.clone(),
                status,
                weight,
            });
        }

        let raw = self
            .config
            .baseline
            .saturating_sub(i64::try_from(total_weight_deducted).unwrap_or(i64::MAX));
        let score = raw.max(self.config.floor);
        let clamped = raw < self.config.floor;

        info!(
            score,
            total_weight_deducted,
            deducting_controls = deductions.len(),
            clamped,
            "assessment score computed"
        );

        ScoreBreakdown {
            baseline: self.config.baseline,
            floor: self.config.floor,
            deductions,
            total_weight_deducted,
            score,
            clamped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ObjectiveStatus;
    use crate::taxonomy::{CatalogDefinition, TaxonomyStore};

    fn catalog_json(control_count: usize) -> TaxonomyStore {
        let controls: Vec<serde_json::Value> = (1..=control_count)
            .map(|n| {
                serde_json::json!({
                    "id": format!("3.1.{n}"),
                    "name": format!("Requirement {n}"),
                    "description": "",
                    "objectives": [
                        { "id": format!("3.1.{n}[a]"), "text": "a" },
                        { "id": format!("3.1.{n}[b]"), "text": "b" }
                    ]
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
    fn test_default_config_is_sprs() {
        let config = ScoringConfig::default();
        assert_eq!(config.baseline, 110);
        assert_eq!(config.floor, -203);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ScoringConfig::builder().baseline(100).floor(0).build();
        assert_eq!(config.baseline, 100);
        assert_eq!(config.floor, 0);
    }

    #[test]
    fn test_weight_table_absent_is_zero() {
        let weights = WeightTable::from_iter([("3.1.1", 5u32)]);
        assert_eq!(weights.get("3.1.1"), 5);
        assert_eq!(weights.get("3.1.2"), 0);
    }

    #[test]
    fn test_all_met_scores_baseline() {
        let taxonomy = catalog_json(2);
        let mut state = AssessmentStateStore::new(&taxonomy);
        for id in ["3.1.1[a]", "3.1.1[b]", "3.1.2[a]", "3.1.2[b]"] {
            state.set_status(id, ObjectiveStatus::Met).unwrap();
        }
        let engine = ScoringEngine::new(ScoringConfig::default());
        let weights = WeightTable::from_iter([("3.1.1", 5u32), ("3.1.2", 3u32)]);
        assert_eq!(engine.compute_score(&state, &weights), 110);
    }

    #[test]
    fn test_partial_deducts_full_weight() {
        let taxonomy = catalog_json(1);
        let mut state = AssessmentStateStore::new(&taxonomy);
        state.set_status("3.1.1[a]", ObjectiveStatus::Met).unwrap();
        state
            .set_status("3.1.1[b]", ObjectiveStatus::NotMet)
            .unwrap();

        let engine = ScoringEngine::new(ScoringConfig::default());
        let weights = WeightTable::from_iter([("3.1.1", 5u32)]);
        let breakdown = engine.score_breakdown(&state, &weights);

        assert_eq!(breakdown.score, 105);
        assert_eq!(breakdown.deductions.len(), 1);
        assert_eq!(breakdown.deductions[0].status, ControlStatus::Partial);
        assert_eq!(breakdown.deductions[0].weight, 5);
        assert!(!breakdown.clamped);
    }

    #[test]
    fn test_not_applicable_control_does_not_deduct() {
        let taxonomy = catalog_json(1);
        let mut state = AssessmentStateStore::new(&taxonomy);
        state
            .set_status("3.1.1[a]", ObjectiveStatus::NotApplicable)
            .unwrap();
        state
            .set_status("3.1.1[b]", ObjectiveStatus::NotApplicable)
            .unwrap();

        let engine = ScoringEngine::new(ScoringConfig::default());
        let weights = WeightTable::from_iter([("3.1.1", 5u32)]);
        assert_eq!(engine.compute_score(&state, &weights), 110);
    }

    #[test]
    fn test_score_clamps_at_floor() {
        // 35 unmet controls at weight 10 would reach 110 - 350 = -240
        let taxonomy = catalog_json(35);
        let state = AssessmentStateStore::new(&taxonomy);
        let weights: WeightTable = (1..=35).map(|n| (format!("3.1.{n}"), 10u32)).collect();

        let engine = ScoringEngine::new(ScoringConfig::default());
        let breakdown = engine.score_breakdown(&state, &weights);
        assert_eq!(breakdown.score, -203);
        assert!(breakdown.clamped);
        assert_eq!(breakdown.total_weight_deducted, 350);
    }

    #[test]
    fn test_unweighted_control_deducts_zero() {
        let taxonomy = catalog_json(1);
        let state = AssessmentStateStore::new(&taxonomy);
        let engine = ScoringEngine::new(ScoringConfig::default());
        let breakdown = engine.score_breakdown(&state, &WeightTable::new());

        assert_eq!(breakdown.score, 110);
        assert_eq!(breakdown.deductions.len(), 1);
        assert_eq!(breakdown.deductions[0].weight, 0);
    }

    #[test]
    fn test_breakdown_serializes() {
        let taxonomy = catalog_json(1);
        let state = AssessmentStateStore::new(&taxonomy);
        let engine = ScoringEngine::new(ScoringConfig::default());
        let breakdown = engine.score_breakdown(&state, &WeightTable::new());

        let json = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(json["baseline"], 110);
        assert_eq!(json["deductions"][0]["status"], "not-met");
    }
}
