// crates/core/src/impact.rs
//! Environmental-impact rollups over a task's completed stages.
//!
//! Carbon, energy, and token figures ride on `action_result` stage records.
//! Water is not reported by the agent at all; it is estimated from the
//! energy and token totals with a two-method blend. Every coefficient is a
//! field of [`ImpactConfig`] so the estimation stays auditable; the policy
//! itself (mean of the two methods) is a domain decision, not an incidental
//! detail.

use serde::{Deserialize, Serialize};

use crate::aggregate::Task;
use crate::event::StageKind;

/// Coefficients for the impact estimation.
#[derive(Debug, Clone)]
pub struct ImpactConfig {
    /// Datacenter water-use effectiveness: liters of water per kWh.
    pub water_liters_per_kwh: f64,
    /// Milliliters of water per generated token, measured for the
    /// reference model.
    pub water_ml_per_token: f64,
    /// Parameter count (billions) of the reference model the per-token
    /// coefficient was measured against.
    pub reference_model_params_b: f64,
    /// Parameter count (billions) assumed for the deployed model.
    pub model_params_b: f64,
    /// Grid carbon intensity (grams CO2e per kWh), used to back energy out
    /// of a carbon figure when stages report carbon without energy.
    pub grid_carbon_g_per_kwh: f64,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            water_liters_per_kwh: 1.8,
            water_ml_per_token: 0.5,
            reference_model_params_b: 175.0,
            model_params_b: 8.0,
            grid_carbon_g_per_kwh: 400.0,
        }
    }
}

/// Aggregate resource usage derived from one task's thoughts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactRollup {
    pub carbon_grams: f64,
    pub water_ml: f64,
    pub tokens: u64,
}

/// Resource fields as they appear on an `action_result` stage record.
#[derive(Debug, Default, Deserialize)]
struct ResourceUsage {
    #[serde(default)]
    carbon_grams: Option<f64>,
    /// Milliwatt-hours on the wire.
    #[serde(default)]
    energy_mwh: Option<f64>,
    #[serde(default)]
    tokens_total: Option<u64>,
}

/// Compute a task's rollup, or `None` when no thought carried a carbon
/// figure. "No data" is distinct from "zero impact".
///
/// Thoughts without an `action_result` stage, or whose record lacks a
/// field, contribute zero to that figure. The carbon total only counts
/// records where `carbon_grams` is present and non-null, so absence is
/// never mistaken for zero pollution.
pub fn compute_impact(task: &Task, config: &ImpactConfig) -> Option<ImpactRollup> {
    let mut carbon_grams = 0.0;
    let mut energy_mwh = 0.0;
    let mut tokens: u64 = 0;
    let mut saw_carbon = false;

    for thought in &task.thoughts {
        let Some(stage) = thought.stages.get(&StageKind::ActionResult) else {
            continue;
        };
        let usage: ResourceUsage =
            serde_json::from_value(stage.data.clone()).unwrap_or_default();
        if let Some(grams) = usage.carbon_grams {
            carbon_grams += grams;
            saw_carbon = true;
        }
        energy_mwh += usage.energy_mwh.unwrap_or(0.0);
        tokens += usage.tokens_total.unwrap_or(0);
    }

    if !saw_carbon {
        return None;
    }

    Some(ImpactRollup {
        carbon_grams,
        water_ml: estimate_water_ml(energy_mwh, carbon_grams, tokens, config),
        tokens,
    })
}

/// Fold per-task rollups into a dashboard-wide total. Tasks without any
/// carbon data contribute nothing; `None` when no task had data.
pub fn aggregate_impact<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    config: &ImpactConfig,
) -> Option<ImpactRollup> {
    let mut total: Option<ImpactRollup> = None;
    for rollup in tasks.into_iter().filter_map(|t| compute_impact(t, config)) {
        let acc = total.get_or_insert(ImpactRollup {
            carbon_grams: 0.0,
            water_ml: 0.0,
            tokens: 0,
        });
        acc.carbon_grams += rollup.carbon_grams;
        acc.water_ml += rollup.water_ml;
        acc.tokens += rollup.tokens;
    }
    total
}

/// Two-method water blend:
/// (a) total energy in kWh × liters-per-kWh, scaled to milliliters;
/// (b) total tokens × ml-per-token, scaled by model size relative to the
///     reference model.
/// The final figure is the arithmetic mean of (a) and (b).
///
/// When no stage reported energy but carbon was reported, energy is backed
/// out of the grid carbon intensity first, so method (a) still contributes.
fn estimate_water_ml(
    energy_mwh: f64,
    carbon_grams: f64,
    tokens: u64,
    config: &ImpactConfig,
) -> f64 {
    let mut energy_kwh = energy_mwh / 1_000_000.0;
    if energy_kwh <= 0.0 && carbon_grams > 0.0 && config.grid_carbon_g_per_kwh > 0.0 {
        energy_kwh = carbon_grams / config.grid_carbon_g_per_kwh;
    }
    let by_energy = energy_kwh * config.water_liters_per_kwh * 1000.0;

    let size_ratio = if config.reference_model_params_b > 0.0 {
        config.model_params_b / config.reference_model_params_b
    } else {
        0.0
    };
    let by_tokens = tokens as f64 * config.water_ml_per_token * size_ratio;

    (by_energy + by_tokens) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::TaskArena;
    use crate::event::StepEvent;
    use serde_json::json;
    use std::collections::HashSet;

    const EPS: f64 = 1e-9;

    /// Build a task whose thoughts carry the given action-result records.
    fn task_with_results(records: &[Option<serde_json::Value>]) -> Task {
        let mut arena = TaskArena::new();
        let ours = HashSet::new();
        for (i, record) in records.iter().enumerate() {
            let thought_id = format!("t{i}");
            match record {
                Some(data) => {
                    let mut e = StepEvent::new(StageKind::ActionResult, "task", &thought_id);
                    e.record = data.clone();
                    arena.apply(&e, &ours);
                }
                None => {
                    let e = StepEvent::new(StageKind::ThoughtStart, "task", &thought_id);
                    arena.apply(&e, &ours);
                }
            }
        }
        arena.get("task").unwrap().clone()
    }

    #[test]
    fn test_no_carbon_anywhere_returns_none() {
        let task = task_with_results(&[None, Some(json!({"tokens_total": 50}))]);
        assert!(compute_impact(&task, &ImpactConfig::default()).is_none());
    }

    #[test]
    fn test_explicit_zero_carbon_returns_zero_rollup() {
        let task = task_with_results(&[Some(json!({"carbon_grams": 0}))]);
        let rollup = compute_impact(&task, &ImpactConfig::default()).unwrap();
        assert_eq!(rollup.carbon_grams, 0.0);
        assert_eq!(rollup.water_ml, 0.0);
        assert_eq!(rollup.tokens, 0);
    }

    #[test]
    fn test_carbon_sums_across_thoughts() {
        let task = task_with_results(&[
            Some(json!({"carbon_grams": 1.5, "tokens_total": 100})),
            None,
            Some(json!({"carbon_grams": 2.5, "tokens_total": 200})),
        ]);
        let rollup = compute_impact(&task, &ImpactConfig::default()).unwrap();
        assert!((rollup.carbon_grams - 4.0).abs() < EPS);
        assert_eq!(rollup.tokens, 300);
    }

    #[test]
    fn test_water_from_reported_energy() {
        // 2_000_000 mWh = 2 kWh. Method (a): 2 * 1.8 * 1000 = 3600 ml.
        // No tokens, so the blend halves it.
        let task = task_with_results(&[Some(json!({
            "carbon_grams": 5,
            "energy_mwh": 2_000_000.0
        }))]);
        let rollup = compute_impact(&task, &ImpactConfig::default()).unwrap();
        assert!((rollup.water_ml - 1800.0).abs() < EPS);
    }

    #[test]
    fn test_water_blends_energy_and_token_methods() {
        let config = ImpactConfig {
            water_liters_per_kwh: 2.0,
            water_ml_per_token: 1.0,
            reference_model_params_b: 100.0,
            model_params_b: 50.0,
            grid_carbon_g_per_kwh: 400.0,
        };
        // 1 kWh → method (a) = 2000 ml; 1000 tokens × 1.0 × 0.5 = 500 ml.
        let task = task_with_results(&[Some(json!({
            "carbon_grams": 1,
            "energy_mwh": 1_000_000.0,
            "tokens_total": 1000
        }))]);
        let rollup = compute_impact(&task, &config).unwrap();
        assert!((rollup.water_ml - 1250.0).abs() < EPS);
    }

    #[test]
    fn test_water_positive_when_only_carbon_reported() {
        // Carbon 10 g at 400 g/kWh → 0.025 kWh → 45 ml by energy; mean 22.5.
        let task = task_with_results(&[Some(json!({"carbon_grams": 10}))]);
        let rollup = compute_impact(&task, &ImpactConfig::default()).unwrap();
        assert!(rollup.water_ml > 0.0);
        assert!((rollup.water_ml - 22.5).abs() < EPS);
        assert_eq!(rollup.tokens, 0);
    }

    #[test]
    fn test_null_carbon_field_does_not_count_as_data() {
        let task = task_with_results(&[Some(json!({
            "carbon_grams": null,
            "tokens_total": 10
        }))]);
        assert!(compute_impact(&task, &ImpactConfig::default()).is_none());
    }

    #[test]
    fn test_aggregate_impact_sums_tasks_with_data() {
        let with_data = task_with_results(&[Some(json!({"carbon_grams": 3}))]);
        let without = task_with_results(&[None]);
        let config = ImpactConfig::default();

        let total = aggregate_impact([&with_data, &without, &with_data], &config).unwrap();
        assert!((total.carbon_grams - 6.0).abs() < EPS);

        assert!(aggregate_impact([&without], &config).is_none());
    }
}
