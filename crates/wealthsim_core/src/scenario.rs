//! Scenario comparison with common random numbers.
//!
//! Every scenario reruns the full pipeline with the baseline's master seed,
//! so each path index draws from the same substream in every run. Observed
//! differences are then attributable to the parameter change, not sampling
//! noise.

use std::sync::atomic::{AtomicBool, AtomicUsize};

use rustc_hash::FxHashSet;

use crate::error::{SimulationError, ValidationError, ValidationIssue};
use crate::model::{
    AssetUniverse, ScenarioComparison, ScenarioOutcome, ScenarioSpec, SimulationParameters,
    SimulationResult,
};
use crate::simulation::{RunConfig, run_validated};
use crate::validate::validate;

/// Run the baseline and every scenario, returning ranked outcomes.
pub fn compare_scenarios(
    baseline: &SimulationParameters,
    universe: &AssetUniverse,
    scenarios: &[ScenarioSpec],
    config: &RunConfig,
) -> Result<ScenarioComparison, SimulationError> {
    compare_with_hooks(baseline, universe, scenarios, config, None, None)
}

/// Comparison with the job layer's cancellation/progress hooks attached to
/// every underlying run.
pub(crate) fn compare_with_hooks(
    baseline: &SimulationParameters,
    universe: &AssetUniverse,
    scenarios: &[ScenarioSpec],
    config: &RunConfig,
    cancel: Option<&AtomicBool>,
    progress: Option<&AtomicUsize>,
) -> Result<ScenarioComparison, SimulationError> {
    let mut seen = FxHashSet::default();
    let duplicates: Vec<ValidationIssue> = scenarios
        .iter()
        .filter(|s| !seen.insert(s.name.as_str()))
        .map(|s| ValidationIssue::DuplicateScenarioName(s.name.clone()))
        .collect();
    if !duplicates.is_empty() {
        return Err(ValidationError::new(duplicates).into());
    }

    // Pin the seed up front: common random numbers require every run,
    // baseline included, to derive the same per-path substreams.
    let seed = baseline.random_seed.unwrap_or_else(rand::random);
    let mut pinned = baseline.clone();
    pinned.random_seed = Some(seed);

    let run = |params: &SimulationParameters| -> Result<SimulationResult, SimulationError> {
        let validated = validate(params, universe)?;
        run_validated(&validated, universe, config, cancel, progress)
    };

    let baseline_result = run(&pinned)?;

    let mut outcomes = Vec::with_capacity(scenarios.len());
    for spec in scenarios {
        let mut params = spec.apply_to(&pinned);
        params.random_seed = Some(seed);

        tracing::info!(scenario = %spec.name, "running scenario");
        let result = run(&params)?;
        outcomes.push(outcome(spec, result, &baseline_result));
    }

    rank(&mut outcomes);

    Ok(ScenarioComparison {
        baseline: baseline_result,
        outcomes,
    })
}

fn outcome(
    spec: &ScenarioSpec,
    result: SimulationResult,
    baseline: &SimulationResult,
) -> ScenarioOutcome {
    ScenarioOutcome {
        name: spec.name.clone(),
        success_delta: result.success_probability - baseline.success_probability,
        depletion_delta: result.depletion_probability - baseline.depletion_probability,
        median_terminal_delta: result.median_terminal() - baseline.median_terminal(),
        sharpe_delta: result.risk.sharpe_ratio - baseline.risk.sharpe_ratio,
        result,
    }
}

/// Order by improvement magnitude: success-probability delta first, median
/// terminal delta as tie-break, name for stability.
fn rank(outcomes: &mut [ScenarioOutcome]) {
    outcomes.sort_by(|a, b| {
        b.success_delta
            .partial_cmp(&a.success_delta)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.median_terminal_delta
                    .partial_cmp(&a.median_terminal_delta)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.name.cmp(&b.name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParameterDelta;

    fn quick_baseline() -> SimulationParameters {
        SimulationParameters {
            n_simulations: 2_000,
            random_seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn duplicate_scenario_names_rejected() {
        let specs = vec![
            ScenarioSpec::new("same", vec![]),
            ScenarioSpec::new("same", vec![]),
        ];
        let err = compare_scenarios(
            &quick_baseline(),
            &AssetUniverse::balanced_us(),
            &specs,
            &RunConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SimulationError::Validation(_)));
    }

    #[test]
    fn empty_delta_scenario_matches_baseline_exactly() {
        // With common random numbers an unchanged scenario must reproduce
        // the baseline bit for bit.
        let specs = vec![ScenarioSpec::new("unchanged", vec![])];
        let comparison = compare_scenarios(
            &quick_baseline(),
            &AssetUniverse::balanced_us(),
            &specs,
            &RunConfig::default(),
        )
        .unwrap();
        let outcome = comparison.outcome("unchanged").unwrap();
        assert_eq!(outcome.success_delta, 0.0);
        assert_eq!(outcome.median_terminal_delta, 0.0);
    }

    #[test]
    fn higher_contribution_ranks_above_lower() {
        let specs = vec![
            ScenarioSpec::new(
                "save_less",
                vec![ParameterDelta::AnnualContribution { amount: -6_000.0 }],
            ),
            ScenarioSpec::new(
                "save_more",
                vec![ParameterDelta::AnnualContribution { amount: 12_000.0 }],
            ),
        ];
        let comparison = compare_scenarios(
            &quick_baseline(),
            &AssetUniverse::balanced_us(),
            &specs,
            &RunConfig::default(),
        )
        .unwrap();
        assert_eq!(comparison.best().unwrap().name, "save_more");
        let save_more = comparison.outcome("save_more").unwrap();
        let save_less = comparison.outcome("save_less").unwrap();
        assert!(save_more.median_terminal_delta > save_less.median_terminal_delta);
    }
}
