//! Statistical properties of aggregated results.

use crate::model::{AssetUniverse, ReturnOverlay, SimulationParameters};
use crate::simulation::{RunConfig, run_simulation};

fn run(params: &SimulationParameters) -> crate::model::SimulationResult {
    run_simulation(params, &AssetUniverse::balanced_us(), &RunConfig::default()).unwrap()
}

#[test]
fn percentile_bands_are_ordered_every_period() {
    let params = SimulationParameters {
        n_simulations: 5_000,
        random_seed: Some(42),
        ..Default::default()
    };
    let result = run(&params);

    for period in 0..result.bands.len() {
        let p10 = result.bands.p10[period];
        let p25 = result.bands.p25[period];
        let p50 = result.bands.p50[period];
        let p75 = result.bands.p75[period];
        let p90 = result.bands.p90[period];
        assert!(
            p10 <= p25 && p25 <= p50 && p50 <= p75 && p75 <= p90,
            "band ordering violated at period {period}: {p10} {p25} {p50} {p75} {p90}"
        );
    }

    assert!(result.terminal.p10 <= result.terminal.p50);
    assert!(result.terminal.p50 <= result.terminal.p90);
}

#[test]
fn bands_start_at_the_initial_value() {
    let params = SimulationParameters {
        current_portfolio_value: 250_000.0,
        random_seed: Some(5),
        ..Default::default()
    };
    let result = run(&params);
    assert_eq!(result.bands.p10[0], 250_000.0);
    assert_eq!(result.bands.p90[0], 250_000.0);
}

#[test]
fn probabilities_are_fractions() {
    let params = SimulationParameters {
        random_seed: Some(8),
        ..Default::default()
    };
    let result = run(&params);
    assert!((0.0..=1.0).contains(&result.success_probability));
    assert!((0.0..=1.0).contains(&result.depletion_probability));
}

#[test]
fn cvar_dominates_var() {
    let params = SimulationParameters {
        random_seed: Some(13),
        ..Default::default()
    };
    let result = run(&params);
    // Expected shortfall in the tail is at least the tail cutoff loss.
    assert!(result.risk.cvar_95 >= result.risk.var_95);
    assert!(result.risk.var_95 >= 0.0);
}

#[test]
fn drawdown_metrics_are_consistent() {
    let params = SimulationParameters {
        random_seed: Some(21),
        ..Default::default()
    };
    let result = run(&params);
    assert!(result.risk.mean_max_drawdown <= result.risk.worst_max_drawdown);
    assert!((0.0..=1.0).contains(&result.risk.worst_max_drawdown));
}

#[test]
fn jump_overlay_widens_the_left_tail() {
    let base = SimulationParameters {
        n_simulations: 5_000,
        random_seed: Some(42),
        ..Default::default()
    };
    let jumpy = SimulationParameters {
        overlays: vec![ReturnOverlay::JumpDiffusion(Default::default())],
        ..base.clone()
    };

    let calm = run(&base);
    let shocked = run(&jumpy);

    // Crash-like negative jumps pull the low percentiles down.
    assert!(shocked.terminal.p10 < calm.terminal.p10);
    assert!(shocked.risk.mean_max_drawdown > calm.risk.mean_max_drawdown);
}
