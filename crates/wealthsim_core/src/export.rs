//! The stable output contract.
//!
//! Downstream collaborators (narrative generation, charting, report export)
//! consume these types and never see paths, regimes, or RNG internals. The
//! schema is versioned; additive changes bump `SCHEMA_VERSION`.

use serde::{Deserialize, Serialize};

use crate::model::{ScenarioComparison, SimulationResult};

pub const SCHEMA_VERSION: u32 = 1;

/// One point of the percentile time series, keyed by age.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExportedBandPoint {
    pub age: u8,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

/// Scalar summary of one run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExportedSummary {
    pub success_probability: f64,
    pub depletion_probability: f64,
    pub terminal_p10: f64,
    pub terminal_p25: f64,
    pub terminal_p50: f64,
    pub terminal_p75: f64,
    pub terminal_p90: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub mean_max_drawdown: f64,
    pub worst_max_drawdown: f64,
    pub var_95: f64,
    pub cvar_95: f64,
    pub paths_used: usize,
    pub paths_discarded: usize,
}

/// The versioned contract for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedResult {
    pub schema_version: u32,
    pub start_age: u8,
    pub retirement_age: u8,
    pub series: Vec<ExportedBandPoint>,
    pub summary: ExportedSummary,
}

/// Per-scenario deltas against the baseline, pre-ranked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedScenarioDelta {
    pub rank: usize,
    pub name: String,
    pub success_probability: f64,
    pub success_delta: f64,
    pub depletion_delta: f64,
    pub median_terminal: f64,
    pub median_terminal_delta: f64,
    pub sharpe_delta: f64,
}

/// The versioned contract for a scenario comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedComparison {
    pub schema_version: u32,
    pub baseline: ExportedResult,
    pub scenarios: Vec<ExportedScenarioDelta>,
}

/// Convert a result into the export contract.
#[must_use]
pub fn export_result(result: &SimulationResult) -> ExportedResult {
    let series = (0..result.bands.len())
        .map(|period| ExportedBandPoint {
            age: result.age_at(period),
            p10: result.bands.p10[period],
            p25: result.bands.p25[period],
            p50: result.bands.p50[period],
            p75: result.bands.p75[period],
            p90: result.bands.p90[period],
        })
        .collect();

    ExportedResult {
        schema_version: SCHEMA_VERSION,
        start_age: result.start_age,
        retirement_age: result.retirement_age,
        series,
        summary: ExportedSummary {
            success_probability: result.success_probability,
            depletion_probability: result.depletion_probability,
            terminal_p10: result.terminal.p10,
            terminal_p25: result.terminal.p25,
            terminal_p50: result.terminal.p50,
            terminal_p75: result.terminal.p75,
            terminal_p90: result.terminal.p90,
            annualized_volatility: result.risk.annualized_volatility,
            sharpe_ratio: result.risk.sharpe_ratio,
            mean_max_drawdown: result.risk.mean_max_drawdown,
            worst_max_drawdown: result.risk.worst_max_drawdown,
            var_95: result.risk.var_95,
            cvar_95: result.risk.cvar_95,
            paths_used: result.paths_used,
            paths_discarded: result.paths_discarded,
        },
    }
}

/// Convert a comparison into the export contract.
#[must_use]
pub fn export_comparison(comparison: &ScenarioComparison) -> ExportedComparison {
    let scenarios = comparison
        .outcomes
        .iter()
        .enumerate()
        .map(|(index, outcome)| ExportedScenarioDelta {
            rank: index + 1,
            name: outcome.name.clone(),
            success_probability: outcome.result.success_probability,
            success_delta: outcome.success_delta,
            depletion_delta: outcome.depletion_delta,
            median_terminal: outcome.result.median_terminal(),
            median_terminal_delta: outcome.median_terminal_delta,
            sharpe_delta: outcome.sharpe_delta,
        })
        .collect();

    ExportedComparison {
        schema_version: SCHEMA_VERSION,
        baseline: export_result(&comparison.baseline),
        scenarios,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssetUniverse, SimulationParameters};
    use crate::simulation::{RunConfig, run_simulation};

    #[test]
    fn export_keys_series_by_age() {
        let params = SimulationParameters {
            n_simulations: 1_000,
            random_seed: Some(3),
            ..Default::default()
        };
        let result =
            run_simulation(&params, &AssetUniverse::balanced_us(), &RunConfig::default()).unwrap();
        let exported = export_result(&result);

        assert_eq!(exported.schema_version, SCHEMA_VERSION);
        assert_eq!(exported.series.len(), result.periods + 1);
        assert_eq!(exported.series[0].age, params.current_age);
        assert_eq!(
            exported.series.last().unwrap().age,
            params.life_expectancy
        );
    }
}
