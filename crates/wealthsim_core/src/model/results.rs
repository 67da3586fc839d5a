//! Simulation output types.
//!
//! A [`SimulationResult`] is the immutable reduction of one path ensemble.
//! Individual paths are never part of the result; they are consumed by the
//! aggregator and dropped.

use serde::{Deserialize, Serialize};

/// Percentile series over the simulated horizon, one value per period
/// boundary (index 0 is the starting value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercentileBands {
    pub p10: Vec<f64>,
    pub p25: Vec<f64>,
    pub p50: Vec<f64>,
    pub p75: Vec<f64>,
    pub p90: Vec<f64>,
}

impl PercentileBands {
    /// Number of period boundaries in the series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.p50.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.p50.is_empty()
    }
}

/// Terminal-value percentiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TerminalPercentiles {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

/// Ensemble risk metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Annualized std dev of period-over-period path returns.
    pub annualized_volatility: f64,
    /// Mean annual return over the configured risk-free rate, per unit of
    /// volatility.
    pub sharpe_ratio: f64,
    /// Per-path maximum drawdown, averaged over the ensemble.
    pub mean_max_drawdown: f64,
    /// Worst single-path maximum drawdown.
    pub worst_max_drawdown: f64,
    /// Loss at the 5th percentile of terminal values, as a fraction of the
    /// starting portfolio (0 when the 5th percentile exceeds the start).
    pub var_95: f64,
    /// Mean loss across the tail at or below the VaR cutoff, same basis.
    pub cvar_95: f64,
}

/// The statistical summary of one Monte Carlo run. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub start_age: u8,
    pub retirement_age: u8,
    /// Number of simulated periods (years).
    pub periods: usize,
    pub bands: PercentileBands,
    pub terminal: TerminalPercentiles,
    /// Fraction of paths that stayed solvent through the horizon AND met the
    /// terminal-value target.
    pub success_probability: f64,
    /// Fraction of paths that depleted at any point. Deliberately a separate
    /// metric from success: the two answer different questions.
    pub depletion_probability: f64,
    pub risk: RiskMetrics,
    /// Paths dropped for producing non-finite values.
    pub paths_discarded: usize,
    /// Paths that survived into the statistics.
    pub paths_used: usize,
}

impl SimulationResult {
    /// Median terminal portfolio value.
    #[must_use]
    pub fn median_terminal(&self) -> f64 {
        self.terminal.p50
    }

    /// Age at the given period boundary.
    #[must_use]
    pub fn age_at(&self, period: usize) -> u8 {
        self.start_age.saturating_add(period as u8)
    }
}
