//! Simulation input parameters.

use serde::{Deserialize, Serialize};

/// Lower bound on the Monte Carlo path count.
pub const MIN_PATHS: usize = 1_000;
/// Upper bound on the Monte Carlo path count.
pub const MAX_PATHS: usize = 100_000;

/// Household parameters for one simulation request.
///
/// All entities derived from this are created and consumed within a single
/// request; nothing here carries process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub current_age: u8,
    pub retirement_age: u8,
    pub life_expectancy: u8,
    pub current_portfolio_value: f64,
    pub annual_contribution: f64,
    /// Annual growth rate applied to the contribution (raises, inflation).
    pub contribution_growth_rate: f64,
    /// Fraction of current income withdrawn per year in retirement.
    pub target_replacement_ratio: f64,
    pub current_annual_income: f64,
    /// Resolved to a default allocation when `allocation` is `None`.
    pub risk_tolerance: RiskTolerance,
    /// Explicit target weights over the universe's asset classes.
    /// Rescaled to sum to 1 during validation.
    #[serde(default)]
    pub allocation: Option<Vec<f64>>,
    #[serde(default)]
    pub rebalance_frequency: RebalanceFrequency,
    #[serde(default)]
    pub market_assumption: MarketAssumption,
    pub n_simulations: usize,
    /// `None` draws a fresh seed per run.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Stochastic overlays layered over the base return model. Entries
    /// compose independently; a `None` entry is inert.
    #[serde(default)]
    pub overlays: Vec<ReturnOverlay>,
    #[serde(default = "default_inflation_rate")]
    pub inflation_rate: f64,
    /// Terminal-value target for the success metric. `None` counts any
    /// strictly positive terminal value as meeting the target.
    #[serde(default)]
    pub target_terminal_value: Option<f64>,
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
}

fn default_inflation_rate() -> f64 {
    0.025
}

fn default_risk_free_rate() -> f64 {
    0.03
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            current_age: 35,
            retirement_age: 65,
            life_expectancy: 90,
            current_portfolio_value: 100_000.0,
            annual_contribution: 12_000.0,
            contribution_growth_rate: 0.02,
            target_replacement_ratio: 0.75,
            current_annual_income: 80_000.0,
            risk_tolerance: RiskTolerance::Moderate,
            allocation: None,
            rebalance_frequency: RebalanceFrequency::default(),
            market_assumption: MarketAssumption::default(),
            n_simulations: 10_000,
            random_seed: None,
            overlays: Vec::new(),
            inflation_rate: default_inflation_rate(),
            target_terminal_value: None,
            risk_free_rate: default_risk_free_rate(),
        }
    }
}

impl SimulationParameters {
    /// Number of simulated periods (one per year of remaining life).
    #[must_use]
    pub fn periods(&self) -> usize {
        usize::from(self.life_expectancy.saturating_sub(self.current_age))
    }

    /// Years until retirement (0 if already retired).
    #[must_use]
    pub fn years_to_retirement(&self) -> usize {
        usize::from(self.retirement_age.saturating_sub(self.current_age))
    }
}

/// Named risk tier, resolved to a default allocation when the caller does
/// not supply explicit weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    /// Default weights for a universe of `n_assets` classes.
    ///
    /// The presets assume the standard four-class universe (US equity,
    /// international equity, bonds, cash). Other universe sizes require an
    /// explicit allocation.
    #[must_use]
    pub fn default_allocation(self, n_assets: usize) -> Option<Vec<f64>> {
        if n_assets != 4 {
            return None;
        }
        Some(match self {
            RiskTolerance::Conservative => vec![0.25, 0.10, 0.50, 0.15],
            RiskTolerance::Moderate => vec![0.45, 0.15, 0.35, 0.05],
            RiskTolerance::Aggressive => vec![0.65, 0.25, 0.10, 0.0],
        })
    }
}

/// How often holdings are pulled back to the target weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type")]
pub enum RebalanceFrequency {
    Never,
    #[default]
    Annually,
    EveryYears {
        years: u32,
    },
}

impl RebalanceFrequency {
    /// Whether a rebalance is due at the end of the given period (0-based).
    #[must_use]
    pub fn due(self, period: usize) -> bool {
        match self {
            RebalanceFrequency::Never => false,
            RebalanceFrequency::Annually => true,
            RebalanceFrequency::EveryYears { years } => {
                years > 0 && (period + 1) % years as usize == 0
            }
        }
    }
}

/// Broad market assumption scaling the base expected returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarketAssumption {
    Pessimistic,
    #[default]
    Expected,
    Optimistic,
}

impl MarketAssumption {
    /// Multiplier applied to every asset class's expected return.
    #[must_use]
    pub fn mean_multiplier(self) -> f64 {
        match self {
            MarketAssumption::Pessimistic => 0.6,
            MarketAssumption::Expected => 1.0,
            MarketAssumption::Optimistic => 1.15,
        }
    }
}

/// Stochastic overlay layered over the base correlated-normal return model.
///
/// Overlays are strategy variants, not subclasses: `SimulationParameters`
/// carries a list of them so jump and regime effects can be combined
/// independently.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type")]
pub enum ReturnOverlay {
    #[default]
    None,
    /// Compound-Poisson jumps: with annual intensity lambda, each period may
    /// receive one or more lognormally-sized shocks added to the return.
    JumpDiffusion(JumpDiffusionParams),
    /// Discrete Markov chain over named regimes, each scaling the base mean
    /// and volatility; the active regime evolves once per period per path.
    RegimeSwitching(RegimeSwitchingParams),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JumpDiffusionParams {
    /// Expected jumps per year.
    pub annual_intensity: f64,
    /// Mean of the log jump size (negative for crash-like shocks).
    pub mean_log_size: f64,
    /// Std dev of the log jump size.
    pub log_size_std_dev: f64,
    /// Per-period jump contribution is clamped to +/- this magnitude so a
    /// pathological draw cannot push values to NaN/Inf.
    #[serde(default = "default_max_jump_magnitude")]
    pub max_magnitude: f64,
}

fn default_max_jump_magnitude() -> f64 {
    0.95
}

impl Default for JumpDiffusionParams {
    fn default() -> Self {
        // Roughly one -8% shock every two years, calibrated loosely to
        // post-war US drawdown frequency.
        Self {
            annual_intensity: 0.5,
            mean_log_size: -0.08,
            log_size_std_dev: 0.12,
            max_magnitude: default_max_jump_magnitude(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeProfile {
    pub name: String,
    /// Multiplier on each asset class's expected return while this regime
    /// is active.
    pub mean_multiplier: f64,
    /// Multiplier on each asset class's volatility while this regime is
    /// active.
    pub volatility_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeSwitchingParams {
    pub regimes: Vec<RegimeProfile>,
    /// Row-stochastic transition matrix; `transition[i][j]` is the
    /// probability of moving from regime i to regime j at a period boundary.
    pub transition: Vec<Vec<f64>>,
    pub initial_regime: usize,
}

impl RegimeSwitchingParams {
    /// Four-state normal/bull/bear/crisis chain with annual transition
    /// probabilities giving multi-year normal stretches, rare crises, and
    /// short-lived bear markets.
    #[must_use]
    pub fn four_state() -> Self {
        let regime = |name: &str, mean: f64, vol: f64| RegimeProfile {
            name: name.to_string(),
            mean_multiplier: mean,
            volatility_multiplier: vol,
        };
        Self {
            regimes: vec![
                regime("normal", 1.0, 1.0),
                regime("bull", 1.5, 0.85),
                regime("bear", -0.5, 1.4),
                regime("crisis", -2.0, 2.2),
            ],
            transition: vec![
                vec![0.70, 0.15, 0.12, 0.03],
                vec![0.30, 0.55, 0.13, 0.02],
                vec![0.45, 0.05, 0.45, 0.05],
                vec![0.50, 0.00, 0.30, 0.20],
            ],
            initial_regime: 0,
        }
    }
}

impl Default for RegimeSwitchingParams {
    fn default() -> Self {
        Self::four_state()
    }
}
