//! Scenario comparison types.
//!
//! A scenario is a named set of typed parameter deltas relative to a
//! baseline. The recommendation prose attached to a scenario is produced by
//! an external narrative collaborator from the numeric deltas; this core
//! only computes the numbers.

use serde::{Deserialize, Serialize};

use crate::model::params::SimulationParameters;
use crate::model::results::SimulationResult;

/// One typed change applied to the baseline parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ParameterDelta {
    /// Add to the annual contribution (dollars per year; negative to cut).
    AnnualContribution { amount: f64 },
    /// Shift the retirement age by whole years (positive retires later).
    RetirementAgeShift { years: i16 },
    /// Add to the target replacement ratio.
    ReplacementRatio { amount: f64 },
    /// Add a lump sum to the starting portfolio.
    InitialPortfolio { amount: f64 },
    /// Replace the target allocation weights outright.
    Allocation { weights: Vec<f64> },
}

impl ParameterDelta {
    /// Apply this change in place. Out-of-order ages or malformed weights
    /// are caught by re-validation, not here.
    pub fn apply(&self, params: &mut SimulationParameters) {
        match self {
            ParameterDelta::AnnualContribution { amount } => {
                params.annual_contribution += amount;
            }
            ParameterDelta::RetirementAgeShift { years } => {
                let shifted = i16::from(params.retirement_age) + years;
                params.retirement_age = shifted.clamp(0, i16::from(u8::MAX)) as u8;
            }
            ParameterDelta::ReplacementRatio { amount } => {
                params.target_replacement_ratio += amount;
            }
            ParameterDelta::InitialPortfolio { amount } => {
                params.current_portfolio_value += amount;
            }
            ParameterDelta::Allocation { weights } => {
                params.allocation = Some(weights.clone());
            }
        }
    }
}

/// A named what-if relative to the baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    pub deltas: Vec<ParameterDelta>,
}

impl ScenarioSpec {
    #[must_use]
    pub fn new(name: &str, deltas: Vec<ParameterDelta>) -> Self {
        Self {
            name: name.to_string(),
            deltas,
        }
    }

    /// Baseline parameters with this scenario's deltas applied.
    #[must_use]
    pub fn apply_to(&self, baseline: &SimulationParameters) -> SimulationParameters {
        let mut params = baseline.clone();
        for delta in &self.deltas {
            delta.apply(&mut params);
        }
        params
    }
}

/// One scenario's outcome and its differences against the baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub result: SimulationResult,
    pub success_delta: f64,
    pub depletion_delta: f64,
    pub median_terminal_delta: f64,
    pub sharpe_delta: f64,
}

/// Baseline plus scenario outcomes, ranked by improvement magnitude
/// (success-probability delta first, median terminal delta as tie-break).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub baseline: SimulationResult,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl ScenarioComparison {
    /// Look up an outcome by scenario name.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&ScenarioOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// The highest-ranked scenario, if any were compared.
    #[must_use]
    pub fn best(&self) -> Option<&ScenarioOutcome> {
        self.outcomes.first()
    }
}
