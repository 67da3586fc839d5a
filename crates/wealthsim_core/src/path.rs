//! Single-path portfolio simulation.
//!
//! Each path is a pure function of (validated parameters, return model,
//! path index): no state is shared between paths, so any partitioning of
//! path indices across threads reproduces the same ensemble.

use crate::returns::AssetReturnModel;
use crate::validate::ValidatedParameters;

/// One simulated trajectory of portfolio value over the horizon.
#[derive(Debug, Clone)]
pub struct SimulationPath {
    /// Portfolio value at each period boundary; index 0 is the start.
    pub values: Vec<f64>,
    /// Period at which the portfolio hit zero, if it did.
    pub depleted_at: Option<usize>,
}

impl SimulationPath {
    #[must_use]
    pub fn terminal(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.depleted_at.is_some()
    }

    /// Whether every recorded value is finite. Non-finite paths are
    /// discarded by the runner rather than aggregated.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

/// Advance one household through the full horizon.
///
/// Per period, in order: apply asset returns, add the (grown) contribution
/// while working, rebalance toward target weights when due, withdraw the
/// inflation-adjusted income replacement once retired. A portfolio that
/// reaches zero is pinned there for all remaining periods.
#[must_use]
pub fn simulate_path(
    validated: &ValidatedParameters,
    model: &AssetReturnModel,
    path_index: u64,
) -> SimulationPath {
    let params = &validated.params;
    let weights = &validated.allocation;
    let periods = validated.periods();
    let years_working = validated.years_to_retirement();
    let n_assets = model.n_assets();

    let mut stream = model.stream(path_index);
    let mut returns = vec![0.0; n_assets];

    // Holdings in dollars per asset class, opened at target weights.
    let mut holdings: Vec<f64> = weights
        .iter()
        .map(|w| params.current_portfolio_value * w)
        .collect();

    let mut values = Vec::with_capacity(periods + 1);
    values.push(params.current_portfolio_value);
    let mut depleted_at = None;

    let annual_withdrawal = params.target_replacement_ratio * params.current_annual_income;

    for period in 0..periods {
        if depleted_at.is_some() {
            values.push(0.0);
            continue;
        }

        stream.next_period(&mut returns);
        for (holding, r) in holdings.iter_mut().zip(&returns) {
            *holding *= 1.0 + r;
        }

        if period < years_working {
            // Contributions buy in at target weights.
            let contribution =
                params.annual_contribution * (1.0 + params.contribution_growth_rate).powi(period as i32);
            for (holding, w) in holdings.iter_mut().zip(weights) {
                *holding += contribution * w;
            }
        }

        if params.rebalance_frequency.due(period) {
            let total: f64 = holdings.iter().sum();
            for (holding, w) in holdings.iter_mut().zip(weights) {
                *holding = total * w;
            }
        }

        if period >= years_working && annual_withdrawal > 0.0 {
            let withdrawal =
                annual_withdrawal * (1.0 + params.inflation_rate).powi(period as i32);
            let total: f64 = holdings.iter().sum();
            if total <= withdrawal {
                holdings.iter_mut().for_each(|h| *h = 0.0);
            } else {
                let scale = (total - withdrawal) / total;
                for holding in &mut holdings {
                    *holding *= scale;
                }
            }
        }

        // Absorbing state: a portfolio that reaches zero stays at exactly
        // zero and never recovers.
        let total: f64 = holdings.iter().sum();
        if total <= 0.0 {
            depleted_at = Some(period);
            values.push(0.0);
        } else {
            values.push(total);
        }
    }

    SimulationPath {
        values,
        depleted_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AssetClassProfile, AssetUniverse, RebalanceFrequency, SimulationParameters,
    };
    use crate::returns::AssetReturnModel;
    use crate::validate::validate;

    /// Universe with zero volatility and zero return: values only move
    /// through contributions and withdrawals.
    fn still_universe() -> AssetUniverse {
        AssetUniverse {
            assets: vec![
                AssetClassProfile::new("a", 0.0, 0.0),
                AssetClassProfile::new("b", 0.0, 0.0),
            ],
            correlations: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        }
    }

    fn run_one(params: SimulationParameters, universe: &AssetUniverse) -> SimulationPath {
        let validated = validate(&params, universe).unwrap();
        let model = AssetReturnModel::new(&validated, universe, 42);
        simulate_path(&validated, &model, 0)
    }

    #[test]
    fn null_scenario_holds_value_constant() {
        let universe = still_universe();
        let params = SimulationParameters {
            current_portfolio_value: 50_000.0,
            annual_contribution: 0.0,
            target_replacement_ratio: 0.0,
            allocation: Some(vec![0.5, 0.5]),
            ..Default::default()
        };
        let path = run_one(params, &universe);
        for v in &path.values {
            assert!((v - 50_000.0).abs() < 1e-9);
        }
        assert!(!path.is_depleted());
    }

    #[test]
    fn contributions_stop_at_retirement() {
        let universe = still_universe();
        let params = SimulationParameters {
            current_age: 60,
            retirement_age: 63,
            life_expectancy: 70,
            current_portfolio_value: 0.0,
            annual_contribution: 10_000.0,
            contribution_growth_rate: 0.0,
            target_replacement_ratio: 0.0,
            allocation: Some(vec![1.0, 0.0]),
            ..Default::default()
        };
        let path = run_one(params, &universe);
        // Three working years of flat contributions, then nothing.
        assert!((path.values[3] - 30_000.0).abs() < 1e-9);
        assert!((path.terminal() - 30_000.0).abs() < 1e-9);
    }

    #[test]
    fn depletion_is_absorbing_and_exactly_zero() {
        let universe = still_universe();
        let params = SimulationParameters {
            current_age: 64,
            retirement_age: 65,
            life_expectancy: 85,
            current_portfolio_value: 100_000.0,
            annual_contribution: 0.0,
            target_replacement_ratio: 0.5,
            current_annual_income: 80_000.0,
            inflation_rate: 0.0,
            allocation: Some(vec![0.5, 0.5]),
            ..Default::default()
        };
        let path = run_one(params, &universe);
        // 40k/yr from 100k depletes in the third retirement year.
        let at = path.depleted_at.expect("path should deplete");
        for v in &path.values[at + 1..] {
            assert_eq!(*v, 0.0);
        }
        assert_eq!(path.terminal(), 0.0);
    }

    #[test]
    fn rebalancing_restores_target_weights() {
        let universe = AssetUniverse {
            assets: vec![
                AssetClassProfile::new("growing", 0.10, 0.0),
                AssetClassProfile::new("flat", 0.0, 0.0),
            ],
            correlations: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        };
        let params = SimulationParameters {
            current_portfolio_value: 10_000.0,
            annual_contribution: 0.0,
            target_replacement_ratio: 0.0,
            allocation: Some(vec![0.5, 0.5]),
            rebalance_frequency: RebalanceFrequency::Annually,
            ..Default::default()
        };
        let validated = validate(&params, &universe).unwrap();
        let model = AssetReturnModel::new(&validated, &universe, 1);
        let path = simulate_path(&validated, &model, 0);

        // With annual rebalancing the blended growth rate is exactly half
        // the growing asset's return each year.
        let expected = 10_000.0 * 1.05f64.powi(path.values.len() as i32 - 1);
        assert!((path.terminal() - expected).abs() < 1e-6);
    }
}
