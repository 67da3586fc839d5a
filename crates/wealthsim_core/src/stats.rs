//! Ensemble statistics.
//!
//! Reduces the path ensemble to percentile series, success/depletion
//! probabilities, and risk metrics. Paths are consumed read-only and can be
//! dropped afterwards.

use crate::model::{PercentileBands, RiskMetrics, SimulationResult, TerminalPercentiles};
use crate::path::SimulationPath;
use crate::validate::ValidatedParameters;

/// Percentile of a sorted slice using linear interpolation between order
/// statistics.
///
/// The interpolation rule is fixed deliberately: nearest-rank and linear
/// disagree at small ensemble sizes, and downstream consumers depend on the
/// series being reproducible across implementations.
#[must_use]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Maximum peak-to-trough decline of one path, as a positive fraction.
#[must_use]
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = match values.first() {
        Some(v) => *v,
        None => return 0.0,
    };
    let mut worst = 0.0;

    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let drawdown = (peak - v) / peak;
            if drawdown > worst {
                worst = drawdown;
            }
        }
    }

    worst
}

/// Reduce the surviving ensemble into the immutable result.
///
/// `paths` must already have non-finite members removed; `discarded` is how
/// many were dropped.
#[must_use]
pub(crate) fn aggregate(
    validated: &ValidatedParameters,
    paths: &[SimulationPath],
    discarded: usize,
) -> SimulationResult {
    let params = &validated.params;
    let periods = validated.periods();
    let n = paths.len();

    let bands = period_bands(paths, periods);

    let mut terminals: Vec<f64> = paths.iter().map(SimulationPath::terminal).collect();
    terminals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let terminal = TerminalPercentiles {
        p10: percentile(&terminals, 0.10),
        p25: percentile(&terminals, 0.25),
        p50: percentile(&terminals, 0.50),
        p75: percentile(&terminals, 0.75),
        p90: percentile(&terminals, 0.90),
    };

    // Success and depletion are separate metrics on purpose: a plan can
    // stay solvent yet miss its terminal target, and callers need to tell
    // those apart.
    let target = params.target_terminal_value.unwrap_or(0.0);
    let successes = paths
        .iter()
        .filter(|p| !p.is_depleted() && p.terminal() > 0.0 && p.terminal() >= target)
        .count();
    let depletions = paths.iter().filter(|p| p.is_depleted()).count();

    let success_probability = ratio(successes, n);
    let depletion_probability = ratio(depletions, n);

    let risk = risk_metrics(params.current_portfolio_value, params.risk_free_rate, paths, &terminals);

    SimulationResult {
        start_age: params.current_age,
        retirement_age: params.retirement_age,
        periods,
        bands,
        terminal,
        success_probability,
        depletion_probability,
        risk,
        paths_discarded: discarded,
        paths_used: n,
    }
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn period_bands(paths: &[SimulationPath], periods: usize) -> PercentileBands {
    let boundaries = periods + 1;
    let mut bands = PercentileBands {
        p10: Vec::with_capacity(boundaries),
        p25: Vec::with_capacity(boundaries),
        p50: Vec::with_capacity(boundaries),
        p75: Vec::with_capacity(boundaries),
        p90: Vec::with_capacity(boundaries),
    };

    let mut column = Vec::with_capacity(paths.len());
    for period in 0..boundaries {
        column.clear();
        column.extend(paths.iter().filter_map(|p| p.values.get(period).copied()));
        column.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        bands.p10.push(percentile(&column, 0.10));
        bands.p25.push(percentile(&column, 0.25));
        bands.p50.push(percentile(&column, 0.50));
        bands.p75.push(percentile(&column, 0.75));
        bands.p90.push(percentile(&column, 0.90));
    }

    bands
}

fn risk_metrics(
    initial_value: f64,
    risk_free_rate: f64,
    paths: &[SimulationPath],
    sorted_terminals: &[f64],
) -> RiskMetrics {
    // Period-over-period returns pooled across the ensemble. Periods are
    // annual, so their std dev is already an annualized volatility.
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut count = 0usize;
    let mut drawdown_sum = 0.0;
    let mut drawdown_worst = 0.0;

    for path in paths {
        for pair in path.values.windows(2) {
            if pair[0] > 0.0 {
                let r = pair[1] / pair[0] - 1.0;
                sum += r;
                sum_sq += r * r;
                count += 1;
            }
        }
        let dd = max_drawdown(&path.values);
        drawdown_sum += dd;
        if dd > drawdown_worst {
            drawdown_worst = dd;
        }
    }

    let (mean_return, volatility) = if count > 1 {
        let mean = sum / count as f64;
        let variance = (sum_sq - sum * mean) / (count - 1) as f64;
        (mean, variance.max(0.0).sqrt())
    } else {
        (0.0, 0.0)
    };

    let sharpe_ratio = if volatility > 0.0 {
        (mean_return - risk_free_rate) / volatility
    } else {
        0.0
    };

    let (var_95, cvar_95) = tail_risk(initial_value, sorted_terminals);

    RiskMetrics {
        annualized_volatility: volatility,
        sharpe_ratio,
        mean_max_drawdown: if paths.is_empty() {
            0.0
        } else {
            drawdown_sum / paths.len() as f64
        },
        worst_max_drawdown: drawdown_worst,
        var_95,
        cvar_95,
    }
}

/// VaR and CVaR at 95% on the terminal distribution, as loss fractions of
/// the starting value.
fn tail_risk(initial_value: f64, sorted_terminals: &[f64]) -> (f64, f64) {
    if sorted_terminals.is_empty() || initial_value <= 0.0 {
        return (0.0, 0.0);
    }

    let cutoff = percentile(sorted_terminals, 0.05);
    let var_95 = ((initial_value - cutoff) / initial_value).max(0.0);

    let tail: Vec<f64> = sorted_terminals
        .iter()
        .copied()
        .take_while(|v| *v <= cutoff)
        .collect();
    let cvar_95 = if tail.is_empty() {
        var_95
    } else {
        let tail_mean = tail.iter().sum::<f64>() / tail.len() as f64;
        ((initial_value - tail_mean) / initial_value).max(0.0)
    };

    (var_95, cvar_95)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_linearly() {
        let sorted = vec![10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&sorted, 0.0), 10.0);
        assert_eq!(percentile(&sorted, 1.0), 40.0);
        // Rank 1.5 interpolates between 20 and 30.
        assert!((percentile(&sorted, 0.5) - 25.0).abs() < 1e-12);
        // Rank 0.3 interpolates between 10 and 20.
        assert!((percentile(&sorted, 0.1) - 13.0).abs() < 1e-12);
    }

    #[test]
    fn percentile_handles_degenerate_input() {
        assert_eq!(percentile(&[], 0.5), 0.0);
        assert_eq!(percentile(&[7.0], 0.9), 7.0);
    }

    #[test]
    fn drawdown_of_known_sequence() {
        let values = vec![100.0, 120.0, 90.0, 110.0, 85.0];
        // Worst decline is 120 -> 85.
        assert!((max_drawdown(&values) - (120.0 - 85.0) / 120.0).abs() < 1e-12);
    }

    #[test]
    fn drawdown_of_monotone_growth_is_zero() {
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn tail_risk_on_known_terminals() {
        let mut terminals: Vec<f64> = (1..=100).map(|i| i as f64 * 1_000.0).collect();
        terminals.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let (var, cvar) = tail_risk(50_000.0, &terminals);
        // 5th percentile of 1k..100k is 5950; loss fraction vs 50k.
        assert!((var - (50_000.0 - 5_950.0) / 50_000.0).abs() < 1e-9);
        assert!(cvar >= var);
    }
}
