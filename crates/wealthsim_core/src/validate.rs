//! Parameter validation and normalization.
//!
//! Every constraint is checked in a single pass and every violation is
//! reported at once, so the caller can surface a complete error list.
//! Normalization (weight rescaling, risk-tier resolution) happens here;
//! no simulation computation does.

use crate::error::{ValidationError, ValidationIssue};
use crate::model::{
    AssetUniverse, MAX_PATHS, MIN_PATHS, ReturnOverlay, SimulationParameters,
};

/// Tolerance for a weight/probability vector to be considered normalized.
const SUM_EPSILON: f64 = 1e-6;

/// Parameters that passed validation, with the allocation resolved and
/// rescaled to sum to 1.
#[derive(Debug, Clone)]
pub struct ValidatedParameters {
    pub params: SimulationParameters,
    pub allocation: Vec<f64>,
}

impl ValidatedParameters {
    #[must_use]
    pub fn periods(&self) -> usize {
        self.params.periods()
    }

    #[must_use]
    pub fn years_to_retirement(&self) -> usize {
        self.params.years_to_retirement()
    }
}

/// Validate `params` against `universe`, returning either a normalized copy
/// or the full list of violations.
pub fn validate(
    params: &SimulationParameters,
    universe: &AssetUniverse,
) -> Result<ValidatedParameters, ValidationError> {
    let mut issues = Vec::new();

    check_ages(params, &mut issues);
    check_amounts(params, &mut issues);
    check_path_count(params, &mut issues);
    check_universe(universe, &mut issues);
    for overlay in &params.overlays {
        check_overlay(overlay, &mut issues);
    }
    let allocation = resolve_allocation(params, universe, &mut issues);

    if issues.is_empty() {
        let mut params = params.clone();
        params.allocation = Some(allocation.clone());
        Ok(ValidatedParameters { params, allocation })
    } else {
        Err(ValidationError::new(issues))
    }
}

fn check_ages(params: &SimulationParameters, issues: &mut Vec<ValidationIssue>) {
    if params.current_age == 0 {
        issues.push(ValidationIssue::CurrentAgeZero);
    }
    if params.retirement_age <= params.current_age {
        issues.push(ValidationIssue::RetirementNotAfterCurrentAge {
            current_age: params.current_age,
            retirement_age: params.retirement_age,
        });
    }
    if params.life_expectancy <= params.retirement_age {
        issues.push(ValidationIssue::LifeExpectancyNotAfterRetirement {
            retirement_age: params.retirement_age,
            life_expectancy: params.life_expectancy,
        });
    }
}

fn check_amounts(params: &SimulationParameters, issues: &mut Vec<ValidationIssue>) {
    let non_negative = |v: f64| v.is_finite() && v >= 0.0;

    if !non_negative(params.current_portfolio_value) {
        issues.push(ValidationIssue::PortfolioValueInvalid(
            params.current_portfolio_value,
        ));
    }
    if !non_negative(params.annual_contribution) {
        issues.push(ValidationIssue::ContributionInvalid(
            params.annual_contribution,
        ));
    }
    if !params.contribution_growth_rate.is_finite() || params.contribution_growth_rate <= -1.0 {
        issues.push(ValidationIssue::ContributionGrowthInvalid(
            params.contribution_growth_rate,
        ));
    }
    if !params.target_replacement_ratio.is_finite()
        || !(0.0..=2.0).contains(&params.target_replacement_ratio)
    {
        issues.push(ValidationIssue::ReplacementRatioOutOfRange(
            params.target_replacement_ratio,
        ));
    }
    if !non_negative(params.current_annual_income) {
        issues.push(ValidationIssue::IncomeInvalid(params.current_annual_income));
    }
    if !params.inflation_rate.is_finite() || params.inflation_rate <= -1.0 {
        issues.push(ValidationIssue::InflationRateInvalid(params.inflation_rate));
    }
    if !params.risk_free_rate.is_finite() {
        issues.push(ValidationIssue::RiskFreeRateInvalid(params.risk_free_rate));
    }
    if let Some(target) = params.target_terminal_value
        && !non_negative(target)
    {
        issues.push(ValidationIssue::PortfolioValueInvalid(target));
    }
}

fn check_path_count(params: &SimulationParameters, issues: &mut Vec<ValidationIssue>) {
    if !(MIN_PATHS..=MAX_PATHS).contains(&params.n_simulations) {
        issues.push(ValidationIssue::PathCountOutOfRange {
            requested: params.n_simulations,
            min: MIN_PATHS,
            max: MAX_PATHS,
        });
    }
}

fn check_universe(universe: &AssetUniverse, issues: &mut Vec<ValidationIssue>) {
    let n = universe.len();

    for (index, asset) in universe.assets.iter().enumerate() {
        if !asset.expected_return.is_finite()
            || !asset.volatility.is_finite()
            || asset.volatility < 0.0
        {
            issues.push(ValidationIssue::AssetProfileInvalid { index });
        }
    }

    let matrix = &universe.correlations;
    if matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
        issues.push(ValidationIssue::CorrelationShapeMismatch {
            assets: n,
            rows: matrix.len(),
        });
        // Element-wise checks need a square matrix.
        return;
    }

    for i in 0..n {
        let diag = matrix[i][i];
        if !diag.is_finite() || (diag - 1.0).abs() > SUM_EPSILON {
            issues.push(ValidationIssue::CorrelationDiagonalNotUnit {
                index: i,
                value: diag,
            });
        }
        for j in (i + 1)..n {
            let v = matrix[i][j];
            if !v.is_finite() || !(-1.0..=1.0).contains(&v) {
                issues.push(ValidationIssue::CorrelationEntryOutOfRange {
                    row: i,
                    col: j,
                    value: v,
                });
            }
            if (matrix[i][j] - matrix[j][i]).abs() > 1e-9 {
                issues.push(ValidationIssue::CorrelationNotSymmetric { row: i, col: j });
            }
        }
    }
    // Positive semi-definiteness is not an input error: a slightly
    // indefinite matrix is projected to the nearest PSD matrix before the
    // Cholesky step (see `correlation::factor_correlation`).
}

fn check_overlay(overlay: &ReturnOverlay, issues: &mut Vec<ValidationIssue>) {
    match overlay {
        ReturnOverlay::None => {}
        ReturnOverlay::JumpDiffusion(jump) => {
            if !jump.annual_intensity.is_finite() || !(0.0..=10.0).contains(&jump.annual_intensity)
            {
                issues.push(ValidationIssue::JumpIntensityOutOfRange(
                    jump.annual_intensity,
                ));
            }
            if !jump.log_size_std_dev.is_finite() || jump.log_size_std_dev < 0.0 {
                issues.push(ValidationIssue::JumpSizeStdDevInvalid(jump.log_size_std_dev));
            }
        }
        ReturnOverlay::RegimeSwitching(regimes) => {
            let n = regimes.regimes.len();
            if n == 0 {
                issues.push(ValidationIssue::RegimeSetEmpty);
                return;
            }
            for (regime, profile) in regimes.regimes.iter().enumerate() {
                if !profile.mean_multiplier.is_finite()
                    || !profile.volatility_multiplier.is_finite()
                    || profile.volatility_multiplier < 0.0
                {
                    issues.push(ValidationIssue::RegimeMultiplierInvalid { regime });
                }
            }
            if regimes.transition.len() != n
                || regimes.transition.iter().any(|row| row.len() != n)
            {
                issues.push(ValidationIssue::RegimeTransitionShapeMismatch {
                    regimes: n,
                    rows: regimes.transition.len(),
                });
            } else {
                for (regime, row) in regimes.transition.iter().enumerate() {
                    let sum: f64 = row.iter().sum();
                    let well_formed = row.iter().all(|p| p.is_finite() && (0.0..=1.0).contains(p));
                    if !well_formed || (sum - 1.0).abs() > SUM_EPSILON {
                        issues.push(ValidationIssue::RegimeTransitionRowNotStochastic {
                            regime,
                            sum,
                        });
                    }
                }
            }
            if regimes.initial_regime >= n {
                issues.push(ValidationIssue::InitialRegimeOutOfRange {
                    initial: regimes.initial_regime,
                    regimes: n,
                });
            }
        }
    }
}

/// Resolve the target allocation: explicit weights rescaled to sum to 1, or
/// the risk-tier default when none are supplied.
fn resolve_allocation(
    params: &SimulationParameters,
    universe: &AssetUniverse,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<f64> {
    let n = universe.len();

    let weights = match &params.allocation {
        Some(weights) => {
            if weights.len() != n {
                issues.push(ValidationIssue::AllocationLengthMismatch {
                    expected: n,
                    actual: weights.len(),
                });
                return vec![0.0; n];
            }
            weights.clone()
        }
        None => match params.risk_tolerance.default_allocation(n) {
            Some(weights) => weights,
            None => {
                // No preset exists for this universe size; an explicit
                // allocation is required.
                issues.push(ValidationIssue::AllocationLengthMismatch {
                    expected: n,
                    actual: 0,
                });
                return vec![0.0; n];
            }
        },
    };

    for (index, &weight) in weights.iter().enumerate() {
        if !weight.is_finite() || weight < 0.0 {
            issues.push(ValidationIssue::AllocationWeightInvalid { index, weight });
            return vec![0.0; n];
        }
    }

    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        issues.push(ValidationIssue::AllocationSumNotPositive(sum));
        return vec![0.0; n];
    }

    if (sum - 1.0).abs() > SUM_EPSILON {
        weights.iter().map(|w| w / sum).collect()
    } else {
        weights
    }
}
