use std::fmt;
use std::time::Duration;

/// A single constraint violation found while validating simulation input.
///
/// The validator runs every check in one pass and collects all violations,
/// so a caller can present the complete list instead of fixing fields one
/// round-trip at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    CurrentAgeZero,
    RetirementNotAfterCurrentAge {
        current_age: u8,
        retirement_age: u8,
    },
    LifeExpectancyNotAfterRetirement {
        retirement_age: u8,
        life_expectancy: u8,
    },
    PortfolioValueInvalid(f64),
    ContributionInvalid(f64),
    ContributionGrowthInvalid(f64),
    ReplacementRatioOutOfRange(f64),
    IncomeInvalid(f64),
    InflationRateInvalid(f64),
    RiskFreeRateInvalid(f64),
    /// `n_simulations` outside the supported range. A dedicated kind so
    /// callers can suggest a corrected path count.
    PathCountOutOfRange {
        requested: usize,
        min: usize,
        max: usize,
    },
    AllocationLengthMismatch {
        expected: usize,
        actual: usize,
    },
    AllocationWeightInvalid {
        index: usize,
        weight: f64,
    },
    AllocationSumNotPositive(f64),
    JumpIntensityOutOfRange(f64),
    JumpSizeStdDevInvalid(f64),
    RegimeSetEmpty,
    RegimeMultiplierInvalid {
        regime: usize,
    },
    RegimeTransitionRowNotStochastic {
        regime: usize,
        sum: f64,
    },
    RegimeTransitionShapeMismatch {
        regimes: usize,
        rows: usize,
    },
    InitialRegimeOutOfRange {
        initial: usize,
        regimes: usize,
    },
    AssetProfileInvalid {
        index: usize,
    },
    CorrelationShapeMismatch {
        assets: usize,
        rows: usize,
    },
    CorrelationNotSymmetric {
        row: usize,
        col: usize,
    },
    CorrelationDiagonalNotUnit {
        index: usize,
        value: f64,
    },
    CorrelationEntryOutOfRange {
        row: usize,
        col: usize,
        value: f64,
    },
    DuplicateScenarioName(String),
}

impl ValidationIssue {
    /// The parameter field this violation refers to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            ValidationIssue::CurrentAgeZero => "current_age",
            ValidationIssue::RetirementNotAfterCurrentAge { .. } => "retirement_age",
            ValidationIssue::LifeExpectancyNotAfterRetirement { .. } => "life_expectancy",
            ValidationIssue::PortfolioValueInvalid(_) => "current_portfolio_value",
            ValidationIssue::ContributionInvalid(_) => "annual_contribution",
            ValidationIssue::ContributionGrowthInvalid(_) => "contribution_growth_rate",
            ValidationIssue::ReplacementRatioOutOfRange(_) => "target_replacement_ratio",
            ValidationIssue::IncomeInvalid(_) => "current_annual_income",
            ValidationIssue::InflationRateInvalid(_) => "inflation_rate",
            ValidationIssue::RiskFreeRateInvalid(_) => "risk_free_rate",
            ValidationIssue::PathCountOutOfRange { .. } => "n_simulations",
            ValidationIssue::AllocationLengthMismatch { .. }
            | ValidationIssue::AllocationWeightInvalid { .. }
            | ValidationIssue::AllocationSumNotPositive(_) => "allocation",
            ValidationIssue::JumpIntensityOutOfRange(_)
            | ValidationIssue::JumpSizeStdDevInvalid(_)
            | ValidationIssue::RegimeSetEmpty
            | ValidationIssue::RegimeMultiplierInvalid { .. }
            | ValidationIssue::RegimeTransitionRowNotStochastic { .. }
            | ValidationIssue::RegimeTransitionShapeMismatch { .. }
            | ValidationIssue::InitialRegimeOutOfRange { .. } => "overlays",
            ValidationIssue::AssetProfileInvalid { .. } => "asset_classes",
            ValidationIssue::CorrelationShapeMismatch { .. }
            | ValidationIssue::CorrelationNotSymmetric { .. }
            | ValidationIssue::CorrelationDiagonalNotUnit { .. }
            | ValidationIssue::CorrelationEntryOutOfRange { .. } => "correlations",
            ValidationIssue::DuplicateScenarioName(_) => "scenarios",
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::CurrentAgeZero => write!(f, "current age must be greater than zero"),
            ValidationIssue::RetirementNotAfterCurrentAge {
                current_age,
                retirement_age,
            } => write!(
                f,
                "retirement age {retirement_age} must be after current age {current_age}"
            ),
            ValidationIssue::LifeExpectancyNotAfterRetirement {
                retirement_age,
                life_expectancy,
            } => write!(
                f,
                "life expectancy {life_expectancy} must be after retirement age {retirement_age}"
            ),
            ValidationIssue::PortfolioValueInvalid(v) => {
                write!(f, "portfolio value {v} must be finite and non-negative")
            }
            ValidationIssue::ContributionInvalid(v) => {
                write!(f, "annual contribution {v} must be finite and non-negative")
            }
            ValidationIssue::ContributionGrowthInvalid(v) => {
                write!(f, "contribution growth rate {v} must be finite and above -100%")
            }
            ValidationIssue::ReplacementRatioOutOfRange(v) => {
                write!(f, "replacement ratio {v} must be between 0 and 2")
            }
            ValidationIssue::IncomeInvalid(v) => {
                write!(f, "annual income {v} must be finite and non-negative")
            }
            ValidationIssue::InflationRateInvalid(v) => {
                write!(f, "inflation rate {v} must be finite and above -100%")
            }
            ValidationIssue::RiskFreeRateInvalid(v) => {
                write!(f, "risk-free rate {v} must be finite")
            }
            ValidationIssue::PathCountOutOfRange {
                requested,
                min,
                max,
            } => write!(
                f,
                "n_simulations {requested} outside supported range {min}..={max}"
            ),
            ValidationIssue::AllocationLengthMismatch { expected, actual } => write!(
                f,
                "allocation has {actual} weights but the universe has {expected} asset classes"
            ),
            ValidationIssue::AllocationWeightInvalid { index, weight } => {
                write!(f, "allocation weight {weight} at index {index} is invalid")
            }
            ValidationIssue::AllocationSumNotPositive(sum) => {
                write!(f, "allocation weights sum to {sum}, cannot be rescaled")
            }
            ValidationIssue::JumpIntensityOutOfRange(v) => {
                write!(f, "jump intensity {v} must be between 0 and 10 per year")
            }
            ValidationIssue::JumpSizeStdDevInvalid(v) => {
                write!(f, "jump size std dev {v} must be finite and non-negative")
            }
            ValidationIssue::RegimeSetEmpty => write!(f, "regime overlay declares no regimes"),
            ValidationIssue::RegimeMultiplierInvalid { regime } => {
                write!(f, "regime {regime} has a non-finite or negative multiplier")
            }
            ValidationIssue::RegimeTransitionRowNotStochastic { regime, sum } => write!(
                f,
                "transition probabilities for regime {regime} sum to {sum}, expected 1"
            ),
            ValidationIssue::RegimeTransitionShapeMismatch { regimes, rows } => write!(
                f,
                "transition matrix has {rows} rows for {regimes} regimes"
            ),
            ValidationIssue::InitialRegimeOutOfRange { initial, regimes } => {
                write!(f, "initial regime {initial} out of range for {regimes} regimes")
            }
            ValidationIssue::AssetProfileInvalid { index } => {
                write!(f, "asset class {index} has non-finite return or negative volatility")
            }
            ValidationIssue::CorrelationShapeMismatch { assets, rows } => {
                write!(f, "correlation matrix has {rows} rows for {assets} assets")
            }
            ValidationIssue::CorrelationNotSymmetric { row, col } => {
                write!(f, "correlation matrix is not symmetric at ({row}, {col})")
            }
            ValidationIssue::CorrelationDiagonalNotUnit { index, value } => {
                write!(f, "correlation diagonal entry {index} is {value}, expected 1")
            }
            ValidationIssue::CorrelationEntryOutOfRange { row, col, value } => {
                write!(f, "correlation {value} at ({row}, {col}) outside [-1, 1]")
            }
            ValidationIssue::DuplicateScenarioName(name) => {
                write!(f, "duplicate scenario name {name:?}")
            }
        }
    }
}

/// All violations found in one validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    #[must_use]
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Whether any issue refers to the given parameter field.
    #[must_use]
    pub fn mentions(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field() == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation issue(s):", self.issues.len())?;
        for issue in &self.issues {
            write!(f, " [{}] {issue};", issue.field())?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Failure modes of a simulation run.
///
/// The kinds are deliberately distinct: a `Timeout` or `Cancelled` run can be
/// retried with fewer paths or a larger budget, while `Validation` and
/// `NumericalInstability` require fixing the input.
#[derive(Debug, Clone)]
pub enum SimulationError {
    Validation(ValidationError),
    /// Too many paths produced NaN/Inf values. Below the threshold the
    /// offending paths are discarded and counted; above it the whole run
    /// fails rather than silently biasing the surviving ensemble.
    NumericalInstability {
        discarded: usize,
        total: usize,
    },
    /// Estimated memory footprint exceeded the configured limit.
    ResourceLimit {
        estimated_bytes: u64,
        limit_bytes: u64,
    },
    /// Wall-clock budget exceeded. No partial result is returned because
    /// statistics over a truncated, non-uniform subset of paths are invalid.
    Timeout {
        budget: Duration,
    },
    Cancelled,
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Validation(e) => write!(f, "{e}"),
            SimulationError::NumericalInstability { discarded, total } => write!(
                f,
                "numerical instability: {discarded} of {total} paths produced non-finite values"
            ),
            SimulationError::ResourceLimit {
                estimated_bytes,
                limit_bytes,
            } => write!(
                f,
                "estimated footprint {estimated_bytes} bytes exceeds limit {limit_bytes} bytes"
            ),
            SimulationError::Timeout { budget } => {
                write!(f, "simulation exceeded wall-clock budget of {budget:?}")
            }
            SimulationError::Cancelled => write!(f, "simulation cancelled"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for SimulationError {
    fn from(e: ValidationError) -> Self {
        SimulationError::Validation(e)
    }
}
