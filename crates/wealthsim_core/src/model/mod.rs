mod assets;
mod params;
mod results;
mod scenario;

pub use assets::{AssetClassProfile, AssetUniverse};
pub use params::{
    JumpDiffusionParams, MAX_PATHS, MIN_PATHS, MarketAssumption, RebalanceFrequency,
    RegimeProfile, RegimeSwitchingParams, ReturnOverlay, RiskTolerance, SimulationParameters,
};
pub use results::{PercentileBands, RiskMetrics, SimulationResult, TerminalPercentiles};
pub use scenario::{ParameterDelta, ScenarioComparison, ScenarioOutcome, ScenarioSpec};
