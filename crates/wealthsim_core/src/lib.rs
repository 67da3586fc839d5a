//! Monte Carlo portfolio simulation engine
//!
//! This crate turns a household's financial parameters into a probability
//! distribution of future outcomes. It supports:
//! - Correlated multi-asset return generation (Cholesky over a repaired
//!   correlation matrix)
//! - Jump-diffusion and Markov regime-switching overlays
//! - Year-by-year path simulation with contributions, rebalancing,
//!   inflation-adjusted withdrawals, and an absorbing depletion state
//! - Percentile/risk reduction of the path ensemble
//! - Scenario comparison under common random numbers
//! - A background job interface with progress, cancellation, and a
//!   wall-clock budget
//!
//! # Quick start
//!
//! ```ignore
//! use wealthsim_core::model::{AssetUniverse, SimulationParameters};
//! use wealthsim_core::simulation::{RunConfig, run_simulation};
//!
//! let params = SimulationParameters {
//!     current_age: 35,
//!     retirement_age: 65,
//!     life_expectancy: 90,
//!     n_simulations: 10_000,
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//! let result = run_simulation(&params, &AssetUniverse::balanced_us(), &RunConfig::default())?;
//! println!("success probability: {:.1}%", result.success_probability * 100.0);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod correlation;
pub mod error;
pub mod export;
pub mod job;
pub mod path;
pub mod returns;
pub mod scenario;
pub mod simulation;
pub mod stats;
pub mod validate;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use error::{SimulationError, ValidationError, ValidationIssue};
pub use job::{Job, JobState, spawn_comparison, spawn_simulation};
pub use model::{AssetUniverse, ScenarioSpec, SimulationParameters, SimulationResult};
pub use scenario::compare_scenarios;
pub use simulation::{RunConfig, run_simulation};
