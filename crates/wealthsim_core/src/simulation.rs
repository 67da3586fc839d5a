//! Simulation pipeline orchestration.
//!
//! Path indices are partitioned into fixed-size batches and mapped over a
//! worker pool (rayon when the `parallel` feature is on, sequential
//! otherwise); per-path RNG substreams keep the numbers identical either
//! way. Cancellation and the wall-clock budget are checked at batch
//! boundaries only, keeping per-path overhead negligible.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::error::SimulationError;
use crate::model::{AssetUniverse, SimulationParameters, SimulationResult};
use crate::path::{SimulationPath, simulate_path};
use crate::returns::AssetReturnModel;
use crate::stats::aggregate;
use crate::validate::{ValidatedParameters, validate};

/// Execution knobs for one run. Separate from the household parameters:
/// these belong to the caller's environment, not the plan.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Paths per batch; cancellation and the deadline are checked between
    /// batches.
    pub batch_size: usize,
    /// Upper bound on the estimated ensemble footprint.
    pub memory_limit_bytes: u64,
    /// Wall-clock budget; `None` runs unbounded.
    pub time_budget: Option<Duration>,
    /// Highest tolerated fraction of discarded (non-finite) paths before
    /// the run fails outright.
    pub max_discard_rate: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            batch_size: 2_048,
            memory_limit_bytes: 2 * 1024 * 1024 * 1024,
            time_budget: None,
            max_discard_rate: 0.01,
        }
    }
}

/// Estimated resident footprint of the full ensemble plus sort scratch.
fn estimated_footprint_bytes(n_paths: usize, periods: usize) -> u64 {
    let per_path = (periods + 1) * size_of::<f64>() + size_of::<SimulationPath>();
    // Aggregation re-sorts one column of the ensemble at a time.
    (n_paths as u64) * (per_path as u64) + (n_paths * size_of::<f64>()) as u64
}

/// Validate and run one simulation request.
pub fn run_simulation(
    params: &SimulationParameters,
    universe: &AssetUniverse,
    config: &RunConfig,
) -> Result<SimulationResult, SimulationError> {
    let validated = validate(params, universe)?;
    run_validated(&validated, universe, config, None, None)
}

/// Run an already-validated request. `cancel` and `progress` are the job
/// layer's hooks; both are optional for direct synchronous callers.
pub(crate) fn run_validated(
    validated: &ValidatedParameters,
    universe: &AssetUniverse,
    config: &RunConfig,
    cancel: Option<&AtomicBool>,
    progress: Option<&AtomicUsize>,
) -> Result<SimulationResult, SimulationError> {
    let n_paths = validated.params.n_simulations;
    let periods = validated.periods();

    let estimated = estimated_footprint_bytes(n_paths, periods);
    if estimated > config.memory_limit_bytes {
        return Err(SimulationError::ResourceLimit {
            estimated_bytes: estimated,
            limit_bytes: config.memory_limit_bytes,
        });
    }

    let seed = validated.params.random_seed.unwrap_or_else(rand::random);
    let model = AssetReturnModel::new(validated, universe, seed);

    let started = Instant::now();
    let deadline = config.time_budget.map(|budget| started + budget);
    let batch_size = config.batch_size.max(1) as u64;

    let batches: Vec<(u64, u64)> = (0..n_paths as u64)
        .step_by(config.batch_size.max(1))
        .map(|start| (start, (start + batch_size).min(n_paths as u64)))
        .collect();

    let timed_out = AtomicBool::new(false);
    let was_cancelled = AtomicBool::new(false);

    let simulate_batch = |&(start, end): &(u64, u64)| -> Vec<SimulationPath> {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            was_cancelled.store(true, Ordering::Relaxed);
            return Vec::new();
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            timed_out.store(true, Ordering::Relaxed);
            return Vec::new();
        }

        let paths: Vec<SimulationPath> = (start..end)
            .map(|index| simulate_path(validated, &model, index))
            .collect();
        if let Some(counter) = progress {
            counter.fetch_add((end - start) as usize, Ordering::Relaxed);
        }
        paths
    };

    #[cfg(feature = "parallel")]
    let batch_results: Vec<Vec<SimulationPath>> =
        batches.par_iter().map(simulate_batch).collect();

    #[cfg(not(feature = "parallel"))]
    let batch_results: Vec<Vec<SimulationPath>> = batches.iter().map(simulate_batch).collect();

    if was_cancelled.load(Ordering::Relaxed) {
        return Err(SimulationError::Cancelled);
    }
    if timed_out.load(Ordering::Relaxed) {
        // A truncated ensemble is statistically invalid; drop everything.
        return Err(SimulationError::Timeout {
            budget: config.time_budget.unwrap_or_default(),
        });
    }

    let mut discarded = 0usize;
    let mut paths: Vec<SimulationPath> = Vec::with_capacity(n_paths);
    for batch in batch_results {
        for path in batch {
            if path.is_finite() {
                paths.push(path);
            } else {
                discarded += 1;
            }
        }
    }

    if discarded > 0 {
        tracing::warn!(discarded, total = n_paths, "discarded non-finite paths");
    }
    if (discarded as f64) > config.max_discard_rate * n_paths as f64 {
        return Err(SimulationError::NumericalInstability {
            discarded,
            total: n_paths,
        });
    }

    let result = aggregate(validated, &paths, discarded);
    tracing::info!(
        paths = result.paths_used,
        periods,
        elapsed_ms = started.elapsed().as_millis() as u64,
        success = result.success_probability,
        "simulation run complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footprint_scales_with_paths_and_periods() {
        let small = estimated_footprint_bytes(1_000, 30);
        let more_paths = estimated_footprint_bytes(10_000, 30);
        let more_periods = estimated_footprint_bytes(1_000, 60);
        assert!(more_paths > small);
        assert!(more_periods > small);
    }

    #[test]
    fn oversized_request_fails_fast() {
        let params = SimulationParameters {
            n_simulations: 100_000,
            ..Default::default()
        };
        let config = RunConfig {
            memory_limit_bytes: 1024,
            ..Default::default()
        };
        let err = run_simulation(&params, &AssetUniverse::balanced_us(), &config).unwrap_err();
        assert!(matches!(err, SimulationError::ResourceLimit { .. }));
    }

    #[test]
    fn zero_time_budget_times_out() {
        let params = SimulationParameters {
            n_simulations: 1_000,
            random_seed: Some(1),
            ..Default::default()
        };
        let config = RunConfig {
            time_budget: Some(Duration::ZERO),
            ..Default::default()
        };
        let err = run_simulation(&params, &AssetUniverse::balanced_us(), &config).unwrap_err();
        assert!(matches!(err, SimulationError::Timeout { .. }));
    }
}
