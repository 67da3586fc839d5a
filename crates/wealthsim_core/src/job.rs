//! Asynchronous job surface.
//!
//! Simulation is CPU-bound batch work and must stay off the caller's
//! request thread. A job runs on a dedicated background thread, exposes its
//! state and progress through atomics, and delivers the result over a
//! channel. Callers poll; nothing yields mid-path. Cancellation is observed
//! at batch boundaries.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::thread::{self, JoinHandle};

use crate::error::SimulationError;
use crate::model::{
    AssetUniverse, ScenarioComparison, ScenarioSpec, SimulationParameters, SimulationResult,
};
use crate::scenario::compare_with_hooks;
use crate::simulation::{RunConfig, run_validated};
use crate::validate::validate;

/// Lifecycle of a background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

const STATE_QUEUED: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_COMPLETED: u8 = 2;
const STATE_FAILED: u8 = 3;
const STATE_CANCELLED: u8 = 4;

fn decode_state(raw: u8) -> JobState {
    match raw {
        STATE_RUNNING => JobState::Running,
        STATE_COMPLETED => JobState::Completed,
        STATE_FAILED => JobState::Failed,
        STATE_CANCELLED => JobState::Cancelled,
        _ => JobState::Queued,
    }
}

/// Handle to one background run. Dropping the handle cancels the job and
/// joins the worker thread.
pub struct Job<T> {
    state: Arc<AtomicU8>,
    completed_paths: Arc<AtomicUsize>,
    total_paths: usize,
    cancel_flag: Arc<AtomicBool>,
    result_rx: Receiver<Result<T, SimulationError>>,
    thread: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Job<T> {
    fn spawn<F>(total_paths: usize, work: F) -> Self
    where
        F: FnOnce(&AtomicBool, &AtomicUsize) -> Result<T, SimulationError> + Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(STATE_QUEUED));
        let completed_paths = Arc::new(AtomicUsize::new(0));
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let (result_tx, result_rx) = channel();

        let worker_state = state.clone();
        let worker_progress = completed_paths.clone();
        let worker_cancel = cancel_flag.clone();
        let thread = thread::spawn(move || {
            worker_state.store(STATE_RUNNING, Ordering::SeqCst);
            let outcome = work(&worker_cancel, &worker_progress);
            let terminal = match &outcome {
                Ok(_) => STATE_COMPLETED,
                Err(SimulationError::Cancelled) => STATE_CANCELLED,
                Err(_) => STATE_FAILED,
            };
            worker_state.store(terminal, Ordering::SeqCst);
            let _ = result_tx.send(outcome);
        });

        Self {
            state,
            completed_paths,
            total_paths,
            cancel_flag,
            result_rx,
            thread: Some(thread),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> JobState {
        decode_state(self.state.load(Ordering::SeqCst))
    }

    /// Completed and total path counts.
    #[must_use]
    pub fn progress(&self) -> (usize, usize) {
        (
            self.completed_paths.load(Ordering::Relaxed),
            self.total_paths,
        )
    }

    /// Request cancellation; observed at the next batch boundary.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    /// Non-blocking poll for the result. The real outcome is delivered at
    /// most once; a worker that died without sending surfaces as cancelled.
    pub fn try_recv(&mut self) -> Option<Result<T, SimulationError>> {
        match self.result_rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SimulationError::Cancelled)),
        }
    }

    /// Block until the job finishes and return its result.
    pub fn wait(mut self) -> Result<T, SimulationError> {
        // A recv error means the worker panicked before sending; surface it
        // as a cancelled run rather than propagating the panic.
        let outcome = self.result_rx.recv().unwrap_or(Err(SimulationError::Cancelled));
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        outcome
    }
}

impl<T> Drop for Job<T> {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.cancel_flag.store(true, Ordering::SeqCst);
            let _ = thread.join();
        }
    }
}

/// Start one simulation run in the background.
#[must_use]
pub fn spawn_simulation(
    params: SimulationParameters,
    universe: AssetUniverse,
    config: RunConfig,
) -> Job<SimulationResult> {
    let total = params.n_simulations;
    Job::spawn(total, move |cancel, progress| {
        tracing::info!(paths = params.n_simulations, "starting simulation job");
        let validated = validate(&params, &universe)?;
        run_validated(&validated, &universe, &config, Some(cancel), Some(progress))
    })
}

/// Start a scenario comparison in the background.
///
/// Progress counts paths across the baseline and every scenario run.
#[must_use]
pub fn spawn_comparison(
    baseline: SimulationParameters,
    universe: AssetUniverse,
    scenarios: Vec<ScenarioSpec>,
    config: RunConfig,
) -> Job<ScenarioComparison> {
    let total = baseline.n_simulations * (scenarios.len() + 1);
    Job::spawn(total, move |cancel, progress| {
        tracing::info!(
            scenarios = scenarios.len(),
            "starting scenario comparison job"
        );
        compare_with_hooks(
            &baseline,
            &universe,
            &scenarios,
            &config,
            Some(cancel),
            Some(progress),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::run_simulation;
    use std::time::Duration;

    fn quick_params() -> SimulationParameters {
        SimulationParameters {
            n_simulations: 1_000,
            random_seed: Some(11),
            ..Default::default()
        }
    }

    #[test]
    fn job_runs_to_completion() {
        let job = spawn_simulation(
            quick_params(),
            AssetUniverse::balanced_us(),
            RunConfig::default(),
        );
        let result = job.wait().unwrap();
        assert_eq!(result.paths_used + result.paths_discarded, 1_000);
    }

    #[test]
    fn job_matches_synchronous_run() {
        let params = quick_params();
        let sync =
            run_simulation(&params, &AssetUniverse::balanced_us(), &RunConfig::default()).unwrap();
        let job = spawn_simulation(
            params,
            AssetUniverse::balanced_us(),
            RunConfig::default(),
        );
        let background = job.wait().unwrap();
        assert_eq!(sync.terminal.p50, background.terminal.p50);
        assert_eq!(sync.success_probability, background.success_probability);
    }

    #[test]
    fn invalid_parameters_fail_the_job() {
        let params = SimulationParameters {
            n_simulations: 5,
            ..Default::default()
        };
        let mut job = spawn_simulation(
            params,
            AssetUniverse::balanced_us(),
            RunConfig::default(),
        );
        // Wait for the worker to finish, then inspect state.
        loop {
            if let Some(outcome) = job.try_recv() {
                assert!(matches!(outcome, Err(SimulationError::Validation(_))));
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(job.state(), JobState::Failed);
    }

    #[test]
    fn cancelled_job_reports_cancelled_state() {
        let params = SimulationParameters {
            n_simulations: 100_000,
            random_seed: Some(1),
            ..Default::default()
        };
        let config = RunConfig {
            // Tiny batches so the cancel flag is observed quickly.
            batch_size: 64,
            ..Default::default()
        };
        let job = spawn_simulation(params, AssetUniverse::balanced_us(), config);
        job.cancel();
        match job.wait() {
            Err(SimulationError::Cancelled) => {}
            // The run may legitimately finish before the flag lands.
            Ok(_) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn comparison_job_completes() {
        let job = spawn_comparison(
            quick_params(),
            AssetUniverse::balanced_us(),
            vec![ScenarioSpec::new("noop", vec![])],
            RunConfig::default(),
        );
        let comparison = job.wait().unwrap();
        assert_eq!(comparison.outcomes.len(), 1);
    }
}
