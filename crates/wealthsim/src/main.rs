//! Command-line runner for the simulation engine.
//!
//! Loads household parameters (and optionally scenarios and a custom asset
//! universe) from JSON files, runs the engine through its background job
//! interface, and prints the versioned export contract as JSON.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use wealthsim_core::export::{export_comparison, export_result};
use wealthsim_core::model::{AssetUniverse, ScenarioSpec, SimulationParameters};
use wealthsim_core::simulation::RunConfig;
use wealthsim_core::{Job, spawn_comparison, spawn_simulation};

#[derive(Parser, Debug)]
#[command(name = "wealthsim")]
#[command(about = "Monte Carlo retirement portfolio simulator")]
struct Args {
    /// Log filter (overridden by RUST_LOG)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one simulation and print the exported result
    Run {
        /// Path to a SimulationParameters JSON file
        params: PathBuf,

        /// Optional custom asset universe JSON file
        #[arg(short, long)]
        universe: Option<PathBuf>,

        /// Wall-clock budget in seconds
        #[arg(short, long)]
        budget: Option<u64>,
    },
    /// Compare named scenarios against a baseline
    Compare {
        /// Path to the baseline SimulationParameters JSON file
        params: PathBuf,

        /// Path to a JSON array of scenario specs
        scenarios: PathBuf,

        /// Optional custom asset universe JSON file
        #[arg(short, long)]
        universe: Option<PathBuf>,

        /// Wall-clock budget in seconds
        #[arg(short, long)]
        budget: Option<u64>,
    },
    /// Print a parameter file template
    Template,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Run {
            params,
            universe,
            budget,
        } => run(&params, universe.as_deref(), budget),
        Command::Compare {
            params,
            scenarios,
            universe,
            budget,
        } => compare(&params, &scenarios, universe.as_deref(), budget),
        Command::Template => template(),
    }
}

fn run(params_path: &Path, universe_path: Option<&Path>, budget: Option<u64>) -> Result<()> {
    let params: SimulationParameters = load_json(params_path)?;
    let universe = load_universe(universe_path)?;

    let job = spawn_simulation(params, universe, run_config(budget));
    let result = wait_logging_progress(job)?;

    println!("{}", serde_json::to_string_pretty(&export_result(&result))?);
    Ok(())
}

fn compare(
    params_path: &Path,
    scenarios_path: &Path,
    universe_path: Option<&Path>,
    budget: Option<u64>,
) -> Result<()> {
    let params: SimulationParameters = load_json(params_path)?;
    let scenarios: Vec<ScenarioSpec> = load_json(scenarios_path)?;
    let universe = load_universe(universe_path)?;

    let job = spawn_comparison(params, universe, scenarios, run_config(budget));
    let comparison = wait_logging_progress(job)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&export_comparison(&comparison))?
    );
    Ok(())
}

fn template() -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&SimulationParameters::default())?
    );
    Ok(())
}

fn run_config(budget: Option<u64>) -> RunConfig {
    RunConfig {
        time_budget: budget.map(Duration::from_secs),
        ..Default::default()
    }
}

/// Poll the job, logging progress, until its result arrives.
fn wait_logging_progress<T: Send + 'static>(
    mut job: Job<T>,
) -> Result<T, wealthsim_core::SimulationError> {
    loop {
        if let Some(outcome) = job.try_recv() {
            return outcome;
        }
        let (done, total) = job.progress();
        tracing::debug!(done, total, "simulation in progress");
        thread::sleep(Duration::from_millis(50));
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).wrap_err_with(|| format!("failed to parse {}", path.display()))
}

fn load_universe(path: Option<&Path>) -> Result<AssetUniverse> {
    match path {
        Some(path) => load_json(path),
        None => Ok(AssetUniverse::balanced_us()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn template_round_trips_through_load() {
        let params = SimulationParameters::default();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&params).unwrap()).unwrap();

        let loaded: SimulationParameters = load_json(file.path()).unwrap();
        assert_eq!(loaded.n_simulations, params.n_simulations);
        assert_eq!(loaded.current_age, params.current_age);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_json::<SimulationParameters>(Path::new("/does/not/exist.json"))
            .unwrap_err();
        assert!(format!("{err}").contains("/does/not/exist.json"));
    }
}
