//! Headless engine binary for the Wasteflow simulation.
//!
//! Loads configuration, builds the world, and runs the tick loop until the
//! tick limit is reached or Ctrl-C is pressed. Progress is logged through
//! `tracing`; the final report is printed to stdout as a single JSON
//! document.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (first CLI argument, else `wasteflow-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Apply environment overrides and validate
//! 4. Build the world
//! 5. Create run control and install the Ctrl-C handler
//! 6. Run the simulation loop
//! 7. Log the result and print the report

mod error;
mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wasteflow_core::config::{LogFormat, LoggingConfig};
use wasteflow_core::control::RunControl;
use wasteflow_core::runner::{self, PeriodicReport};
use wasteflow_core::{SimulationConfig, World};

use crate::error::EngineError;
use crate::report::RunReport;

/// Config file looked up in the working directory when no path is given.
const DEFAULT_CONFIG_PATH: &str = "wasteflow-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the world cannot be
/// built, or the report cannot be serialized.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Overrides wait until logging is up.
    let (mut config, source) = load_config(std::env::args().nth(1).map(PathBuf::from))?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(config = %source, "wasteflow-engine starting");

    // 3. Environment overrides and validation.
    config.apply_env_overrides();
    config.validate().map_err(EngineError::from)?;
    info!(
        width = config.world.width,
        height = config.world.height,
        topology = ?config.world.topology,
        seed = config.world.seed,
        buildings = config.population.buildings,
        trucks = config.population.trucks,
        max_ticks = config.simulation.max_ticks,
        "Configuration loaded"
    );

    // 4. Build the world.
    let mut world = World::new(&config).map_err(EngineError::from)?;

    // 5. Run control and Ctrl-C.
    let control = Arc::new(RunControl::new(&config.simulation));
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping after the current tick");
                    control.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            }
        });
    }

    // 6. Run the simulation.
    let mut callback = PeriodicReport::new(config.simulation.report_every);
    let result = runner::run_simulation(&mut world, &control, &mut callback).await;

    // 7. Log and print the result.
    runner::log_simulation_end(&result, &control);
    let report = RunReport::new(&config, &world, &result, control.started_at());
    let json = serde_json::to_string_pretty(&report).map_err(EngineError::from)?;
    println!("{json}");

    info!(
        run_id = %report.run_id,
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "wasteflow-engine shutdown complete"
    );

    Ok(())
}

/// Read the config file without consulting the environment.
///
/// An explicit path must exist. The default path falls back to built-in
/// defaults when absent. Returns the config and a description of where it
/// came from.
fn load_config(explicit: Option<PathBuf>) -> Result<(SimulationConfig, String), EngineError> {
    let path = match explicit {
        Some(path) if !path.exists() => return Err(EngineError::ConfigNotFound { path }),
        Some(path) => path,
        None => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if !path.exists() {
                return Ok((SimulationConfig::default(), "defaults".to_owned()));
            }
            path.to_path_buf()
        }
    };
    let contents =
        std::fs::read_to_string(&path).map_err(wasteflow_core::ConfigurationError::from)?;
    let config = SimulationConfig::parse_yaml(&contents)?;
    Ok((config, path.display().to_string()))
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    match logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_explicit_config_is_an_error() {
        let result = load_config(Some(PathBuf::from("does/not/exist.yaml")));
        assert!(matches!(result, Err(EngineError::ConfigNotFound { .. })));
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../wasteflow-config.yaml");
        let (config, source) = load_config(Some(path)).unwrap();
        assert!(source.ends_with("wasteflow-config.yaml"));
        assert_eq!(config, SimulationConfig::default());
    }
}
