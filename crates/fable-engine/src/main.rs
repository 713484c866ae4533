//! Engine binary for the Fable simulation.
//!
//! Loads a world from YAML, wires the scripted collaborators, and runs the
//! simulation for the configured number of steps.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Resolve options from the command line and environment
//! 3. Load and validate configuration
//! 4. Build the World Model and place the entities
//! 5. Create the keyword interpreter and the scripted intent and director
//!    sources
//! 6. Run the simulation loop
//! 7. Log the result and optionally export the event log
//!
//! # Usage
//!
//! ```text
//! fable-engine [CONFIG] [--events-out PATH]
//! ```
//!
//! `CONFIG` falls back to `FABLE_CONFIG`, then `fable-config.yaml`.
//! `--events-out` falls back to `FABLE_EVENTS_OUT`. `RUST_LOG` controls the
//! log filter and `FABLE_LOG_FORMAT=json` switches to JSON log lines.

mod error;
mod export;
mod narration;

use std::path::PathBuf;

use fable_core::config::SimulationConfig;
use fable_core::director::ScriptedDirector;
use fable_core::entity::ScriptedIntents;
use fable_core::interpreter::KeywordInterpreter;
use fable_core::retry::ThreadSleeper;
use fable_core::runner::{self, StopFlag};
use fable_core::step::{Collaborators, Simulation};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::narration::NarrationCallback;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "fable-config.yaml";

/// Where the engine reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    config_path: PathBuf,
    events_out: Option<PathBuf>,
}

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, setup, or the event export fails.
fn main() -> anyhow::Result<()> {
    // 1. Initialize structured logging.
    init_tracing();
    info!("fable-engine starting");

    // 2. Resolve options.
    let options = parse_options(std::env::args().skip(1), |key| std::env::var(key).ok())?;

    // 3. Load configuration.
    let config = load_config(&options)?;
    info!(
        world_name = %config.world.name,
        seed = config.world.seed,
        max_steps = config.world.max_steps,
        locations = config.locations.len(),
        entities = config.entities.len(),
        "Configuration loaded"
    );

    // 4. Build the world.
    let mut simulation = Simulation::from_config(&config).map_err(EngineError::from)?;

    // 5. Collaborators.
    let mut interpreter = KeywordInterpreter::new().map_err(EngineError::from)?;
    let mut intents = ScriptedIntents::from_config(&config.entities);
    let mut director = ScriptedDirector::new(config.director.directives.clone());
    let mut collaborators = Collaborators {
        intents: &mut intents,
        interpreter: &mut interpreter,
        director: &mut director,
        sleeper: &ThreadSleeper,
    };

    // 6. Run the simulation.
    let mut callback = NarrationCallback::new();
    let result = runner::run_simulation(
        &mut simulation,
        &mut collaborators,
        config.world.max_steps,
        &StopFlag::new(),
        &mut callback,
    );

    // 7. Log results and export.
    runner::log_simulation_end(&result, &simulation);
    if let Some(path) = &options.events_out {
        export::export_to_file(path, simulation.world().events().iter())?;
    }

    info!(
        end_reason = ?result.end_reason,
        total_steps = result.total_steps,
        narrated = callback.narrated(),
        "fable-engine shutdown complete"
    );
    Ok(())
}

/// Install the tracing subscriber.
///
/// The filter comes from `RUST_LOG` (default `info`). Setting
/// `FABLE_LOG_FORMAT=json` emits one JSON object per log line.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("FABLE_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Resolve options from command-line arguments, then the environment.
fn parse_options(
    args: impl IntoIterator<Item = String>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Options, EngineError> {
    let mut config_path: Option<PathBuf> = None;
    let mut events_out: Option<PathBuf> = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--events-out" {
            let Some(path) = args.next() else {
                return Err(EngineError::Usage {
                    message: "--events-out needs a path".to_owned(),
                });
            };
            events_out = Some(PathBuf::from(path));
        } else if let Some(path) = arg.strip_prefix("--events-out=") {
            events_out = Some(PathBuf::from(path));
        } else if arg.starts_with("--") {
            return Err(EngineError::Usage {
                message: format!("unknown option {arg}"),
            });
        } else if config_path.is_none() {
            config_path = Some(PathBuf::from(arg));
        } else {
            return Err(EngineError::Usage {
                message: format!("unexpected argument {arg}"),
            });
        }
    }

    Ok(Options {
        config_path: config_path
            .or_else(|| env("FABLE_CONFIG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
        events_out: events_out.or_else(|| env("FABLE_EVENTS_OUT").map(PathBuf::from)),
    })
}

/// Load the simulation configuration named by `options`.
fn load_config(options: &Options) -> Result<SimulationConfig, EngineError> {
    info!(path = %options.config_path.display(), "Loading configuration");
    let config = SimulationConfig::from_file(&options.config_path)?;
    Ok(config)
}
