//! Host binary for the Godfather game engine.
//!
//! Wires the game registry to its collaborators and keeps it running:
//! phase deadlines are enforced by the background driver, and a console on
//! stdin lets games be played locally.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `godfather.yaml` (defaults when absent)
//! 2. Initialize structured logging (tracing, to stderr)
//! 3. Build ports: console output and the optional outcome file
//! 4. Create the game registry over the standard setups
//! 5. Spawn the phase driver
//! 6. Serve the console until stdin closes or Ctrl-C
//! 7. Stop the driver and log its totals

mod console;
mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use godfather_core::config::{GodfatherConfig, LoggingConfig};
use godfather_core::driver::{DriverControl, run_driver};
use godfather_core::ports::{JsonLinesOutcomeSink, NullOutcomeSink, OutcomeSink, Ports};
use godfather_core::registry::GameRegistry;
use godfather_core::setup::StaticSetups;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::console::{Console, ConsoleSink};
use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const CONFIG_PATH: &str = "godfather.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the console or
/// signal handler fails, or the driver task dies.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        day_duration_secs = config.game.day_duration_secs,
        night_duration_secs = config.game.night_duration_secs,
        max_players = config.game.max_players,
        poll_interval_ms = config.driver.poll_interval_ms,
        "godfather-engine starting"
    );

    // 3. Build ports.
    let ports = build_ports(&config);

    // 4. Create the game registry.
    let setups = StaticSetups::standard();
    info!(setups = setups.all().len(), "setups loaded");
    let registry = Arc::new(GameRegistry::new(Arc::new(setups), ports, config.game));

    // 5. Spawn the phase driver.
    let control = Arc::new(DriverControl::new());
    let driver = tokio::spawn(run_driver(
        Arc::clone(&registry),
        Arc::clone(&control),
        Duration::from_millis(config.driver.poll_interval_ms),
    ));

    // 6. Serve the console.
    let console = Console::new(Arc::clone(&registry), StdRng::from_os_rng());
    let console = tokio::spawn(console::run(console));
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(EngineError::from)?;
            info!("Ctrl-C received, shutting down");
        }
        served = console => {
            served.map_err(EngineError::from)??;
        }
    }

    // 7. Stop the driver.
    control.request_stop();
    let summary = driver.await.map_err(EngineError::from)?;
    info!(
        ticks = summary.ticks,
        advanced = summary.advanced,
        expired = summary.expired,
        games_left = registry.len().await,
        "godfather-engine stopped"
    );
    Ok(())
}

/// Load configuration from [`CONFIG_PATH`], falling back to defaults.
fn load_config() -> Result<GodfatherConfig, EngineError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        Ok(GodfatherConfig::from_file(path)?)
    } else {
        let mut config = GodfatherConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_ports(config: &GodfatherConfig) -> Ports {
    let outcomes: Arc<dyn OutcomeSink> = match &config.persistence.outcomes_path {
        Some(path) => {
            info!(path = %path.display(), "recording match outcomes");
            Arc::new(JsonLinesOutcomeSink::new(path.clone()))
        }
        None => Arc::new(NullOutcomeSink),
    };
    let sink = Arc::new(ConsoleSink);
    Ports::new(sink.clone(), sink, outcomes)
}
