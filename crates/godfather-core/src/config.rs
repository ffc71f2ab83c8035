//! Configuration loading and typed config structures for the game host.
//!
//! The configuration lives in `godfather.yaml` next to the binary. Every
//! field has a default, so an empty or missing file yields a working host.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::settings::{SettingsError, check_duration, check_max_players};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside what a game accepts.
    #[error("invalid `{field}`: {source}")]
    Invalid {
        /// The offending key under `game`.
        field: &'static str,
        /// Why the value was rejected.
        source: SettingsError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level host configuration. Mirrors the structure of `godfather.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GodfatherConfig {
    /// Defaults applied to every new game.
    #[serde(default)]
    pub game: GameConfig,

    /// Phase driver settings.
    #[serde(default)]
    pub driver: DriverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where finished match outcomes go.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl GodfatherConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `GODFATHER_LOG_LEVEL` overrides `logging.level`
    /// - `GODFATHER_OUTCOMES_PATH` overrides `persistence.outcomes_path`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.game.validate()?;
        Ok(config)
    }

    /// Apply `GODFATHER_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GODFATHER_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("GODFATHER_OUTCOMES_PATH") {
            self.persistence.outcomes_path = Some(PathBuf::from(val));
        }
    }
}

/// Defaults for new games. Hosts may change durations and the player cap
/// per game through [`GameSettings`](crate::settings::GameSettings).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Day length in seconds.
    #[serde(default = "default_day_duration_secs")]
    pub day_duration_secs: u64,

    /// Night length in seconds.
    #[serde(default = "default_night_duration_secs")]
    pub night_duration_secs: u64,

    /// Player cap for sign-ups.
    #[serde(default = "default_max_players")]
    pub max_players: usize,

    /// Seconds a game may sit in pregame before it is deleted.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            day_duration_secs: default_day_duration_secs(),
            night_duration_secs: default_night_duration_secs(),
            max_players: default_max_players(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl GameConfig {
    /// Check the per-game defaults against the ranges hosts are held to.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_duration(self.day_duration_secs).map_err(invalid("game.day_duration_secs"))?;
        check_duration(self.night_duration_secs).map_err(invalid("game.night_duration_secs"))?;
        check_max_players(self.max_players).map_err(invalid("game.max_players"))?;
        Ok(())
    }
}

fn invalid(field: &'static str) -> impl Fn(SettingsError) -> ConfigError {
    move |source| ConfigError::Invalid { field, source }
}

/// Phase driver settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverConfig {
    /// How often every live game's phase deadline is checked.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins over it.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Outcome persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Append one JSON line per finished match here. Unset disables
    /// persistence.
    #[serde(default)]
    pub outcomes_path: Option<PathBuf>,
}

const fn default_day_duration_secs() -> u64 {
    300
}

const fn default_night_duration_secs() -> u64 {
    120
}

const fn default_max_players() -> usize {
    18
}

const fn default_idle_timeout_secs() -> u64 {
    900
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    String::from("info")
}
