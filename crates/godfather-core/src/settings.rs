//! Per-game settings the host may change.
//!
//! Every game starts from the configured [`GameConfig`] defaults. Values are
//! set from raw command arguments, validated, and acknowledged with the
//! message shown to the channel.

use crate::config::GameConfig;

/// Shortest allowed phase, in seconds.
pub const MIN_DURATION_SECS: u64 = 30;

/// Longest allowed phase, in seconds.
pub const MAX_DURATION_SECS: u64 = 1800;

/// Smallest allowed player cap.
pub const MIN_PLAYERS: usize = 3;

/// Largest allowed player cap, also what `reset` restores.
pub const MAX_PLAYERS: usize = 18;

/// A rejected setting change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// No setting has this key.
    #[error("unknown setting `{0}`; use day_duration, night_duration or max_players")]
    UnknownKey(String),

    /// The value is not a whole number.
    #[error("Duration must be a valid number.")]
    NotANumber,

    /// A duration outside the allowed range.
    #[error("Duration must be between 30 seconds and 30 minutes.")]
    DurationOutOfRange,

    /// A player cap outside the allowed range.
    #[error("Maximum players must be between 3 and 18.")]
    MaxPlayersOutOfRange,
}

/// Durations and player cap of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    /// Day length in seconds.
    pub day_duration_secs: u64,
    /// Night length in seconds.
    pub night_duration_secs: u64,
    /// Player cap for sign-ups.
    pub max_players: usize,
}

impl GameSettings {
    /// Settings seeded from the configured defaults.
    pub const fn from_config(config: &GameConfig) -> Self {
        Self {
            day_duration_secs: config.day_duration_secs,
            night_duration_secs: config.night_duration_secs,
            max_players: config.max_players,
        }
    }

    /// Change one setting from its raw argument. Returns the confirmation
    /// shown to the channel.
    pub fn set(&mut self, key: &str, value: &str) -> Result<String, SettingsError> {
        let value = value.trim();
        match key.trim() {
            "day_duration" => {
                self.day_duration_secs = parse_duration(value)?;
                Ok(format!(
                    "Days will now last {} minutes.",
                    minutes(self.day_duration_secs)
                ))
            }
            "night_duration" => {
                self.night_duration_secs = parse_duration(value)?;
                Ok(format!(
                    "Nights will now last {} minutes.",
                    minutes(self.night_duration_secs)
                ))
            }
            "max_players" => {
                self.max_players = parse_max_players(value)?;
                Ok(format!(
                    "This game will now accept up-to {} players",
                    self.max_players
                ))
            }
            other => Err(SettingsError::UnknownKey(other.to_owned())),
        }
    }
}

fn parse_number(arg: &str) -> Result<u64, SettingsError> {
    if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SettingsError::NotANumber);
    }
    arg.parse().ok().ok_or(SettingsError::NotANumber)
}

/// Accept a phase length within [`MIN_DURATION_SECS`]..=[`MAX_DURATION_SECS`].
pub fn check_duration(secs: u64) -> Result<u64, SettingsError> {
    if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&secs) {
        return Err(SettingsError::DurationOutOfRange);
    }
    Ok(secs)
}

/// Accept a player cap within [`MIN_PLAYERS`]..=[`MAX_PLAYERS`].
pub fn check_max_players(n: usize) -> Result<usize, SettingsError> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&n) {
        return Err(SettingsError::MaxPlayersOutOfRange);
    }
    Ok(n)
}

fn parse_duration(arg: &str) -> Result<u64, SettingsError> {
    check_duration(parse_number(arg)?)
}

fn parse_max_players(arg: &str) -> Result<usize, SettingsError> {
    if arg == "reset" {
        return Ok(MAX_PLAYERS);
    }
    let n = usize::try_from(parse_number(arg)?)
        .map_err(|_overflow| SettingsError::MaxPlayersOutOfRange)?;
    check_max_players(n)
}

/// Seconds as minutes with one decimal, e.g. `2.5`.
pub fn minutes(secs: u64) -> String {
    let tenths = secs.saturating_mul(10).saturating_add(30) / 60;
    format!("{}.{}", tenths / 10, tenths % 10)
}
