//! Plain records shared across the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::Phase;
use crate::ids::{GameId, UserId};

/// A chat-platform user as seen by the game: an identity and a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Platform identity.
    pub id: UserId,
    /// Display name used in announcements and name lookups.
    pub name: String,
}

impl User {
    /// Build a user from an identity and a display name.
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl core::fmt::Display for User {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Why a player is no longer alive.
///
/// Rendered as the short tag shown in player lists, e.g. `lynched D2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathReason {
    /// Lynched by majority vote on the given day.
    Lynched {
        /// Day number.
        cycle: u32,
    },
    /// Killed during the given night.
    NightKill {
        /// Night number.
        cycle: u32,
    },
    /// Blown up by a lynched super saint.
    Exploded {
        /// Day number.
        cycle: u32,
    },
    /// Removed by the host or for leaving. Bypasses on-death effects.
    Modkilled {
        /// Phase the removal happened in.
        phase: Phase,
        /// Cycle the removal happened in.
        cycle: u32,
    },
}

impl DeathReason {
    /// Whether this death bypasses on-death role effects.
    pub const fn is_modkill(self) -> bool {
        matches!(self, Self::Modkilled { .. })
    }
}

impl core::fmt::Display for DeathReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Lynched { cycle } => write!(f, "lynched D{cycle}"),
            Self::NightKill { cycle } => write!(f, "killed N{cycle}"),
            Self::Exploded { cycle } => write!(f, "blown up D{cycle}"),
            Self::Modkilled { phase, cycle } => write!(f, "modkilled {}{cycle}", phase.letter()),
        }
    }
}

/// Per-player line of a finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResult {
    /// The player.
    pub user: UserId,
    /// Name of the faction the player ended in.
    pub faction: String,
    /// Name of the role the player ended as.
    pub role: String,
    /// Whether the player counts as a winner.
    pub won: bool,
}

/// Append-only record of a finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// The match.
    pub game_id: GameId,
    /// Name of the setup the match was played with.
    pub setup: String,
    /// Winning faction name, `None` for a draw.
    pub winning_faction: Option<String>,
    /// Role names of players who won on their own.
    pub independent_winners: Vec<String>,
    /// Every player's result, in roster order.
    pub players: Vec<PlayerResult>,
    /// When the match ended.
    pub ended_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn death_reasons_render_short_tags() {
        assert_eq!(DeathReason::Lynched { cycle: 2 }.to_string(), "lynched D2");
        assert_eq!(DeathReason::NightKill { cycle: 1 }.to_string(), "killed N1");
        assert_eq!(
            DeathReason::Modkilled {
                phase: Phase::Day,
                cycle: 3
            }
            .to_string(),
            "modkilled d3"
        );
        assert_eq!(
            DeathReason::Modkilled {
                phase: Phase::Night,
                cycle: 1
            }
            .to_string(),
            "modkilled n1"
        );
    }

    #[test]
    fn only_modkills_bypass_death_hooks() {
        assert!(
            DeathReason::Modkilled {
                phase: Phase::Day,
                cycle: 1
            }
            .is_modkill()
        );
        assert!(!DeathReason::Lynched { cycle: 1 }.is_modkill());
    }

    #[test]
    fn user_displays_name() {
        let user = User::new(5, "alice");
        assert_eq!(user.to_string(), "alice");
        assert_eq!(user.id, UserId(5));
    }
}
