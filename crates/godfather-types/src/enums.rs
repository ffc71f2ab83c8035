//! Enumeration types shared by the role model and the state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// The phase a game is currently in.
///
/// `Standby` is transient: it is held while a transition is being computed
/// and no player-facing verbs are accepted during it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Signups open, roles not yet assigned.
    Pregame,
    /// A transition is in progress.
    Standby,
    /// Public discussion and voting.
    Day,
    /// Private night actions.
    Night,
    /// Terminal. The game object is about to be discarded.
    Ended,
}

impl Phase {
    /// Whether the game has left signups.
    pub const fn has_started(self) -> bool {
        !matches!(self, Self::Pregame)
    }

    /// Short letter used in death reasons (`d` for day, `n` otherwise).
    pub const fn letter(self) -> char {
        match self {
            Self::Day => 'd',
            _ => 'n',
        }
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Pregame => "Pregame",
            Self::Standby => "Standby",
            Self::Day => "Day",
            Self::Night => "Night",
            Self::Ended => "Ended",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Night actions
// ---------------------------------------------------------------------------

/// The typed kind of a night action.
///
/// Incoming requests are matched against the acting role's declared kind,
/// never against free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Learn whether the target reads innocent.
    Investigate,
    /// Save the target from one night kill.
    Protect,
    /// Learn who visits the target.
    Watch,
    /// Roleblock the target.
    Block,
    /// Attempt to kill the target.
    Kill,
    /// Make the target read guilty for the night.
    Frame,
    /// Hide the role of the target if they die tonight.
    Clean,
    /// Bring a dead player back to life.
    Revive,
    /// Go on alert and kill every visitor.
    Alert,
    /// Put on a bulletproof vest.
    Vest,
    /// Kill one of the players who voted for a lynched jester.
    Haunt,
}

impl ActionKind {
    /// Parse the command word a player uses to submit this action.
    pub fn from_command(word: &str) -> Option<Self> {
        let kind = match word.trim().to_ascii_lowercase().as_str() {
            "check" | "investigate" => Self::Investigate,
            "heal" | "protect" => Self::Protect,
            "watch" => Self::Watch,
            "block" => Self::Block,
            "kill" | "shoot" | "stab" => Self::Kill,
            "frame" => Self::Frame,
            "clean" => Self::Clean,
            "revive" => Self::Revive,
            "alert" => Self::Alert,
            "vest" => Self::Vest,
            "haunt" => Self::Haunt,
            _ => return None,
        };
        Some(kind)
    }

    /// The canonical command word for this action.
    pub const fn command(self) -> &'static str {
        match self {
            Self::Investigate => "check",
            Self::Protect => "heal",
            Self::Watch => "watch",
            Self::Block => "block",
            Self::Kill => "kill",
            Self::Frame => "frame",
            Self::Clean => "clean",
            Self::Revive => "revive",
            Self::Alert => "alert",
            Self::Vest => "vest",
            Self::Haunt => "haunt",
        }
    }
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.command())
    }
}

/// Ordering key for night resolution. Lower values resolve first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Priority(pub u16);

impl Priority {
    /// Veterans decide to go on alert before anyone visits.
    pub const VETERAN_ALERT: Self = Self(1);
    /// Roleblocks land before any other manipulation.
    pub const ESCORT: Self = Self(2);
    /// Vests are put on before kills are attempted.
    pub const SURVIVOR_VEST: Self = Self(3);
    /// Frames must precede investigations.
    pub const FRAMER: Self = Self(5);
    /// Protections must precede kills.
    pub const PROTECT: Self = Self(10);
    /// Revivals happen before investigations read the target.
    pub const RETRIBUTIONIST: Self = Self(12);
    /// Investigations.
    pub const INVESTIGATE: Self = Self(20);
    /// Visit detection runs once every visit has been registered.
    pub const LOOKOUT: Self = Self(30);
    /// Cleans mark a target before the kill reveals it.
    pub const JANITOR: Self = Self(40);
    /// Night kills.
    pub const KILL: Self = Self(50);
    /// Post-mortem jester haunts.
    pub const JESTER_HAUNT: Self = Self(55);
    /// A guilty vigilante takes their own life last.
    pub const VIGI_SUICIDE: Self = Self(60);

    /// The raw numeric value.
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl core::fmt::Display for Priority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
