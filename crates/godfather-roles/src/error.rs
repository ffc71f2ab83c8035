//! Error types for the godfather-roles crate.
//!
//! Every variant here is recoverable at the command boundary: the caller
//! shows the message to the player and the game state is left unchanged.

use godfather_types::{ActionKind, UserId};

/// An invalid vote, unvote, or no-lynch attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoteError {
    /// The voter is not in this game.
    #[error("you are not playing in this game")]
    VoterNotPlaying(UserId),

    /// Dead players cannot vote.
    #[error("dead players cannot vote")]
    VoterDead(UserId),

    /// The target is not in this game.
    #[error("that player is not in this game")]
    TargetNotPlaying(UserId),

    /// Dead players cannot be voted.
    #[error("you cannot vote a dead player")]
    TargetDead(UserId),

    /// The voter already cast this exact vote.
    #[error("you have already voted for this target")]
    AlreadyVoted(UserId),
}

/// A rejected night-action submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// Resolution has started; no more submissions are accepted.
    #[error("night actions are closed")]
    Closed,

    /// The actor is not in this game.
    #[error("you are not playing in this game")]
    NotPlaying(UserId),

    /// The actor's role has no night action.
    #[error("you have no night action")]
    NoAction,

    /// The requested action kind is not the one the role declares.
    #[error("you cannot {requested}; your action is {expected}")]
    WrongKind {
        /// What the role can do.
        expected: ActionKind,
        /// What was requested.
        requested: ActionKind,
    },

    /// The role is not eligible to act tonight.
    #[error("{reason}")]
    Ineligible {
        /// Player-facing explanation from the role.
        reason: String,
    },

    /// The number of targets does not match the action.
    #[error("this action takes {expected} target(s), got {got}")]
    WrongTargetCount {
        /// Targets the action takes.
        expected: usize,
        /// Targets supplied.
        got: usize,
    },

    /// A target is not in this game.
    #[error("player {0} is not in this game")]
    UnknownTarget(UserId),

    /// The role refuses this target.
    #[error("{reason}")]
    InvalidTarget {
        /// Player-facing explanation from the role.
        reason: String,
    },
}

/// Errors from roster and catalogue operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The user already occupies a slot in this game.
    #[error("{0} is already playing")]
    AlreadyPlaying(String),

    /// The user is already waiting as a replacement.
    #[error("{0} is already a replacement")]
    AlreadyReplacement(String),

    /// No player matched the query.
    #[error("player {0} not found")]
    NotFound(String),

    /// The user already voted to change the host.
    #[error("you have already voted to change the host")]
    AlreadyVotedKick,

    /// The catalogue has no role with this name.
    #[error("unknown role: {0}")]
    UnknownRole(String),
}
