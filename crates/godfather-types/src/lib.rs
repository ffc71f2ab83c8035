//! Shared type definitions for the Godfather game engine.
//!
//! This crate is the single source of truth for the identifiers, phases,
//! and action kinds that flow between the role model, the state machine,
//! and the hosting binary.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for game, user, channel, and guild identities
//! - [`enums`] -- Phases, typed night-action kinds, and resolution priorities
//! - [`structs`] -- Users, death reasons, and match outcome records

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ActionKind, Phase, Priority};
pub use ids::{ChannelId, GameId, GuildId, UserId};
pub use structs::{DeathReason, MatchOutcome, PlayerResult, User};
