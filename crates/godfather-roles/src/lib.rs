//! Roles, factions, and the per-game bookkeeping they act on.
//!
//! This crate holds everything that happens inside one phase of one game
//! and nothing that touches time, chat, or other games:
//!
//! # Modules
//!
//! - [`catalog`] -- creates role instances by name
//! - [`effects`] -- state changes roles request, and their application
//! - [`error`] -- vote, night-action, and roster errors
//! - [`faction`] -- factions and win predicates
//! - [`night`] -- night action collection and the resolution pipeline
//! - [`player`] -- a single seat
//! - [`players`] -- the roster, replacement queue, and host vote-kicks
//! - [`role`] -- the role trait and the contexts its hooks receive
//! - [`roles`] -- the curated role set
//! - [`votes`] -- day voting and the hammer

pub mod catalog;
pub mod effects;
pub mod error;
pub mod faction;
pub mod night;
pub mod player;
pub mod players;
pub mod role;
pub mod roles;
pub mod votes;

pub use catalog::{RoleCatalog, STALEMATE_PRIORITY_ORDER};
pub use effects::{Effect, EffectContext, NightRecord, Notification, Report};
pub use error::{ActionError, RegistryError, VoteError};
pub use faction::{Faction, FactionId, Factions};
pub use night::{NightAction, NightActions, NightState};
pub use player::Player;
pub use players::PlayerRegistry;
pub use role::{Eligibility, LynchContext, Role, RoleContext, VoterInfo};
pub use votes::{VoteManager, VoteTarget, majority};
