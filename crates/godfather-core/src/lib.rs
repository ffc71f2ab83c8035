//! Game state machine, setups, channel registry, and phase driver.
//!
//! This crate turns the per-phase bookkeeping of `godfather-roles` into
//! whole games: sign-ups, role assignment, the day/night loop with its
//! deadlines, win checks, and the set of games running per channel.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `godfather.yaml` into
//!   strongly-typed structs.
//! - [`driver`] -- Background loop that advances phases on their deadlines.
//! - [`endgame`] -- Win-condition evaluation and the draw streak.
//! - [`game`] -- The [`Game`] aggregate and its verbs.
//! - [`ports`] -- Chat, direct-message, prompt, and outcome boundaries.
//! - [`registry`] -- [`GameRegistry`], every game keyed by channel.
//! - [`settings`] -- Per-game durations and player cap.
//! - [`setup`] -- Role lists, custom setups, and setup selection.
//!
//! [`Game`]: game::Game
//! [`GameRegistry`]: registry::GameRegistry

pub mod config;
pub mod driver;
pub mod endgame;
pub mod game;
pub mod ports;
pub mod registry;
pub mod settings;
pub mod setup;
