//! The curated role set.
//!
//! Roles are grouped by alignment. Each is a small struct holding its
//! shared faction plus whatever per-game state it needs (charges, guilt,
//! remembered voters), implementing only the [`Role`](crate::role::Role)
//! hooks it cares about.
//!
//! # Submodules
//!
//! - [`town`] -- Vanilla, Cop, Doctor, Lookout, Escort, Vigilante, Veteran,
//!   Retributionist, Super Saint
//! - [`mafia`] -- Goon, Godfather, Framer, Janitor
//! - [`neutral`] -- Jester, Survivor, Serial Killer

pub mod mafia;
pub mod neutral;
pub mod town;

use godfather_types::{ActionKind, Priority};

use crate::role::{ActionSpec, Eligibility, RoleContext};

/// A blockable action on one other player.
pub(crate) const fn single_target(
    kind: ActionKind,
    priority: Priority,
    text: &'static str,
) -> ActionSpec {
    ActionSpec {
        kind,
        priority,
        targets: 1,
        can_block: true,
        text,
    }
}

/// An action the actor performs on themselves.
pub(crate) const fn self_action(
    kind: ActionKind,
    priority: Priority,
    can_block: bool,
    text: &'static str,
) -> ActionSpec {
    ActionSpec {
        kind,
        priority,
        targets: 0,
        can_block,
        text,
    }
}

/// Living holder with charges left.
pub(crate) fn charged(ctx: &RoleContext<'_>, charges: u8, empty: &'static str) -> Eligibility {
    if !ctx.me.alive {
        return Eligibility::no("Dead players cannot act.");
    }
    if charges == 0 {
        return Eligibility::no(empty);
    }
    Eligibility::Eligible
}
