//! A single seat in a game.
//!
//! Players are never removed from the roster once a game has started; a
//! dead player keeps their role so it can be revealed and recorded. Votes
//! on a player live in the [`VoteManager`](crate::votes::VoteManager), keyed
//! by the player's identity, so a replacement only has to swap the identity.

use std::sync::Arc;

use godfather_types::{DeathReason, User, UserId};

use crate::faction::{Faction, FactionId};
use crate::role::Role;

/// One participant and everything the game tracks about them.
#[derive(Debug)]
pub struct Player {
    /// Who currently occupies this seat.
    pub user: User,
    role: Option<Box<dyn Role>>,
    /// Liveness flag.
    pub alive: bool,
    /// Why the player died, if they did.
    pub death_reason: Option<DeathReason>,
    /// Players who visited this one during the current night.
    pub visitors: Vec<UserId>,
    /// Names of roles held before the current one.
    pub previous_roles: Vec<String>,
    /// Whether the player was brought back to life.
    pub revived: bool,
    /// Cycle of the revival.
    pub revived_on: Option<u32>,
    /// Whether the player's role is hidden from the public.
    pub cleaned: bool,
}

impl Player {
    /// A living player with no role yet.
    pub const fn new(user: User) -> Self {
        Self {
            user,
            role: None,
            alive: true,
            death_reason: None,
            visitors: Vec::new(),
            previous_roles: Vec::new(),
            revived: false,
            revived_on: None,
            cleaned: false,
        }
    }

    /// The identity currently in this seat.
    pub const fn id(&self) -> UserId {
        self.user.id
    }

    /// The assigned role.
    pub fn role(&self) -> Option<&dyn Role> {
        self.role.as_deref()
    }

    /// Mutable access to the assigned role.
    pub fn role_mut(&mut self) -> Option<&mut (dyn Role + 'static)> {
        self.role.as_deref_mut()
    }

    /// Assign a role. A previously held role is pushed onto the history.
    pub fn assign_role(&mut self, role: Box<dyn Role>) {
        if let Some(old) = self.role.replace(role) {
            self.previous_roles.push(old.name().to_owned());
        }
    }

    /// Name of the current role, or `None` before assignment.
    pub fn role_name(&self) -> Option<&'static str> {
        self.role().map(Role::name)
    }

    /// The faction of the current role.
    pub fn faction(&self) -> Option<&Arc<Faction>> {
        self.role().map(Role::faction)
    }

    /// The faction identity of the current role.
    pub fn faction_id(&self) -> Option<FactionId> {
        self.faction().map(|f| f.id)
    }

    /// How this player reads to an investigator, before any frame.
    pub fn innocent(&self) -> bool {
        self.role().is_some_and(|role| {
            role.innocence_modifier()
                .unwrap_or_else(|| role.faction().id.reads_innocent())
        })
    }

    /// Role as shown publicly, e.g. `Town Cop`, `Jester`, or `Cleaned`.
    pub fn display_role(&self) -> String {
        if self.cleaned {
            return String::from("Cleaned");
        }
        match self.role() {
            Some(role) if role.faction().is_neutral() => role.display(),
            Some(role) => format!("{} {}", role.faction().name, role.display()),
            None => String::from("Unassigned"),
        }
    }

    /// Every role this player held, e.g. `Goon -> Godfather`.
    pub fn full_role(&self) -> String {
        let mut all: Vec<&str> = self.previous_roles.iter().map(String::as_str).collect();
        if let Some(name) = self.role_name() {
            all.push(name);
        }
        all.join(" -> ")
    }

    /// Record a visit. Self-visits are ignored. Returns whether it counted.
    pub fn visit(&mut self, visitor: UserId) -> bool {
        if visitor == self.id() {
            return false;
        }
        self.visitors.push(visitor);
        true
    }

    /// Mark the player dead. Returns whether this was a live-to-dead transition.
    pub fn kill(&mut self, reason: DeathReason) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        self.death_reason = Some(reason);
        true
    }

    /// Bring the player back to life.
    pub fn revive(&mut self, cycle: u32) {
        self.alive = true;
        self.death_reason = None;
        self.revived = true;
        self.revived_on = Some(cycle);
    }

    /// The role PM: role, description, and win condition.
    pub fn role_pm(&self) -> Option<String> {
        let role = self.role()?;
        Some(format!(
            "Hello {}, you are a **{}**. {}\nWin Condition: {}",
            self.user.name,
            self.display_role(),
            role.description(),
            role.faction().win_con
        ))
    }
}
