//! The role capability model.
//!
//! A role is a trait object with default no-op hooks. The resolver and the
//! state machine never switch on role names; they ask the role what it can
//! do ([`Role::action`], [`Role::can_do_action`]) and invoke the hook for
//! the event at hand. A role that does not override a hook simply has no
//! effect for that event.
//!
//! Hooks that only inspect the game take `&self` and return [`Effect`]s for
//! the caller to apply. Hooks that update role-local state (charges, guilt,
//! remembered voters) take `&mut self` and receive owned context, so the
//! role can be borrowed out of its player while the rest of the roster is
//! untouched.

use std::sync::Arc;

use godfather_types::{ActionKind, Priority, UserId};

use crate::effects::{Effect, Manipulation, NightRecord};
use crate::faction::{Faction, FactionId};
use crate::night::NightAction;
use crate::player::Player;
use crate::players::PlayerRegistry;

/// What a role's night action looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    /// The typed kind requests are validated against.
    pub kind: ActionKind,
    /// Resolution order key.
    pub priority: Priority,
    /// Number of targets. Zero means the action acts on the actor.
    pub targets: usize,
    /// Whether a roleblock stops this action.
    pub can_block: bool,
    /// Prompt fragment, e.g. `shoot a player`.
    pub text: &'static str,
}

/// Whether a role may act tonight, and why not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    /// The role may submit its action.
    Eligible,
    /// The role may not act; the reason is shown to the player.
    Ineligible(String),
}

impl Eligibility {
    /// Shorthand for an ineligible result.
    pub fn no(reason: impl Into<String>) -> Self {
        Self::Ineligible(reason.into())
    }

    /// Whether the role may act.
    pub const fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// How a role reacts to being roleblocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReaction {
    /// The action is cancelled.
    Blocked,
    /// The action is redirected onto the blocker.
    Retaliate,
}

/// An action a role contributes without being submitted, e.g. a forced
/// suicide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassiveAction {
    /// The kind of the action.
    pub kind: ActionKind,
    /// When it resolves.
    pub priority: Priority,
    /// Targets; may include the actor.
    pub targets: Vec<UserId>,
}

/// Read-only view given to hooks that inspect the game.
#[derive(Debug, Clone, Copy)]
pub struct RoleContext<'a> {
    /// The player holding the role.
    pub me: &'a Player,
    /// The whole roster.
    pub players: &'a PlayerRegistry,
    /// Current cycle.
    pub cycle: u32,
}

/// Read-only view given to [`Role::resolve`] during the effect sweep.
#[derive(Debug, Clone, Copy)]
pub struct NightView<'a> {
    /// The roster, with every earlier effect already applied.
    pub players: &'a PlayerRegistry,
    /// Per-night bookkeeping: protections, frames, blocks.
    pub record: &'a NightRecord,
    /// The night being resolved.
    pub cycle: u32,
}

impl NightView<'_> {
    /// Display name of a player, or their raw identity if unknown.
    pub fn name(&self, id: UserId) -> String {
        self.players
            .get(id)
            .map_or_else(|| id.to_string(), |p| p.user.name.clone())
    }
}

/// What happened to one resolved action, handed to [`Role::tear_down`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Who acted.
    pub actor: UserId,
    /// The action kind.
    pub kind: ActionKind,
    /// The first target, if the action had one.
    pub target: Option<UserId>,
    /// Whether that target died tonight.
    pub target_died: bool,
    /// Faction of that target.
    pub target_faction: Option<FactionId>,
}

/// One voter on a lynched player, as the lynched role sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterInfo {
    /// Identity.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Publicly shown role.
    pub display_role: String,
}

/// Owned context for [`Role::on_lynch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LynchContext {
    /// The lynched player.
    pub me: UserId,
    /// Day number.
    pub cycle: u32,
    /// Voters in the order they voted; the last one hammered.
    pub voters: Vec<VoterInfo>,
}

/// A role. See the module docs for the hook contract.
pub trait Role: core::fmt::Debug + Send + Sync {
    /// Role name, e.g. `Serial Killer`.
    fn name(&self) -> &'static str;

    /// Player-facing description of the role.
    fn description(&self) -> &'static str;

    /// The faction this role belongs to.
    fn faction(&self) -> &Arc<Faction>;

    /// Category tags, e.g. `Town Investigative`.
    fn categories(&self) -> &'static [&'static str] {
        &[]
    }

    /// At most one living holder per game.
    fn unique(&self) -> bool {
        false
    }

    /// The night action, if any.
    fn action(&self) -> Option<ActionSpec> {
        None
    }

    /// Whether the role may act tonight.
    fn can_do_action(&self, ctx: &RoleContext<'_>) -> Eligibility {
        if self.action().is_none() {
            return Eligibility::no("You have no night action.");
        }
        if !ctx.me.alive {
            return Eligibility::no("Dead players cannot act.");
        }
        Eligibility::Eligible
    }

    /// Whether `target` is a valid target.
    fn can_target(&self, ctx: &RoleContext<'_>, target: &Player) -> Result<(), String> {
        if !target.alive {
            return Err(String::from("You cannot target dead players."));
        }
        if target.id() == ctx.me.id() {
            return Err(String::from("You cannot target yourself."));
        }
        Ok(())
    }

    /// An action added at resolution time without submission.
    fn passive_action(&self, _ctx: &RoleContext<'_>) -> Option<PassiveAction> {
        None
    }

    /// Called when night falls for eligible players. The default prompts
    /// the player with the command and the valid targets.
    fn on_night(&self, ctx: &RoleContext<'_>) -> Vec<Effect> {
        let Some(spec) = self.action() else {
            return Vec::new();
        };
        let mut text = format!(
            "It is now night {}. Use `{}` to {}.",
            ctx.cycle,
            spec.kind.command(),
            spec.text
        );
        if spec.targets > 0 {
            let targets: Vec<String> = ctx
                .players
                .iter()
                .enumerate()
                .filter(|(_, p)| self.can_target(ctx, p).is_ok())
                .map(|(i, p)| format!("{}. {}", i.saturating_add(1), p.user.name))
                .collect();
            text.push_str("\nValid targets:\n");
            text.push_str(&targets.join("\n"));
        }
        vec![Effect::Notify {
            to: ctx.me.id(),
            text,
        }]
    }

    /// Manipulation sweep: roleblocks and alerts.
    fn set_up(&self, _action: &NightAction) -> Vec<Manipulation> {
        Vec::new()
    }

    /// How this role reacts when its action is roleblocked.
    fn on_roleblock(&self) -> BlockReaction {
        BlockReaction::Blocked
    }

    /// Reaction to being visited.
    fn on_visit(&self, _me: UserId, _visitor: UserId, _record: &NightRecord) -> Vec<Effect> {
        Vec::new()
    }

    /// Effect sweep: what the action does.
    fn resolve(&self, _action: &NightAction, _view: &NightView<'_>) -> Vec<Effect> {
        Vec::new()
    }

    /// After every effect has landed: update role state, report back.
    fn tear_down(&mut self, _outcome: &ActionOutcome) -> Vec<Effect> {
        Vec::new()
    }

    /// The holder was lynched.
    fn on_lynch(&mut self, _ctx: &LynchContext) -> Vec<Effect> {
        Vec::new()
    }

    /// A seat changed hands. Roles that remember other players swap
    /// `old` for `new`.
    fn replace_identity(&mut self, _old: UserId, _new: UserId) {}

    /// The holder died. Not called for modkills.
    fn on_death(&self, _ctx: &RoleContext<'_>) -> Vec<Effect> {
        Vec::new()
    }

    /// Overrides the faction's default investigation read.
    fn innocence_modifier(&self) -> Option<bool> {
        None
    }

    /// Night defense. Non-zero survives ordinary kills.
    fn defense(&self) -> u8 {
        0
    }

    /// Name as shown publicly.
    fn display(&self) -> String {
        self.name().to_owned()
    }
}
