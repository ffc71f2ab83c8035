//! Neutral roles.

use std::sync::Arc;

use godfather_types::{ActionKind, Priority, UserId};

use crate::effects::Effect;
use crate::faction::Faction;
use crate::night::NightAction;
use crate::player::Player;
use crate::role::{
    ActionOutcome, ActionSpec, BlockReaction, Eligibility, LynchContext, NightView, Role,
    RoleContext,
};
use crate::roles::{charged, self_action, single_target};

/// Starting vests for a Survivor.
pub const SURVIVOR_VESTS: u8 = 4;

/// Wins by being lynched, then haunts one of the voters.
#[derive(Debug)]
pub struct Jester {
    faction: Arc<Faction>,
    voters: Vec<UserId>,
    lynched_on: Option<u32>,
    haunted: bool,
}

impl Jester {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self {
            faction,
            voters: Vec::new(),
            lynched_on: None,
            haunted: false,
        }
    }

    /// Whether the jester was lynched on `cycle` and may still haunt.
    pub fn may_haunt(&self, cycle: u32) -> bool {
        self.lynched_on == Some(cycle) && !self.haunted
    }
}

impl Role for Jester {
    fn name(&self) -> &'static str {
        "Jester"
    }

    fn description(&self) -> &'static str {
        "Your only goal is to get yourself lynched. If you succeed, you may haunt one of the players who voted for you."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Neutral Evil"]
    }

    fn action(&self) -> Option<ActionSpec> {
        Some(ActionSpec {
            can_block: false,
            ..single_target(ActionKind::Haunt, Priority::JESTER_HAUNT, "haunt a player")
        })
    }

    fn can_do_action(&self, ctx: &RoleContext<'_>) -> Eligibility {
        if ctx.me.alive || !self.may_haunt(ctx.cycle) {
            return Eligibility::no("You can only haunt on the night after you are lynched.");
        }
        Eligibility::Eligible
    }

    fn can_target(&self, _ctx: &RoleContext<'_>, target: &Player) -> Result<(), String> {
        if !target.alive || !self.voters.contains(&target.id()) {
            return Err(String::from("You can only haunt players who voted for you."));
        }
        Ok(())
    }

    fn resolve(&self, action: &NightAction, _view: &NightView<'_>) -> Vec<Effect> {
        vec![Effect::Kill {
            attacker: action.actor,
            target: action.target(),
            notice: "You were haunted by the Jester you lynched.",
            piercing: true,
        }]
    }

    fn tear_down(&mut self, outcome: &ActionOutcome) -> Vec<Effect> {
        if outcome.kind == ActionKind::Haunt {
            self.haunted = true;
        }
        Vec::new()
    }

    fn replace_identity(&mut self, old: UserId, new: UserId) {
        for voter in &mut self.voters {
            if *voter == old {
                *voter = new;
            }
        }
    }

    fn on_lynch(&mut self, ctx: &LynchContext) -> Vec<Effect> {
        self.voters = ctx.voters.iter().map(|v| v.id).collect();
        self.lynched_on = Some(ctx.cycle);
        vec![Effect::Notify {
            to: ctx.me,
            text: String::from(
                "You were lynched! Tonight you may haunt one of the players who voted for you.",
            ),
        }]
    }
}

/// Wins by staying alive; has a few bulletproof vests.
#[derive(Debug)]
pub struct Survivor {
    faction: Arc<Faction>,
    vests: u8,
}

impl Survivor {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self {
            faction,
            vests: SURVIVOR_VESTS,
        }
    }

    /// Vests left.
    pub const fn vests(&self) -> u8 {
        self.vests
    }
}

impl Role for Survivor {
    fn name(&self) -> &'static str {
        "Survivor"
    }

    fn description(&self) -> &'static str {
        "You may put on a bulletproof vest at night, protecting you from ordinary attacks."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Neutral Benign"]
    }

    fn action(&self) -> Option<ActionSpec> {
        Some(self_action(
            ActionKind::Vest,
            Priority::SURVIVOR_VEST,
            false,
            "put on a vest",
        ))
    }

    fn can_do_action(&self, ctx: &RoleContext<'_>) -> Eligibility {
        charged(ctx, self.vests, "You have no vests left.")
    }

    fn resolve(&self, action: &NightAction, _view: &NightView<'_>) -> Vec<Effect> {
        vec![Effect::Vest {
            target: action.actor,
        }]
    }

    fn tear_down(&mut self, outcome: &ActionOutcome) -> Vec<Effect> {
        if outcome.kind == ActionKind::Vest {
            self.vests = self.vests.saturating_sub(1);
        }
        Vec::new()
    }
}

/// Lone night killer. Stabs whoever tries to roleblock them.
#[derive(Debug)]
pub struct SerialKiller {
    faction: Arc<Faction>,
}

impl SerialKiller {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self { faction }
    }
}

impl Role for SerialKiller {
    fn name(&self) -> &'static str {
        "Serial Killer"
    }

    fn description(&self) -> &'static str {
        "You may stab someone every night. You cannot be killed at night, and you will stab anyone who roleblocks you."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Neutral Killing"]
    }

    fn action(&self) -> Option<ActionSpec> {
        Some(single_target(
            ActionKind::Kill,
            Priority::KILL,
            "stab a player",
        ))
    }

    fn on_roleblock(&self) -> BlockReaction {
        BlockReaction::Retaliate
    }

    fn resolve(&self, action: &NightAction, _view: &NightView<'_>) -> Vec<Effect> {
        vec![Effect::Kill {
            attacker: action.actor,
            target: action.target(),
            notice: "You were stabbed by a Serial Killer.",
            piercing: false,
        }]
    }

    fn defense(&self) -> u8 {
        1
    }
}
