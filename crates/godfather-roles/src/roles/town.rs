//! Town roles.

use std::sync::Arc;

use godfather_types::{ActionKind, Priority, UserId};

use crate::effects::{Effect, Manipulation, NightRecord};
use crate::faction::{Faction, FactionId};
use crate::night::NightAction;
use crate::player::Player;
use crate::role::{
    ActionOutcome, ActionSpec, Eligibility, LynchContext, NightView, PassiveAction, Role,
    RoleContext,
};
use crate::roles::{charged, self_action, single_target};

/// Starting alerts for a Veteran.
pub const VETERAN_ALERTS: u8 = 3;

/// No night action.
#[derive(Debug)]
pub struct Vanilla {
    faction: Arc<Faction>,
}

impl Vanilla {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self { faction }
    }
}

impl Role for Vanilla {
    fn name(&self) -> &'static str {
        "Vanilla"
    }

    fn description(&self) -> &'static str {
        "You have no night action. Find the scum and lynch them."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Town Vanilla"]
    }
}

/// Learns whether a player reads innocent.
#[derive(Debug)]
pub struct Cop {
    faction: Arc<Faction>,
}

impl Cop {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self { faction }
    }
}

impl Role for Cop {
    fn name(&self) -> &'static str {
        "Cop"
    }

    fn description(&self) -> &'static str {
        "You may investigate one person each night for suspicious activity."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Town Investigative"]
    }

    fn action(&self) -> Option<ActionSpec> {
        Some(single_target(
            ActionKind::Investigate,
            Priority::INVESTIGATE,
            "check a player",
        ))
    }

    fn resolve(&self, action: &NightAction, view: &NightView<'_>) -> Vec<Effect> {
        let target = action.target();
        let innocent = view.players.get(target).is_some_and(Player::innocent)
            && !view.record.framed.contains(&target);
        let read = if innocent { "innocent" } else { "suspicious" };
        vec![Effect::Notify {
            to: action.actor,
            text: format!("Your target {} is {read}.", view.name(target)),
        }]
    }
}

/// Protects one player from night kills.
#[derive(Debug)]
pub struct Doctor {
    faction: Arc<Faction>,
}

impl Doctor {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self { faction }
    }
}

impl Role for Doctor {
    fn name(&self) -> &'static str {
        "Doctor"
    }

    fn description(&self) -> &'static str {
        "You may protect one person each night from dying."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Town Protective"]
    }

    fn action(&self) -> Option<ActionSpec> {
        Some(single_target(
            ActionKind::Protect,
            Priority::PROTECT,
            "heal a player",
        ))
    }

    fn resolve(&self, action: &NightAction, _view: &NightView<'_>) -> Vec<Effect> {
        vec![Effect::Protect {
            protector: action.actor,
            target: action.target(),
        }]
    }
}

/// Learns who visited a player.
#[derive(Debug)]
pub struct Lookout {
    faction: Arc<Faction>,
}

impl Lookout {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self { faction }
    }
}

impl Role for Lookout {
    fn name(&self) -> &'static str {
        "Lookout"
    }

    fn description(&self) -> &'static str {
        "You may watch one person at night to see who visits them."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Town Investigative"]
    }

    fn action(&self) -> Option<ActionSpec> {
        Some(single_target(
            ActionKind::Watch,
            Priority::LOOKOUT,
            "watch a player",
        ))
    }

    fn resolve(&self, action: &NightAction, view: &NightView<'_>) -> Vec<Effect> {
        let visitors: Vec<String> = view
            .players
            .get(action.target())
            .map(|p| {
                p.visitors
                    .iter()
                    .filter(|&&v| v != action.actor)
                    .map(|&v| view.name(v))
                    .collect()
            })
            .unwrap_or_default();
        let text = if visitors.is_empty() {
            String::from("Your target was visited by no one.")
        } else {
            format!("Your target was visited by {}.", visitors.join(", "))
        };
        vec![Effect::Notify {
            to: action.actor,
            text,
        }]
    }
}

/// Roleblocks one player.
#[derive(Debug)]
pub struct Escort {
    faction: Arc<Faction>,
}

impl Escort {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self { faction }
    }
}

impl Role for Escort {
    fn name(&self) -> &'static str {
        "Escort"
    }

    fn description(&self) -> &'static str {
        "You may roleblock somebody each night."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Town Support"]
    }

    fn action(&self) -> Option<ActionSpec> {
        Some(single_target(
            ActionKind::Block,
            Priority::ESCORT,
            "block a player",
        ))
    }

    fn set_up(&self, action: &NightAction) -> Vec<Manipulation> {
        vec![Manipulation::Block {
            blocker: action.actor,
            target: action.target(),
        }]
    }
}

/// Shoots at night; killing a Townie brings guilt and a forced suicide.
#[derive(Debug)]
pub struct Vigilante {
    faction: Arc<Faction>,
    guilt: bool,
}

impl Vigilante {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self {
            faction,
            guilt: false,
        }
    }

    /// Whether the vigilante killed a Townie.
    pub const fn is_guilty(&self) -> bool {
        self.guilt
    }
}

impl Role for Vigilante {
    fn name(&self) -> &'static str {
        "Vigilante"
    }

    fn description(&self) -> &'static str {
        "You may shoot someone every night."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Town Killing"]
    }

    fn action(&self) -> Option<ActionSpec> {
        Some(single_target(
            ActionKind::Kill,
            Priority::KILL,
            "shoot a player",
        ))
    }

    fn can_do_action(&self, ctx: &RoleContext<'_>) -> Eligibility {
        if !ctx.me.alive {
            return Eligibility::no("Dead players cannot act.");
        }
        if self.guilt {
            return Eligibility::no("You cannot shoot tonight due to guilt.");
        }
        Eligibility::Eligible
    }

    fn passive_action(&self, ctx: &RoleContext<'_>) -> Option<PassiveAction> {
        (self.guilt && ctx.me.alive).then(|| PassiveAction {
            kind: ActionKind::Kill,
            priority: Priority::VIGI_SUICIDE,
            targets: vec![ctx.me.id()],
        })
    }

    fn resolve(&self, action: &NightAction, _view: &NightView<'_>) -> Vec<Effect> {
        if action.passive {
            return vec![Effect::Kill {
                attacker: action.actor,
                target: action.actor,
                notice: "You could not get over the guilt of killing a town member and shot yourself.",
                piercing: true,
            }];
        }
        vec![Effect::Kill {
            attacker: action.actor,
            target: action.target(),
            notice: "You were shot by a Vigilante.",
            piercing: false,
        }]
    }

    fn tear_down(&mut self, outcome: &ActionOutcome) -> Vec<Effect> {
        if outcome.kind == ActionKind::Kill
            && outcome.target_died
            && outcome.target_faction == Some(FactionId::Town)
            && outcome.target != Some(outcome.actor)
        {
            self.guilt = true;
        }
        Vec::new()
    }
}

/// Goes on alert and kills everyone who visits.
#[derive(Debug)]
pub struct Veteran {
    faction: Arc<Faction>,
    alerts: u8,
}

impl Veteran {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self {
            faction,
            alerts: VETERAN_ALERTS,
        }
    }
}

impl Role for Veteran {
    fn name(&self) -> &'static str {
        "Veteran"
    }

    fn description(&self) -> &'static str {
        "You may go on alert a limited number of nights, killing anyone who visits you."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Town Killing"]
    }

    fn action(&self) -> Option<ActionSpec> {
        Some(self_action(
            ActionKind::Alert,
            Priority::VETERAN_ALERT,
            false,
            "go on alert",
        ))
    }

    fn can_do_action(&self, ctx: &RoleContext<'_>) -> Eligibility {
        charged(ctx, self.alerts, "You have no alerts left.")
    }

    fn set_up(&self, action: &NightAction) -> Vec<Manipulation> {
        vec![Manipulation::Alert {
            veteran: action.actor,
        }]
    }

    fn on_visit(&self, me: UserId, visitor: UserId, record: &NightRecord) -> Vec<Effect> {
        if !record.alerted.contains(&me) {
            return Vec::new();
        }
        vec![Effect::Kill {
            attacker: me,
            target: visitor,
            notice: "You were shot by the Veteran you visited.",
            piercing: true,
        }]
    }

    fn tear_down(&mut self, outcome: &ActionOutcome) -> Vec<Effect> {
        if outcome.kind == ActionKind::Alert {
            self.alerts = self.alerts.saturating_sub(1);
        }
        Vec::new()
    }
}

/// Revives one dead Townie, once per game.
#[derive(Debug)]
pub struct Retributionist {
    faction: Arc<Faction>,
    has_revived: bool,
}

impl Retributionist {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self {
            faction,
            has_revived: false,
        }
    }
}

impl Role for Retributionist {
    fn name(&self) -> &'static str {
        "Retributionist"
    }

    fn description(&self) -> &'static str {
        "You may revive a dead Townie at night."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Town Support"]
    }

    fn unique(&self) -> bool {
        true
    }

    fn action(&self) -> Option<ActionSpec> {
        Some(single_target(
            ActionKind::Revive,
            Priority::RETRIBUTIONIST,
            "revive a player",
        ))
    }

    fn can_do_action(&self, ctx: &RoleContext<'_>) -> Eligibility {
        if !ctx.me.alive {
            return Eligibility::no("Dead players cannot act.");
        }
        if self.has_revived {
            return Eligibility::no("You have already revived a player.");
        }
        if !ctx.players.iter().any(|p| self.can_target(ctx, p).is_ok()) {
            return Eligibility::no("There are no valid targets.");
        }
        Eligibility::Eligible
    }

    fn can_target(&self, _ctx: &RoleContext<'_>, target: &Player) -> Result<(), String> {
        if target.alive || target.faction_id() != Some(FactionId::Town) {
            return Err(String::from("You can only target dead Townies."));
        }
        if target.cleaned {
            return Err(String::from("You cannot revive cleaned players."));
        }
        if target.role().is_some_and(|role| role.unique()) {
            return Err(String::from("You cannot revive unique roles."));
        }
        Ok(())
    }

    fn resolve(&self, action: &NightAction, _view: &NightView<'_>) -> Vec<Effect> {
        vec![Effect::Revive {
            reviver: action.actor,
            target: action.target(),
        }]
    }

    fn tear_down(&mut self, outcome: &ActionOutcome) -> Vec<Effect> {
        if outcome.kind == ActionKind::Revive {
            self.has_revived = true;
        }
        Vec::new()
    }
}

/// Blows up the player who hammered them.
#[derive(Debug)]
pub struct SuperSaint {
    faction: Arc<Faction>,
}

impl SuperSaint {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self { faction }
    }
}

impl Role for SuperSaint {
    fn name(&self) -> &'static str {
        "Super Saint"
    }

    fn description(&self) -> &'static str {
        "You will blow up the last person to lynch you!"
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn on_lynch(&mut self, ctx: &LynchContext) -> Vec<Effect> {
        let Some(hammer) = ctx.voters.last() else {
            return Vec::new();
        };
        vec![
            Effect::Announce {
                text: String::from("**BOOOOOOOOOOOOOOM!!!**"),
            },
            Effect::Kill {
                attacker: ctx.me,
                target: hammer.id,
                notice: "You hammered the Super Saint and were blown up!",
                piercing: true,
            },
            Effect::Announce {
                text: format!(
                    "{} hammered the super saint and was blown up! They were a *{}*.",
                    hammer.name, hammer.display_role
                ),
            },
        ]
    }
}
