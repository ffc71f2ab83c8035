//! Mafia roles. Mafia members know each other and never target a teammate.

use std::sync::Arc;

use godfather_types::{ActionKind, Priority};

use crate::effects::Effect;
use crate::faction::{Faction, FactionId};
use crate::night::NightAction;
use crate::player::Player;
use crate::role::{ActionOutcome, ActionSpec, Eligibility, NightView, Role, RoleContext};
use crate::roles::{charged, single_target};

/// Starting cleans for a Janitor.
pub const JANITOR_CLEANS: u8 = 3;

const MAFIA_KILL: &str = "You were shot by a member of the Mafia.";

fn not_a_teammate(ctx: &RoleContext<'_>, target: &Player) -> Result<(), String> {
    if !target.alive {
        return Err(String::from("You cannot target dead players."));
    }
    if target.id() == ctx.me.id() {
        return Err(String::from("You cannot target yourself."));
    }
    if target.faction_id() == Some(FactionId::Mafia) {
        return Err(String::from("You cannot target a member of the Mafia."));
    }
    Ok(())
}

fn mafia_kill(action: &NightAction) -> Vec<Effect> {
    vec![Effect::Kill {
        attacker: action.actor,
        target: action.target(),
        notice: MAFIA_KILL,
        piercing: false,
    }]
}

fn report_failed_kill(outcome: &ActionOutcome) -> Vec<Effect> {
    if outcome.kind == ActionKind::Kill && !outcome.target_died {
        return vec![Effect::Notify {
            to: outcome.actor,
            text: String::from("Your target was too strong to kill!"),
        }];
    }
    Vec::new()
}

/// The Mafia's hitman.
#[derive(Debug)]
pub struct Goon {
    faction: Arc<Faction>,
}

impl Goon {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self { faction }
    }
}

impl Role for Goon {
    fn name(&self) -> &'static str {
        "Goon"
    }

    fn description(&self) -> &'static str {
        "You may shoot someone every night."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Mafia Killing"]
    }

    fn action(&self) -> Option<ActionSpec> {
        Some(single_target(
            ActionKind::Kill,
            Priority::KILL,
            "shoot a player",
        ))
    }

    fn can_target(&self, ctx: &RoleContext<'_>, target: &Player) -> Result<(), String> {
        not_a_teammate(ctx, target)
    }

    fn resolve(&self, action: &NightAction, _view: &NightView<'_>) -> Vec<Effect> {
        mafia_kill(action)
    }

    fn tear_down(&mut self, outcome: &ActionOutcome) -> Vec<Effect> {
        report_failed_kill(outcome)
    }
}

/// Leader of the Mafia. Reads innocent and survives ordinary kills; on
/// death the first living Goon takes over.
#[derive(Debug)]
pub struct Godfather {
    faction: Arc<Faction>,
}

impl Godfather {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self { faction }
    }
}

impl Role for Godfather {
    fn name(&self) -> &'static str {
        "Godfather"
    }

    fn description(&self) -> &'static str {
        "You may shoot someone every night. You appear innocent to investigators and cannot be killed at night."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Mafia Killing"]
    }

    fn unique(&self) -> bool {
        true
    }

    fn action(&self) -> Option<ActionSpec> {
        Some(single_target(
            ActionKind::Kill,
            Priority::KILL,
            "shoot a player",
        ))
    }

    fn can_target(&self, ctx: &RoleContext<'_>, target: &Player) -> Result<(), String> {
        not_a_teammate(ctx, target)
    }

    fn resolve(&self, action: &NightAction, _view: &NightView<'_>) -> Vec<Effect> {
        mafia_kill(action)
    }

    fn tear_down(&mut self, outcome: &ActionOutcome) -> Vec<Effect> {
        report_failed_kill(outcome)
    }

    fn on_death(&self, ctx: &RoleContext<'_>) -> Vec<Effect> {
        ctx.players
            .alive()
            .find(|p| p.role_name() == Some("Goon"))
            .map(|heir| Effect::Promote {
                target: heir.id(),
                role: "Godfather",
            })
            .into_iter()
            .collect()
    }

    fn innocence_modifier(&self) -> Option<bool> {
        Some(true)
    }

    fn defense(&self) -> u8 {
        1
    }
}

/// Makes one player read guilty for the night.
#[derive(Debug)]
pub struct Framer {
    faction: Arc<Faction>,
}

impl Framer {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self { faction }
    }
}

impl Role for Framer {
    fn name(&self) -> &'static str {
        "Framer"
    }

    fn description(&self) -> &'static str {
        "You may frame one person each night so they appear suspicious to investigators."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Mafia Deception"]
    }

    fn action(&self) -> Option<ActionSpec> {
        Some(single_target(
            ActionKind::Frame,
            Priority::FRAMER,
            "frame a player",
        ))
    }

    fn can_target(&self, ctx: &RoleContext<'_>, target: &Player) -> Result<(), String> {
        not_a_teammate(ctx, target)
    }

    fn resolve(&self, action: &NightAction, _view: &NightView<'_>) -> Vec<Effect> {
        vec![Effect::Frame {
            target: action.target(),
        }]
    }
}

/// Hides the role of a player who dies the same night.
#[derive(Debug)]
pub struct Janitor {
    faction: Arc<Faction>,
    cleans: u8,
}

impl Janitor {
    /// Create the role.
    pub const fn new(faction: Arc<Faction>) -> Self {
        Self {
            faction,
            cleans: JANITOR_CLEANS,
        }
    }

    /// Cleans left.
    pub const fn cleans(&self) -> u8 {
        self.cleans
    }
}

impl Role for Janitor {
    fn name(&self) -> &'static str {
        "Janitor"
    }

    fn description(&self) -> &'static str {
        "You may clean a player at night. If they die, their role is hidden from everyone but you."
    }

    fn faction(&self) -> &Arc<Faction> {
        &self.faction
    }

    fn categories(&self) -> &'static [&'static str] {
        &["Mafia Deception"]
    }

    fn action(&self) -> Option<ActionSpec> {
        Some(single_target(
            ActionKind::Clean,
            Priority::JANITOR,
            "clean a player",
        ))
    }

    fn can_do_action(&self, ctx: &RoleContext<'_>) -> Eligibility {
        charged(ctx, self.cleans, "You have no cleans left.")
    }

    fn can_target(&self, ctx: &RoleContext<'_>, target: &Player) -> Result<(), String> {
        not_a_teammate(ctx, target)
    }

    fn resolve(&self, action: &NightAction, _view: &NightView<'_>) -> Vec<Effect> {
        vec![Effect::Clean {
            janitor: action.actor,
            target: action.target(),
        }]
    }

    fn tear_down(&mut self, outcome: &ActionOutcome) -> Vec<Effect> {
        if outcome.kind == ActionKind::Clean && outcome.target_died {
            self.cleans = self.cleans.saturating_sub(1);
        }
        Vec::new()
    }
}
