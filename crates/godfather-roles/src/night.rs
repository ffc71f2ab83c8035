//! Night action collection and resolution.
//!
//! [`NightActions`] moves through three states each night:
//!
//! 1. **Collecting** -- each player holds at most one slot; resubmitting
//!    overwrites it, withdrawing empties it.
//! 2. **Resolving** -- no submissions are accepted while the pipeline runs.
//! 3. **Resolved** -- results have been returned; [`NightActions::reset`]
//!    reopens collection for the next night.
//!
//! Resolution is a fixed pipeline over the actions sorted by ascending
//! priority, ties broken by submission sequence:
//!
//! - gather submitted actions that are still valid, plus passive ones
//! - manipulation sweep (roleblocks, alerts)
//! - visit sweep (visitor lists, on-visit reactions)
//! - effect sweep, applying each action's effects immediately
//! - cleans, tear-down, on-death hooks
//!
//! Invalid actions are dropped with a debug log; they never abort the batch.

use std::collections::BTreeMap;

use godfather_types::{ActionKind, DeathReason, Priority, UserId};
use tracing::{debug, info};

use crate::catalog::RoleCatalog;
use crate::effects::{Effect, EffectContext, Manipulation, NightRecord, Notification, Report};
use crate::error::ActionError;
use crate::player::Player;
use crate::players::PlayerRegistry;
use crate::role::{ActionOutcome, BlockReaction, Eligibility, Role, RoleContext};

/// One collected night action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightAction {
    /// Who acts.
    pub actor: UserId,
    /// What they do.
    pub kind: ActionKind,
    /// Whom they target. Empty for self-acting kinds.
    pub targets: Vec<UserId>,
    /// Resolution order key.
    pub priority: Priority,
    /// Submission sequence, the tie-break within a priority.
    pub seq: u64,
    /// Whether roleblocks stop it.
    pub can_block: bool,
    /// Added by the role at resolution time rather than submitted.
    pub passive: bool,
}

impl NightAction {
    /// The first target, or the actor for self-acting kinds.
    pub fn target(&self) -> UserId {
        self.targets.first().copied().unwrap_or(self.actor)
    }
}

/// Where the night is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NightState {
    /// Accepting submissions.
    Collecting,
    /// Pipeline running.
    Resolving,
    /// Results returned, awaiting reset.
    Resolved,
}

#[derive(Debug)]
struct Pending {
    action: NightAction,
    blocked: bool,
}

/// Collects and resolves one night's actions.
#[derive(Debug)]
pub struct NightActions {
    state: NightState,
    slots: BTreeMap<UserId, NightAction>,
    next_seq: u64,
}

impl Default for NightActions {
    fn default() -> Self {
        Self::new()
    }
}

impl NightActions {
    /// A collector in the `Collecting` state.
    pub const fn new() -> Self {
        Self {
            state: NightState::Collecting,
            slots: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> NightState {
        self.state
    }

    /// The action currently held for `actor`.
    pub fn submitted(&self, actor: UserId) -> Option<&NightAction> {
        self.slots.get(&actor)
    }

    /// Number of held actions.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no action is held.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Validate and store an action, replacing any earlier one by the same
    /// actor.
    pub fn submit(
        &mut self,
        actor: UserId,
        kind: ActionKind,
        targets: Vec<UserId>,
        players: &PlayerRegistry,
        cycle: u32,
    ) -> Result<(), ActionError> {
        if self.state != NightState::Collecting {
            return Err(ActionError::Closed);
        }
        let me = players.get(actor).ok_or(ActionError::NotPlaying(actor))?;
        let role = me.role().ok_or(ActionError::NoAction)?;
        let spec = role.action().ok_or(ActionError::NoAction)?;
        if spec.kind != kind {
            return Err(ActionError::WrongKind {
                expected: spec.kind,
                requested: kind,
            });
        }

        let ctx = RoleContext { me, players, cycle };
        if let Eligibility::Ineligible(reason) = role.can_do_action(&ctx) {
            return Err(ActionError::Ineligible { reason });
        }
        if targets.len() != spec.targets {
            return Err(ActionError::WrongTargetCount {
                expected: spec.targets,
                got: targets.len(),
            });
        }
        for &id in &targets {
            let target = players.get(id).ok_or(ActionError::UnknownTarget(id))?;
            role.can_target(&ctx, target)
                .map_err(|reason| ActionError::InvalidTarget { reason })?;
        }

        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        debug!(?actor, %kind, ?targets, seq, "night action submitted");
        self.slots.insert(
            actor,
            NightAction {
                actor,
                kind,
                targets,
                priority: spec.priority,
                seq,
                can_block: spec.can_block,
                passive: false,
            },
        );
        Ok(())
    }

    /// Withdraw `actor`'s action. Returns whether one was held.
    pub fn withdraw(&mut self, actor: UserId) -> Result<bool, ActionError> {
        if self.state != NightState::Collecting {
            return Err(ActionError::Closed);
        }
        Ok(self.slots.remove(&actor).is_some())
    }

    /// Move `old`'s held action to a substitute in the same seat. Targets
    /// naming `old` follow the seat as well.
    pub fn replace_identity(&mut self, old: UserId, new: UserId) {
        if let Some(mut action) = self.slots.remove(&old) {
            action.actor = new;
            self.slots.insert(new, action);
        }
        for id in self.slots.values_mut().flat_map(|a| a.targets.iter_mut()) {
            if *id == old {
                *id = new;
            }
        }
    }

    /// Reopen collection for the next night.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.state = NightState::Collecting;
    }

    /// Run the resolution pipeline against the roster.
    ///
    /// Only a `Collecting` night resolves; any other state returns an empty
    /// report without touching the roster.
    pub fn resolve(
        &mut self,
        players: &mut PlayerRegistry,
        catalog: &RoleCatalog,
        cycle: u32,
    ) -> Report {
        if self.state != NightState::Collecting {
            debug!(cycle, state = ?self.state, "resolve skipped");
            return Report::default();
        }
        self.state = NightState::Resolving;

        let mut pending = self.gather(players, cycle);
        pending.sort_by_key(|p| (p.action.priority, p.action.seq));

        let mut record = NightRecord::default();
        let mut report = Report::default();
        manipulate(&mut pending, players, &mut record, &mut report);
        let reactions = register_visits(&pending, players, &record);

        {
            let mut ctx = EffectContext {
                players: &mut *players,
                catalog,
                record: &mut record,
                report: &mut report,
                cycle,
                death_reason: DeathReason::NightKill { cycle },
            };
            ctx.apply_all(reactions);

            for p in pending.iter().filter(|p| !p.blocked) {
                let effects = {
                    let view = ctx.view();
                    let Some((me, role)) = view
                        .players
                        .get(p.action.actor)
                        .and_then(|me| me.role().map(|role| (me, role)))
                    else {
                        continue;
                    };
                    // Earlier effects may have killed the actor.
                    let still_able = p.action.passive
                        || role
                            .can_do_action(&RoleContext {
                                me,
                                players: view.players,
                                cycle,
                            })
                            .is_eligible();
                    if !still_able {
                        debug!(actor = ?p.action.actor, kind = ?p.action.kind, "action by fallen actor dropped");
                        continue;
                    }
                    role.resolve(&p.action, &view)
                };
                ctx.apply_all(effects);
            }

            apply_cleans(&mut ctx);
            tear_down(&pending, &mut ctx);
            ctx.run_death_hooks(0);
        }

        for player in players.iter_mut() {
            player.visitors.clear();
        }
        self.slots.clear();
        self.state = NightState::Resolved;
        info!(
            cycle,
            actions = pending.len(),
            deaths = report.deaths.len(),
            "night resolved"
        );
        report
    }

    /// Submitted actions that are still valid, plus passive actions.
    fn gather(&self, players: &PlayerRegistry, cycle: u32) -> Vec<Pending> {
        let mut pending = Vec::with_capacity(self.slots.len());
        for action in self.slots.values() {
            let Some(me) = players.get(action.actor) else {
                debug!(actor = ?action.actor, "action by departed player dropped");
                continue;
            };
            let Some(role) = me.role() else {
                continue;
            };
            let ctx = RoleContext { me, players, cycle };
            if !role.can_do_action(&ctx).is_eligible() {
                debug!(actor = ?action.actor, "action by ineligible player dropped");
                continue;
            }
            let targets_valid = action.targets.iter().all(|&id| {
                players
                    .get(id)
                    .is_some_and(|target| role.can_target(&ctx, target).is_ok())
            });
            if !targets_valid {
                debug!(actor = ?action.actor, targets = ?action.targets, "action on invalid target dropped");
                continue;
            }
            pending.push(Pending {
                action: action.clone(),
                blocked: false,
            });
        }

        let mut seq = self.next_seq;
        for me in players.iter() {
            let Some(role) = me.role() else {
                continue;
            };
            let ctx = RoleContext { me, players, cycle };
            if let Some(passive) = role.passive_action(&ctx) {
                pending.push(Pending {
                    action: NightAction {
                        actor: me.id(),
                        kind: passive.kind,
                        targets: passive.targets,
                        priority: passive.priority,
                        seq,
                        can_block: false,
                        passive: true,
                    },
                    blocked: false,
                });
                seq = seq.saturating_add(1);
            }
        }
        pending
    }
}

/// Manipulation sweep in priority order. A blocked action does not get to
/// manipulate others.
fn manipulate(
    pending: &mut [Pending],
    players: &PlayerRegistry,
    record: &mut NightRecord,
    report: &mut Report,
) {
    for i in 0..pending.len() {
        let manipulations = match pending.get(i) {
            Some(p) if !p.blocked => players
                .get(p.action.actor)
                .and_then(Player::role)
                .map(|role| role.set_up(&p.action))
                .unwrap_or_default(),
            _ => continue,
        };
        for manipulation in manipulations {
            match manipulation {
                Manipulation::Alert { veteran } => {
                    record.alerted.insert(veteran);
                }
                Manipulation::Block { blocker, target } => {
                    block(pending, players, record, report, blocker, target);
                }
            }
        }
    }
}

fn block(
    pending: &mut [Pending],
    players: &PlayerRegistry,
    record: &mut NightRecord,
    report: &mut Report,
    blocker: UserId,
    target: UserId,
) {
    let reaction = players
        .get(target)
        .and_then(Player::role)
        .map_or(BlockReaction::Blocked, Role::on_roleblock);
    let mut blocked_any = false;
    for p in pending
        .iter_mut()
        .filter(|p| p.action.actor == target && p.action.can_block && !p.blocked)
    {
        match reaction {
            BlockReaction::Retaliate => {
                debug!(?blocker, ?target, "roleblock redirected onto blocker");
                p.action.targets = vec![blocker];
            }
            BlockReaction::Blocked => {
                debug!(?blocker, ?target, "action roleblocked");
                p.blocked = true;
                blocked_any = true;
            }
        }
    }
    if blocked_any {
        record.blocked.entry(target).or_default().push(blocker);
        report.notifications.push(Notification {
            to: target,
            text: String::from("Somebody occupied your night. You were roleblocked!"),
        });
    }
}

/// Visit sweep. Returns the reactions of visited roles.
fn register_visits(
    pending: &[Pending],
    players: &mut PlayerRegistry,
    record: &NightRecord,
) -> Vec<Effect> {
    let mut reactions = Vec::new();
    for p in pending.iter().filter(|p| !p.blocked && !p.action.passive) {
        let visitor = p.action.actor;
        for &target in &p.action.targets {
            let visited = players.get_mut(target).is_some_and(|t| t.visit(visitor));
            if !visited {
                continue;
            }
            if let Some(role) = players.get(target).and_then(Player::role) {
                reactions.extend(role.on_visit(target, visitor, record));
            }
        }
    }
    reactions
}

/// Cleans only stick to targets that died tonight.
fn apply_cleans(ctx: &mut EffectContext<'_>) {
    let cleans = ctx.record.cleans.clone();
    for (janitor, target) in cleans {
        if !ctx.record.kills.contains_key(&target) {
            continue;
        }
        let Some(player) = ctx.players.get_mut(target) else {
            continue;
        };
        player.cleaned = true;
        let text = format!(
            "You secretly cleaned {}'s body. Their role was {}.",
            player.user.name,
            player.full_role()
        );
        ctx.apply(Effect::Notify { to: janitor, text });
    }
}

fn tear_down(pending: &[Pending], ctx: &mut EffectContext<'_>) {
    for p in pending.iter().filter(|p| !p.blocked) {
        let target = p.action.targets.first().copied();
        let outcome = ActionOutcome {
            actor: p.action.actor,
            kind: p.action.kind,
            target,
            target_died: target.is_some_and(|t| ctx.record.kills.contains_key(&t)),
            target_faction: target
                .and_then(|t| ctx.players.get(t))
                .and_then(Player::faction_id),
        };
        let effects = ctx
            .players
            .get_mut(p.action.actor)
            .and_then(Player::role_mut)
            .map(|role| role.tear_down(&outcome))
            .unwrap_or_default();
        ctx.apply_all(effects);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::role::{LynchContext, VoterInfo};
    use crate::testing::roster;

    fn make_night(roles: &[&str]) -> (RoleCatalog, PlayerRegistry, NightActions) {
        let catalog = RoleCatalog::standard();
        let players = roster(&catalog, roles);
        (catalog, players, NightActions::new())
    }

    fn act(
        night: &mut NightActions,
        players: &PlayerRegistry,
        actor: u64,
        kind: ActionKind,
        target: Option<u64>,
    ) {
        let targets = target.map(UserId).into_iter().collect();
        night
            .submit(UserId(actor), kind, targets, players, 1)
            .unwrap();
    }

    fn messages_to(report: &Report, id: u64) -> Vec<&str> {
        report
            .notifications
            .iter()
            .filter(|n| n.to == UserId(id))
            .map(|n| n.text.as_str())
            .collect()
    }

    #[test]
    fn protection_before_kill_saves_the_victim() {
        let (catalog, mut players, mut night) = make_night(&["Goon", "Doctor", "Vanilla"]);
        act(&mut night, &players, 1, ActionKind::Kill, Some(3));
        act(&mut night, &players, 2, ActionKind::Protect, Some(3));

        let report = night.resolve(&mut players, &catalog, 1);
        assert!(report.deaths.is_empty());
        assert!(players.get(UserId(3)).unwrap().alive);
        assert_eq!(
            messages_to(&report, 2),
            vec!["Your target was attacked last night!"]
        );
        assert!(messages_to(&report, 1).contains(&"Your target was too strong to kill!"));
    }

    #[test]
    fn unprotected_kill_lands() {
        let (catalog, mut players, mut night) = make_night(&["Goon", "Vanilla", "Vanilla"]);
        act(&mut night, &players, 1, ActionKind::Kill, Some(3));

        let report = night.resolve(&mut players, &catalog, 1);
        assert_eq!(report.deaths, vec![UserId(3)]);
        let victim = players.get(UserId(3)).unwrap();
        assert!(!victim.alive);
        assert_eq!(victim.death_reason, Some(DeathReason::NightKill { cycle: 1 }));
        assert_eq!(
            messages_to(&report, 3),
            vec!["You were shot by a member of the Mafia. You have died!"]
        );
    }

    #[test]
    fn resolve_is_idempotent_per_cycle() {
        let (catalog, mut players, mut night) = make_night(&["Goon", "Vanilla", "Vanilla"]);
        act(&mut night, &players, 1, ActionKind::Kill, Some(3));
        assert_eq!(night.resolve(&mut players, &catalog, 1).deaths.len(), 1);

        let again = night.resolve(&mut players, &catalog, 1);
        assert_eq!(again, Report::default());

        night.reset();
        let empty = night.resolve(&mut players, &catalog, 2);
        assert!(empty.deaths.is_empty());
        assert_eq!(players.alive_count(), 2);
    }

    #[test]
    fn submissions_are_closed_after_resolution() {
        let (catalog, mut players, mut night) = make_night(&["Goon", "Vanilla", "Vanilla"]);
        night.resolve(&mut players, &catalog, 1);
        assert_eq!(night.state(), NightState::Resolved);

        let err = night
            .submit(UserId(1), ActionKind::Kill, vec![UserId(2)], &players, 1)
            .unwrap_err();
        assert_eq!(err, ActionError::Closed);
        assert_eq!(night.withdraw(UserId(1)).unwrap_err(), ActionError::Closed);

        night.reset();
        assert_eq!(night.state(), NightState::Collecting);
    }

    #[test]
    fn last_submission_wins() {
        let (catalog, mut players, mut night) = make_night(&["Goon", "Vanilla", "Vanilla"]);
        act(&mut night, &players, 1, ActionKind::Kill, Some(2));
        act(&mut night, &players, 1, ActionKind::Kill, Some(3));
        assert_eq!(night.len(), 1);

        let report = night.resolve(&mut players, &catalog, 1);
        assert_eq!(report.deaths, vec![UserId(3)]);
    }

    #[test]
    fn withdrawn_actions_do_not_resolve() {
        let (catalog, mut players, mut night) = make_night(&["Goon", "Vanilla", "Vanilla"]);
        act(&mut night, &players, 1, ActionKind::Kill, Some(2));
        assert!(night.withdraw(UserId(1)).unwrap());
        assert!(!night.withdraw(UserId(1)).unwrap());
        assert!(night.is_empty());
        assert!(night.resolve(&mut players, &catalog, 1).deaths.is_empty());
    }

    #[test]
    fn submit_validates_against_the_role() {
        let (_catalog, players, mut night) = make_night(&["Cop", "Vanilla", "Goon"]);
        let sub = |night: &mut NightActions, actor: u64, kind, targets: Vec<u64>| {
            let targets = targets.into_iter().map(UserId).collect();
            night.submit(UserId(actor), kind, targets, &players, 1)
        };

        assert_eq!(
            sub(&mut night, 9, ActionKind::Investigate, vec![2]).unwrap_err(),
            ActionError::NotPlaying(UserId(9))
        );
        assert_eq!(
            sub(&mut night, 2, ActionKind::Investigate, vec![1]).unwrap_err(),
            ActionError::NoAction
        );
        assert_eq!(
            sub(&mut night, 1, ActionKind::Kill, vec![2]).unwrap_err(),
            ActionError::WrongKind {
                expected: ActionKind::Investigate,
                requested: ActionKind::Kill,
            }
        );
        assert_eq!(
            sub(&mut night, 1, ActionKind::Investigate, vec![2, 3]).unwrap_err(),
            ActionError::WrongTargetCount {
                expected: 1,
                got: 2
            }
        );
        assert_eq!(
            sub(&mut night, 1, ActionKind::Investigate, vec![7]).unwrap_err(),
            ActionError::UnknownTarget(UserId(7))
        );
        assert!(matches!(
            sub(&mut night, 1, ActionKind::Investigate, vec![1]).unwrap_err(),
            ActionError::InvalidTarget { .. }
        ));
        assert!(matches!(
            sub(&mut night, 3, ActionKind::Kill, vec![3]).unwrap_err(),
            ActionError::InvalidTarget { .. }
        ));
        assert!(night.is_empty());
    }

    #[test]
    fn actions_on_targets_gone_before_resolution_are_dropped() {
        let (catalog, mut players, mut night) = make_night(&["Goon", "Cop", "Vanilla"]);
        act(&mut night, &players, 1, ActionKind::Kill, Some(3));
        act(&mut night, &players, 2, ActionKind::Investigate, Some(3));
        players.get_mut(UserId(3)).unwrap().kill(DeathReason::Modkilled {
            phase: godfather_types::Phase::Night,
            cycle: 1,
        });

        let report = night.resolve(&mut players, &catalog, 1);
        assert!(report.deaths.is_empty());
        assert!(messages_to(&report, 2).is_empty());
        assert_eq!(night.state(), NightState::Resolved);
    }

    #[test]
    fn replaced_actor_keeps_their_action() {
        let (catalog, mut players, mut night) = make_night(&["Goon", "Vanilla", "Vanilla"]);
        act(&mut night, &players, 1, ActionKind::Kill, Some(3));
        players
            .replace(UserId(1), godfather_types::User::new(10, "sub"))
            .unwrap();
        night.replace_identity(UserId(1), UserId(10));

        assert!(night.submitted(UserId(1)).is_none());
        assert_eq!(night.submitted(UserId(10)).unwrap().actor, UserId(10));
        assert_eq!(night.resolve(&mut players, &catalog, 1).deaths, vec![UserId(3)]);
    }

    #[test]
    fn roleblock_stops_the_kill() {
        let (catalog, mut players, mut night) = make_night(&["Escort", "Goon", "Vanilla"]);
        act(&mut night, &players, 2, ActionKind::Kill, Some(3));
        act(&mut night, &players, 1, ActionKind::Block, Some(2));

        let report = night.resolve(&mut players, &catalog, 1);
        assert!(report.deaths.is_empty());
        assert_eq!(
            messages_to(&report, 2),
            vec!["Somebody occupied your night. You were roleblocked!"]
        );
    }

    #[test]
    fn serial_killer_stabs_the_roleblocker() {
        let (catalog, mut players, mut night) =
            make_night(&["Escort", "Serial Killer", "Vanilla"]);
        act(&mut night, &players, 2, ActionKind::Kill, Some(3));
        act(&mut night, &players, 1, ActionKind::Block, Some(2));

        let report = night.resolve(&mut players, &catalog, 1);
        assert_eq!(report.deaths, vec![UserId(1)]);
        assert!(players.get(UserId(3)).unwrap().alive);
    }

    #[test]
    fn frame_lands_before_investigation() {
        let (catalog, mut players, mut night) = make_night(&["Framer", "Cop", "Vanilla"]);
        act(&mut night, &players, 2, ActionKind::Investigate, Some(3));
        act(&mut night, &players, 1, ActionKind::Frame, Some(3));

        let report = night.resolve(&mut players, &catalog, 1);
        assert_eq!(
            messages_to(&report, 2),
            vec!["Your target p3 is suspicious."]
        );

        night.reset();
        act(&mut night, &players, 2, ActionKind::Investigate, Some(3));
        let report = night.resolve(&mut players, &catalog, 2);
        assert_eq!(messages_to(&report, 2), vec!["Your target p3 is innocent."]);
    }

    #[test]
    fn godfather_reads_innocent() {
        let (catalog, mut players, mut night) = make_night(&["Godfather", "Cop", "Vanilla"]);
        act(&mut night, &players, 2, ActionKind::Investigate, Some(1));
        let report = night.resolve(&mut players, &catalog, 1);
        assert_eq!(messages_to(&report, 2), vec!["Your target p1 is innocent."]);
    }

    #[test]
    fn lookout_sees_every_other_visitor() {
        let (catalog, mut players, mut night) =
            make_night(&["Goon", "Lookout", "Vanilla", "Doctor"]);
        act(&mut night, &players, 1, ActionKind::Kill, Some(3));
        act(&mut night, &players, 2, ActionKind::Watch, Some(3));
        act(&mut night, &players, 4, ActionKind::Protect, Some(3));

        let report = night.resolve(&mut players, &catalog, 1);
        assert_eq!(
            messages_to(&report, 2),
            vec!["Your target was visited by p4, p1."]
        );
        assert!(players.iter().all(|p| p.visitors.is_empty()));
    }

    #[test]
    fn same_priority_resolves_in_submission_order() {
        let roles = ["Goon", "Vigilante", "Vanilla", "Vanilla"];

        let (catalog, mut players, mut night) = make_night(&roles);
        act(&mut night, &players, 2, ActionKind::Kill, Some(3));
        act(&mut night, &players, 1, ActionKind::Kill, Some(4));
        let report = night.resolve(&mut players, &catalog, 1);
        assert_eq!(report.deaths, vec![UserId(3), UserId(4)]);

        let (catalog, mut players, mut night) = make_night(&roles);
        act(&mut night, &players, 1, ActionKind::Kill, Some(4));
        act(&mut night, &players, 2, ActionKind::Kill, Some(3));
        let report = night.resolve(&mut players, &catalog, 1);
        assert_eq!(report.deaths, vec![UserId(4), UserId(3)]);
    }

    #[test]
    fn guilty_vigilante_shoots_themselves_next_night() {
        let (catalog, mut players, mut night) = make_night(&["Vigilante", "Vanilla", "Goon"]);
        act(&mut night, &players, 1, ActionKind::Kill, Some(2));
        assert_eq!(night.resolve(&mut players, &catalog, 1).deaths, vec![UserId(2)]);

        night.reset();
        let err = night
            .submit(UserId(1), ActionKind::Kill, vec![UserId(3)], &players, 2)
            .unwrap_err();
        assert_eq!(
            err,
            ActionError::Ineligible {
                reason: String::from("You cannot shoot tonight due to guilt."),
            }
        );

        let report = night.resolve(&mut players, &catalog, 2);
        assert_eq!(report.deaths, vec![UserId(1)]);
        assert!(messages_to(&report, 1).iter().any(|m| m.contains("guilt")));
    }

    #[test]
    fn veteran_on_alert_kills_every_visitor() {
        let (catalog, mut players, mut night) = make_night(&["Veteran", "Doctor", "Goon"]);
        act(&mut night, &players, 1, ActionKind::Alert, None);
        act(&mut night, &players, 2, ActionKind::Protect, Some(1));
        act(&mut night, &players, 3, ActionKind::Kill, Some(1));

        let report = night.resolve(&mut players, &catalog, 1);
        assert_eq!(report.deaths, vec![UserId(2), UserId(3)]);
        assert!(players.get(UserId(1)).unwrap().alive);
    }

    #[test]
    fn actors_shot_on_visit_do_not_act() {
        let (catalog, mut players, mut night) = make_night(&["Veteran", "Framer", "Cop"]);
        act(&mut night, &players, 1, ActionKind::Alert, None);
        act(&mut night, &players, 2, ActionKind::Frame, Some(1));
        act(&mut night, &players, 3, ActionKind::Investigate, Some(1));

        let report = night.resolve(&mut players, &catalog, 1);
        assert_eq!(report.deaths, vec![UserId(2), UserId(3)]);
        assert!(!messages_to(&report, 3).contains(&"Your target p1 is suspicious."));
        assert!(!messages_to(&report, 3).contains(&"Your target p1 is innocent."));
    }

    #[test]
    fn godfather_death_promotes_a_goon() {
        let (catalog, mut players, mut night) =
            make_night(&["Godfather", "Goon", "Veteran", "Vanilla"]);
        act(&mut night, &players, 3, ActionKind::Alert, None);
        act(&mut night, &players, 1, ActionKind::Kill, Some(3));

        let report = night.resolve(&mut players, &catalog, 1);
        assert_eq!(report.deaths, vec![UserId(1)]);
        let heir = players.get(UserId(2)).unwrap();
        assert_eq!(heir.role_name(), Some("Godfather"));
        assert_eq!(heir.full_role(), "Goon -> Godfather");
        assert!(messages_to(&report, 2).contains(&"You have been promoted to Godfather!"));
        assert!(players.get(UserId(3)).unwrap().alive);
    }

    #[test]
    fn janitor_cleans_only_the_dead() {
        let (catalog, mut players, mut night) =
            make_night(&["Goon", "Janitor", "Cop", "Vanilla"]);
        act(&mut night, &players, 1, ActionKind::Kill, Some(3));
        act(&mut night, &players, 2, ActionKind::Clean, Some(3));

        let report = night.resolve(&mut players, &catalog, 1);
        let victim = players.get(UserId(3)).unwrap();
        assert!(victim.cleaned);
        assert_eq!(victim.display_role(), "Cleaned");
        assert_eq!(
            messages_to(&report, 2),
            vec!["You secretly cleaned p3's body. Their role was Cop."]
        );

        night.reset();
        act(&mut night, &players, 2, ActionKind::Clean, Some(4));
        night.resolve(&mut players, &catalog, 2);
        assert!(!players.get(UserId(4)).unwrap().cleaned);
    }

    #[test]
    fn retributionist_revives_once() {
        let (catalog, mut players, mut night) =
            make_night(&["Retributionist", "Cop", "Goon", "Vanilla"]);
        players
            .get_mut(UserId(2))
            .unwrap()
            .kill(DeathReason::NightKill { cycle: 1 });
        assert!(matches!(
            night
                .submit(UserId(1), ActionKind::Revive, vec![UserId(4)], &players, 2)
                .unwrap_err(),
            ActionError::InvalidTarget { .. }
        ));
        night
            .submit(UserId(1), ActionKind::Revive, vec![UserId(2)], &players, 2)
            .unwrap();

        let report = night.resolve(&mut players, &catalog, 2);
        assert_eq!(report.revived, vec![UserId(2)]);
        assert!(report
            .announcements
            .contains(&String::from("p2 was resurrected back to life!")));
        let revived = players.get(UserId(2)).unwrap();
        assert!(revived.alive);
        assert_eq!(revived.revived_on, Some(2));

        night.reset();
        players
            .get_mut(UserId(4))
            .unwrap()
            .kill(DeathReason::NightKill { cycle: 2 });
        let err = night
            .submit(UserId(1), ActionKind::Revive, vec![UserId(4)], &players, 3)
            .unwrap_err();
        assert_eq!(
            err,
            ActionError::Ineligible {
                reason: String::from("You have already revived a player."),
            }
        );
    }

    #[test]
    fn survivor_vest_stops_a_kill() {
        let (catalog, mut players, mut night) = make_night(&["Survivor", "Goon", "Vanilla"]);
        act(&mut night, &players, 1, ActionKind::Vest, None);
        act(&mut night, &players, 2, ActionKind::Kill, Some(1));

        let report = night.resolve(&mut players, &catalog, 1);
        assert!(report.deaths.is_empty());
        assert_eq!(
            messages_to(&report, 1),
            vec!["You were attacked but your defense was too strong!"]
        );
    }

    #[test]
    fn lynched_jester_haunts_a_voter() {
        let (catalog, mut players, mut night) =
            make_night(&["Jester", "Vanilla", "Goon", "Vanilla"]);
        let voters = [2_u64, 3]
            .into_iter()
            .map(|i| VoterInfo {
                id: UserId(i),
                name: format!("p{i}"),
                display_role: String::new(),
            })
            .collect();
        let jester = players.get_mut(UserId(1)).unwrap();
        jester.role_mut().unwrap().on_lynch(&LynchContext {
            me: UserId(1),
            cycle: 1,
            voters,
        });
        jester.kill(DeathReason::Lynched { cycle: 1 });

        assert!(matches!(
            night
                .submit(UserId(1), ActionKind::Haunt, vec![UserId(4)], &players, 1)
                .unwrap_err(),
            ActionError::InvalidTarget { .. }
        ));
        act(&mut night, &players, 1, ActionKind::Haunt, Some(3));
        let report = night.resolve(&mut players, &catalog, 1);
        assert_eq!(report.deaths, vec![UserId(3)]);

        night.reset();
        assert!(matches!(
            night
                .submit(UserId(1), ActionKind::Haunt, vec![UserId(2)], &players, 2)
                .unwrap_err(),
            ActionError::Ineligible { .. }
        ));
    }
}
