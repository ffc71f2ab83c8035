//! Effects roles emit and the applier that lands them on the roster.
//!
//! Roles never mutate the roster directly. They return [`Effect`]s (and,
//! during the manipulation sweep, [`Manipulation`]s) which are applied here
//! one at a time, so every later hook observes every earlier mutation.

use std::collections::{BTreeMap, BTreeSet};

use godfather_types::{DeathReason, UserId};
use tracing::{debug, warn};

use crate::catalog::RoleCatalog;
use crate::players::PlayerRegistry;
use crate::role::{NightView, Role, RoleContext};

/// A single state change requested by a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Attempt to kill `target`.
    Kill {
        /// Who attacks.
        attacker: UserId,
        /// Who is attacked.
        target: UserId,
        /// First sentence of the victim's death notice.
        notice: &'static str,
        /// Ignores protection and defense.
        piercing: bool,
    },
    /// Guard `target` from kills for the rest of the night.
    Protect {
        /// Who protects.
        protector: UserId,
        /// Who is protected.
        target: UserId,
    },
    /// Make `target` read guilty for the rest of the night.
    Frame {
        /// Who is framed.
        target: UserId,
    },
    /// Hide `target`'s role if they die tonight.
    Clean {
        /// Who cleans.
        janitor: UserId,
        /// Whose body is cleaned.
        target: UserId,
    },
    /// Bring a dead `target` back.
    Revive {
        /// Who revives.
        reviver: UserId,
        /// Who comes back.
        target: UserId,
    },
    /// `target` survives ordinary kills tonight.
    Vest {
        /// Who wears the vest.
        target: UserId,
    },
    /// Private message to one player.
    Notify {
        /// Recipient.
        to: UserId,
        /// Message body.
        text: String,
    },
    /// Public message to the game channel.
    Announce {
        /// Message body.
        text: String,
    },
    /// Replace `target`'s role with a fresh instance of `role`.
    Promote {
        /// Who is promoted.
        target: UserId,
        /// Catalogue name of the new role.
        role: &'static str,
    },
}

/// A change to the action list made before anyone visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Manipulation {
    /// Roleblock every blockable action of `target`.
    Block {
        /// Who blocks.
        blocker: UserId,
        /// Whose actions are blocked.
        target: UserId,
    },
    /// `veteran` is on alert and kills visitors.
    Alert {
        /// Who is alert.
        veteran: UserId,
    },
}

/// Per-night bookkeeping shared by every hook of the night.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NightRecord {
    /// Protected player to protectors.
    pub protections: BTreeMap<UserId, Vec<UserId>>,
    /// Players reading guilty tonight.
    pub framed: BTreeSet<UserId>,
    /// Roleblocked actor to blockers.
    pub blocked: BTreeMap<UserId, Vec<UserId>>,
    /// Veterans on alert.
    pub alerted: BTreeSet<UserId>,
    /// Players wearing a vest.
    pub vested: BTreeSet<UserId>,
    /// Victim to the attackers whose kill landed.
    pub kills: BTreeMap<UserId, Vec<UserId>>,
    /// Janitor and target pairs, in application order.
    pub cleans: Vec<(UserId, UserId)>,
}

/// A private message produced by resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient.
    pub to: UserId,
    /// Message body.
    pub text: String,
}

/// Everything the caller needs to announce after effects were applied.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    /// Players who went from alive to dead, in order.
    pub deaths: Vec<UserId>,
    /// Players brought back to life.
    pub revived: Vec<UserId>,
    /// Private messages.
    pub notifications: Vec<Notification>,
    /// Public messages.
    pub announcements: Vec<String>,
}

/// Applies effects to the roster under a fixed cause of death.
#[derive(Debug)]
pub struct EffectContext<'a> {
    /// The roster being mutated.
    pub players: &'a mut PlayerRegistry,
    /// Used to instantiate promoted roles.
    pub catalog: &'a RoleCatalog,
    /// Per-night bookkeeping. Outside the night this is a throwaway record.
    pub record: &'a mut NightRecord,
    /// Accumulated results.
    pub report: &'a mut Report,
    /// Current cycle.
    pub cycle: u32,
    /// Recorded on every player killed through this context.
    pub death_reason: DeathReason,
}

impl EffectContext<'_> {
    /// A read-only view of the current state.
    pub fn view(&self) -> NightView<'_> {
        NightView {
            players: &*self.players,
            record: &*self.record,
            cycle: self.cycle,
        }
    }

    /// Apply every effect in order.
    pub fn apply_all(&mut self, effects: impl IntoIterator<Item = Effect>) {
        for effect in effects {
            self.apply(effect);
        }
    }

    /// Apply one effect.
    pub fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Kill {
                attacker,
                target,
                notice,
                piercing,
            } => self.kill(attacker, target, notice, piercing),
            Effect::Protect { protector, target } => {
                self.record
                    .protections
                    .entry(target)
                    .or_default()
                    .push(protector);
            }
            Effect::Frame { target } => {
                self.record.framed.insert(target);
            }
            Effect::Clean { janitor, target } => {
                self.record.cleans.push((janitor, target));
            }
            Effect::Revive { reviver, target } => self.revive(reviver, target),
            Effect::Vest { target } => {
                self.record.vested.insert(target);
            }
            Effect::Notify { to, text } => self.notify(to, text),
            Effect::Announce { text } => self.report.announcements.push(text),
            Effect::Promote { target, role } => self.promote(target, role),
        }
    }

    fn notify(&mut self, to: UserId, text: impl Into<String>) {
        self.report.notifications.push(Notification {
            to,
            text: text.into(),
        });
    }

    fn kill(&mut self, attacker: UserId, target: UserId, notice: &'static str, piercing: bool) {
        let Some(victim) = self.players.get(target) else {
            debug!(?attacker, ?target, "kill on unknown player dropped");
            return;
        };
        if !victim.alive {
            return;
        }

        if !piercing {
            let protectors = self
                .record
                .protections
                .get(&target)
                .cloned()
                .unwrap_or_default();
            if !protectors.is_empty() {
                debug!(?attacker, ?target, "kill stopped by protection");
                self.notify(target, "You were attacked but somebody nursed you back to health!");
                for protector in protectors {
                    self.notify(protector, "Your target was attacked last night!");
                }
                return;
            }

            let defended = victim.role().map_or(0, Role::defense) > 0
                || self.record.vested.contains(&target)
                || self.record.alerted.contains(&target);
            if defended {
                debug!(?attacker, ?target, "kill stopped by defense");
                self.notify(target, "You were attacked but your defense was too strong!");
                return;
            }
        }

        let reason = self.death_reason;
        if self
            .players
            .get_mut(target)
            .is_some_and(|p| p.kill(reason))
        {
            debug!(?attacker, ?target, %reason, "player killed");
            self.record.kills.entry(target).or_default().push(attacker);
            self.report.deaths.push(target);
            self.notify(target, format!("{notice} You have died!"));
        }
    }

    fn revive(&mut self, reviver: UserId, target: UserId) {
        let cycle = self.cycle;
        let Some(player) = self.players.get_mut(target) else {
            return;
        };
        if player.alive {
            return;
        }
        player.revive(cycle);
        let name = player.user.name.clone();
        debug!(?reviver, ?target, "player revived");
        self.report.revived.push(target);
        self.report
            .announcements
            .push(format!("{name} was resurrected back to life!"));
        self.notify(target, "You were revived by a Retributionist!");
    }

    fn promote(&mut self, target: UserId, role: &'static str) {
        let new_role = match self.catalog.create(role) {
            Ok(new_role) => new_role,
            Err(e) => {
                warn!(error = %e, ?target, "promotion to unknown role skipped");
                return;
            }
        };
        if let Some(player) = self.players.get_mut(target) {
            player.assign_role(new_role);
            self.notify(target, format!("You have been promoted to {role}!"));
        }
    }

    /// Run on-death hooks for every death recorded at or after `from`,
    /// including deaths those hooks cause in turn.
    pub fn run_death_hooks(&mut self, from: usize) {
        let mut i = from;
        while let Some(&dead) = self.report.deaths.get(i) {
            let effects = {
                let players = &*self.players;
                players
                    .get(dead)
                    .and_then(|me| {
                        me.role().map(|role| {
                            role.on_death(&RoleContext {
                                me,
                                players,
                                cycle: self.cycle,
                            })
                        })
                    })
                    .unwrap_or_default()
            };
            self.apply_all(effects);
            i = i.saturating_add(1);
        }
    }
}
