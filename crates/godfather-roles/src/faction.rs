//! Factions and their win conditions.
//!
//! A [`Faction`] is built once per catalogue and shared between every role
//! that belongs to it through an [`Arc`]. It never changes after
//! construction.

use std::sync::Arc;

use godfather_types::DeathReason;

use crate::player::Player;
use crate::players::PlayerRegistry;

/// Stable identity of a faction.
///
/// The declaration order is the evaluation order used when more than one
/// faction's win predicate holds at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FactionId {
    /// The uninformed majority.
    Town,
    /// The informed minority.
    Mafia,
    /// A lone night killer.
    SerialKiller,
    /// Wins by getting lynched.
    Jester,
    /// Wins by staying alive.
    Survivor,
}

impl FactionId {
    /// Dotted identifier, `neutral.*` for neutral factions.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Town => "town",
            Self::Mafia => "mafia",
            Self::SerialKiller => "neutral.serialkiller",
            Self::Jester => "neutral.jester",
            Self::Survivor => "neutral.survivor",
        }
    }

    /// Whether members read innocent to investigators unless a role
    /// modifier says otherwise.
    pub const fn reads_innocent(self) -> bool {
        matches!(self, Self::Town | Self::Jester | Self::Survivor)
    }

    /// Whether this faction stops the town from winning while alive.
    pub const fn is_hostile(self) -> bool {
        matches!(self, Self::Mafia | Self::SerialKiller)
    }
}

/// When a faction as a whole has won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinCondition {
    /// No hostile player is left alive.
    EliminateHostiles,
    /// The faction is at least half of the living and no rival killer lives.
    Parity,
    /// The faction's own members are never part of a team win.
    Never,
}

/// A win a single player can earn regardless of team outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndependentWin {
    /// The player was lynched.
    Lynched,
    /// The player is alive when the game ends.
    Survived,
}

/// A group of roles sharing a win condition.
#[derive(Debug)]
pub struct Faction {
    /// Stable identity.
    pub id: FactionId,
    /// Display name, e.g. `Mafia`.
    pub name: &'static str,
    /// Category label used in role listings.
    pub category: &'static str,
    /// Player-facing win condition text.
    pub win_con: &'static str,
    /// Whether members learn who their teammates are.
    pub informed: bool,
    win: WinCondition,
    independent: Option<IndependentWin>,
}

impl Faction {
    /// Whether this is a neutral faction.
    pub fn is_neutral(&self) -> bool {
        self.category == "Neutral"
    }

    /// Evaluate the team win predicate over the whole roster.
    pub fn has_won(&self, players: &PlayerRegistry) -> bool {
        let alive = players.alive_count();
        let own = count_alive(players, self.id);
        match self.win {
            WinCondition::EliminateHostiles => {
                alive > 0
                    && players
                        .alive()
                        .filter_map(Player::faction_id)
                        .all(|id| !id.is_hostile())
            }
            WinCondition::Parity => {
                let rivals = players
                    .alive()
                    .filter_map(Player::faction_id)
                    .any(|id| id.is_hostile() && id != self.id);
                own > 0 && !rivals && own >= alive.saturating_sub(own)
            }
            WinCondition::Never => false,
        }
    }

    /// Evaluate the independent win predicate for one player.
    pub fn has_won_independent(&self, player: &Player) -> bool {
        match self.independent {
            Some(IndependentWin::Lynched) => {
                !player.alive && matches!(player.death_reason, Some(DeathReason::Lynched { .. }))
            }
            Some(IndependentWin::Survived) => player.alive,
            None => false,
        }
    }

    /// Whether this faction has an independent win predicate.
    pub const fn has_independent_win(&self) -> bool {
        self.independent.is_some()
    }
}

impl core::fmt::Display for Faction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name)
    }
}

fn count_alive(players: &PlayerRegistry, id: FactionId) -> usize {
    players
        .alive()
        .filter(|p| p.faction_id() == Some(id))
        .count()
}

/// The shared faction instances handed to roles.
#[derive(Debug, Clone)]
pub struct Factions {
    /// Town.
    pub town: Arc<Faction>,
    /// Mafia.
    pub mafia: Arc<Faction>,
    /// Serial Killer.
    pub serial_killer: Arc<Faction>,
    /// Jester.
    pub jester: Arc<Faction>,
    /// Survivor.
    pub survivor: Arc<Faction>,
}

impl Factions {
    /// Build the standard faction set.
    pub fn standard() -> Self {
        Self {
            town: Arc::new(Faction {
                id: FactionId::Town,
                name: "Town",
                category: "Town",
                win_con: "Lynch every criminal and evildoer.",
                informed: false,
                win: WinCondition::EliminateHostiles,
                independent: None,
            }),
            mafia: Arc::new(Faction {
                id: FactionId::Mafia,
                name: "Mafia",
                category: "Mafia",
                win_con: "Kill anyone that will not submit to the Mafia.",
                informed: true,
                win: WinCondition::Parity,
                independent: None,
            }),
            serial_killer: Arc::new(Faction {
                id: FactionId::SerialKiller,
                name: "Serial Killer",
                category: "Neutral",
                win_con: "Kill everyone who would oppose you.",
                informed: false,
                win: WinCondition::Parity,
                independent: None,
            }),
            jester: Arc::new(Faction {
                id: FactionId::Jester,
                name: "Jester",
                category: "Neutral",
                win_con: "Get yourself lynched by any means necessary.",
                informed: false,
                win: WinCondition::Never,
                independent: Some(IndependentWin::Lynched),
            }),
            survivor: Arc::new(Faction {
                id: FactionId::Survivor,
                name: "Survivor",
                category: "Neutral",
                win_con: "Live to the end of the game.",
                informed: false,
                win: WinCondition::Never,
                independent: Some(IndependentWin::Survived),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::RoleCatalog;
    use crate::testing::roster;
    use godfather_types::UserId;

    #[test]
    fn town_wins_once_hostiles_are_gone() {
        let catalog = RoleCatalog::standard();
        let mut players = roster(&catalog, &["Vanilla", "Cop", "Goon"]);
        let factions = catalog.factions();
        assert!(!factions.town.has_won(&players));

        players.get_mut(UserId(3)).unwrap().alive = false;
        assert!(factions.town.has_won(&players));
        assert!(!factions.mafia.has_won(&players));
    }

    #[test]
    fn mafia_wins_at_parity() {
        let catalog = RoleCatalog::standard();
        let mut players = roster(&catalog, &["Vanilla", "Cop", "Goon"]);
        let factions = catalog.factions();
        assert!(!factions.mafia.has_won(&players));

        players.get_mut(UserId(1)).unwrap().alive = false;
        assert!(factions.mafia.has_won(&players));
    }

    #[test]
    fn mafia_cannot_win_while_serial_killer_lives() {
        let catalog = RoleCatalog::standard();
        let players = roster(&catalog, &["Goon", "Goon", "Serial Killer"]);
        assert!(!catalog.factions().mafia.has_won(&players));
    }

    #[test]
    fn survivor_wins_independently_when_alive() {
        let catalog = RoleCatalog::standard();
        let mut players = roster(&catalog, &["Survivor", "Goon"]);
        let survivor = catalog.factions().survivor.clone();
        assert!(survivor.has_won_independent(players.get(UserId(1)).unwrap()));

        players.get_mut(UserId(1)).unwrap().alive = false;
        assert!(!survivor.has_won_independent(players.get(UserId(1)).unwrap()));
        assert!(!survivor.has_won(&players));
    }

    #[test]
    fn jester_needs_a_lynch() {
        let catalog = RoleCatalog::standard();
        let mut players = roster(&catalog, &["Jester", "Goon"]);
        let jester = catalog.factions().jester.clone();
        let p = players.get_mut(UserId(1)).unwrap();
        p.kill(DeathReason::NightKill { cycle: 1 });
        assert!(!jester.has_won_independent(p));
        p.death_reason = Some(DeathReason::Lynched { cycle: 2 });
        assert!(jester.has_won_independent(p));
    }

    #[test]
    fn innocence_defaults_follow_faction() {
        assert!(FactionId::Town.reads_innocent());
        assert!(FactionId::Jester.reads_innocent());
        assert!(!FactionId::Mafia.reads_innocent());
        assert!(!FactionId::SerialKiller.reads_innocent());
    }
}
