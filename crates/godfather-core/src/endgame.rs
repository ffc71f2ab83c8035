//! Win-condition evaluation and the draw-by-timeout streak.

use std::sync::Arc;

use godfather_roles::{Faction, FactionId, Player, PlayerRegistry, RoleCatalog};
use godfather_types::UserId;

/// Consecutive quiet cycles that end the game in a draw.
pub const DRAW_AFTER_CYCLES: u32 = 3;

/// Result of a win check.
#[derive(Debug, Clone)]
pub struct Endgame {
    /// Whether the game is over.
    pub ended: bool,
    /// The winning faction. `None` with `ended` set is a draw.
    pub winner: Option<Arc<Faction>>,
    /// Players who met their own win condition, in roster order.
    pub independent: Vec<UserId>,
}

impl Endgame {
    /// A finished game nobody won as a faction.
    pub const fn draw(independent: Vec<UserId>) -> Self {
        Self {
            ended: true,
            winner: None,
            independent,
        }
    }

    /// Id of the winning faction.
    pub fn winner_id(&self) -> Option<FactionId> {
        self.winner.as_ref().map(|f| f.id)
    }
}

/// Evaluate every win condition over the roster.
///
/// Order of precedence: nobody alive is a draw; two survivors who both
/// hold a stalemate role settle it by rank; otherwise factions are tried
/// in a fixed order and the first one that has won takes the game.
pub fn check_endgame(players: &PlayerRegistry) -> Endgame {
    let independent: Vec<UserId> = players
        .iter()
        .filter(|p| p.faction().is_some_and(|f| f.has_won_independent(p)))
        .map(Player::id)
        .collect();

    let alive: Vec<&Player> = players.alive().collect();
    if alive.is_empty() {
        return Endgame::draw(independent);
    }

    let duel = match alive.as_slice() {
        [a, b] => stalemate_rank(a)
            .zip(stalemate_rank(b))
            .map(|(ra, rb)| if ra <= rb { *a } else { *b }),
        _ => None,
    };
    if let Some(survivor) = duel {
        return Endgame {
            ended: true,
            winner: survivor.faction().cloned(),
            independent,
        };
    }

    let mut factions: Vec<&Arc<Faction>> = players.iter().filter_map(Player::faction).collect();
    factions.sort_by_key(|f| f.id);
    factions.dedup_by_key(|f| f.id);
    let winner = factions
        .into_iter()
        .find(|f| f.has_won(players))
        .cloned();

    Endgame {
        ended: winner.is_some(),
        winner,
        independent,
    }
}

fn stalemate_rank(player: &Player) -> Option<usize> {
    player.role_name().and_then(RoleCatalog::stalemate_rank)
}

/// Tracks cycles in which nobody was lynched and nobody died at night.
///
/// A cycle counts once both its day and its night were quiet. Any lynch or
/// night kill resets the count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Streaks {
    day_without_lynch: bool,
    night_without_kill: bool,
    cycles: u32,
}

impl Streaks {
    /// A day ended without a lynch, by timeout or by a no-lynch majority.
    pub fn day_without_lynch(&mut self) {
        self.day_without_lynch = true;
        self.roll();
    }

    /// Somebody was lynched.
    pub const fn lynched(&mut self) {
        self.day_without_lynch = false;
        self.cycles = 0;
    }

    /// A night resolved with `deaths` casualties. The pre-game night at
    /// cycle 0 never counts as quiet.
    pub fn night_ended(&mut self, deaths: usize, cycle: u32) {
        if deaths == 0 && cycle != 0 {
            self.night_without_kill = true;
        } else {
            self.night_without_kill = false;
            self.cycles = 0;
        }
        self.roll();
    }

    fn roll(&mut self) {
        if self.day_without_lynch && self.night_without_kill {
            self.cycles = self.cycles.saturating_add(1);
            self.day_without_lynch = false;
            self.night_without_kill = false;
        }
    }

    /// Quiet cycles so far.
    pub const fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Whether the game should end in a draw.
    pub const fn is_draw(&self) -> bool {
        self.cycles >= DRAW_AFTER_CYCLES
    }
}
