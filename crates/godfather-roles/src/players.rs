//! The roster of a single game.
//!
//! [`PlayerRegistry`] owns every [`Player`] in insertion order. The first
//! player is always the host. It also holds the FIFO queue of users
//! waiting to replace someone and the set of players who voted to change
//! the host.

use std::collections::{BTreeSet, VecDeque};

use godfather_types::{User, UserId};

use crate::error::RegistryError;
use crate::faction::FactionId;
use crate::player::Player;

/// Roster, replacement queue, and host vote-kicks for one game.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: Vec<Player>,
    replacements: VecDeque<User>,
    vote_kicks: BTreeSet<UserId>,
}

impl PlayerRegistry {
    /// An empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new player with no role. Duplicate identities are rejected.
    pub fn add(&mut self, user: User) -> Result<&mut Player, RegistryError> {
        if self.contains(user.id) || self.is_replacement(user.id) {
            return Err(RegistryError::AlreadyPlaying(user.name));
        }
        self.players.push(Player::new(user));
        self.players
            .last_mut()
            .ok_or_else(|| RegistryError::NotFound(String::from("new player")))
    }

    /// Remove a player entirely. Only valid before roles are assigned.
    pub fn remove(&mut self, id: UserId) -> Result<Player, RegistryError> {
        let pos = self
            .position(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        self.vote_kicks.remove(&id);
        Ok(self.players.remove(pos))
    }

    /// Whether the identity occupies a seat.
    pub fn contains(&self, id: UserId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: UserId) -> Option<usize> {
        self.players.iter().position(|p| p.id() == id)
    }

    /// Look up by identity.
    pub fn get(&self, id: UserId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    /// Look up by identity, mutably.
    pub fn get_mut(&mut self, id: UserId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id() == id)
    }

    /// Look up by 1-based display index.
    pub fn by_index(&self, index: usize) -> Option<&Player> {
        index.checked_sub(1).and_then(|i| self.players.get(i))
    }

    /// Look up by exact name. Chat users type names in any case, so ASCII
    /// case is ignored, but the whole name must match.
    pub fn by_name(&self, name: &str) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.user.name.eq_ignore_ascii_case(name))
    }

    /// Resolve a player reference as typed in chat: a display index, a
    /// name, or a raw identity.
    pub fn resolve(&self, query: &str) -> Result<&Player, RegistryError> {
        let query = query.trim();
        let numbered = query.parse::<u64>().ok().and_then(|number| {
            usize::try_from(number)
                .ok()
                .and_then(|i| self.by_index(i))
                .or_else(|| self.get(UserId(number)))
        });
        if let Some(player) = numbered {
            return Ok(player);
        }
        self.by_name(query)
            .ok_or_else(|| RegistryError::NotFound(query.to_owned()))
    }

    /// Every player, host first.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Every player, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    /// Living players in roster order.
    pub fn alive(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.alive)
    }

    /// Identities of living players in roster order.
    pub fn alive_ids(&self) -> Vec<UserId> {
        self.alive().map(Player::id).collect()
    }

    /// Number of living players.
    pub fn alive_count(&self) -> usize {
        self.alive().count()
    }

    /// Living members of a faction.
    pub fn alive_in_faction(&self, faction: FactionId) -> impl Iterator<Item = &Player> {
        self.alive()
            .filter(move |p| p.faction_id() == Some(faction))
    }

    /// Number of seats.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// The host, always the first player.
    pub fn host(&self) -> Option<&Player> {
        self.players.first()
    }

    /// Move the current host to the bottom so the next player hosts.
    /// Clears vote-kicks.
    pub fn rotate_host(&mut self) {
        if !self.players.is_empty() {
            self.players.rotate_left(1);
        }
        self.vote_kicks.clear();
    }

    /// Register a vote to change the host. Returns the number of votes.
    pub fn vote_kick(&mut self, voter: UserId) -> Result<usize, RegistryError> {
        if !self.vote_kicks.insert(voter) {
            return Err(RegistryError::AlreadyVotedKick);
        }
        Ok(self.vote_kicks.len())
    }

    /// Drop all host-change votes.
    pub fn clear_vote_kicks(&mut self) {
        self.vote_kicks.clear();
    }

    /// Queue a user as a replacement.
    pub fn add_replacement(&mut self, user: User) -> Result<(), RegistryError> {
        if self.contains(user.id) {
            return Err(RegistryError::AlreadyPlaying(user.name));
        }
        if self.is_replacement(user.id) {
            return Err(RegistryError::AlreadyReplacement(user.name));
        }
        self.replacements.push_back(user);
        Ok(())
    }

    /// Leave the replacement queue. Returns whether the user was queued.
    pub fn remove_replacement(&mut self, id: UserId) -> bool {
        let before = self.replacements.len();
        self.replacements.retain(|u| u.id != id);
        self.replacements.len() != before
    }

    /// Whether the user is queued as a replacement.
    pub fn is_replacement(&self, id: UserId) -> bool {
        self.replacements.iter().any(|u| u.id == id)
    }

    /// Take the longest-waiting replacement.
    pub fn next_replacement(&mut self) -> Option<User> {
        self.replacements.pop_front()
    }

    /// Users waiting to replace someone, oldest first.
    pub fn replacements(&self) -> impl Iterator<Item = &User> {
        self.replacements.iter()
    }

    /// Put `new` into `old`'s seat. Role, liveness, and history stay with
    /// the seat, and every role's remembered ids follow the swap. Votes are
    /// moved by the caller through the vote manager.
    pub fn replace(&mut self, old: UserId, new: User) -> Result<(), RegistryError> {
        if self.contains(new.id) {
            return Err(RegistryError::AlreadyPlaying(new.name));
        }
        let new_id = new.id;
        let seat = self
            .get_mut(old)
            .ok_or_else(|| RegistryError::NotFound(old.to_string()))?;
        seat.user = new;
        self.remove_replacement(new_id);
        self.vote_kicks.remove(&old);
        for player in &mut self.players {
            for visitor in &mut player.visitors {
                if *visitor == old {
                    *visitor = new_id;
                }
            }
            if let Some(role) = player.role_mut() {
                role.replace_identity(old, new_id);
            }
        }
        Ok(())
    }

    /// Player list as shown in chat. Dead players show their role and
    /// cause of death. With `diff`, lines are prefixed for a diff
    /// code block.
    pub fn show(&self, diff: bool, show_replacements: bool) -> String {
        let mut out = String::new();
        for (i, player) in self.players.iter().enumerate() {
            let n = i.saturating_add(1);
            let line = if player.alive {
                if diff {
                    format!("+ {n}. {}", player.user.name)
                } else {
                    format!("{n}. {}", player.user.name)
                }
            } else {
                let reason = player
                    .death_reason
                    .map(|r| format!("; {r}"))
                    .unwrap_or_default();
                if diff {
                    format!("- {n}. {} ({}{reason})", player.user.name, player.display_role())
                } else {
                    format!(
                        "{n}. ~~{}~~ ({}{reason})",
                        player.user.name,
                        player.display_role()
                    )
                }
            };
            out.push_str(&line);
            out.push('\n');
        }
        if show_replacements && !self.replacements.is_empty() {
            let names: Vec<&str> = self.replacements.iter().map(|u| u.name.as_str()).collect();
            out.push_str(&format!("Replacements: {}\n", names.join(", ")));
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::RoleCatalog;
    use crate::testing::roster;

    fn make_registry(names: &[&str]) -> PlayerRegistry {
        let mut registry = PlayerRegistry::new();
        for (i, name) in (1_u64..).zip(names) {
            registry.add(User::new(i, *name)).unwrap();
        }
        registry
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut registry = make_registry(&["alice"]);
        let err = registry.add(User::new(1, "alice")).unwrap_err();
        assert_eq!(err, RegistryError::AlreadyPlaying(String::from("alice")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookups_by_index_name_and_identity() {
        let registry = make_registry(&["alice", "Bob", "carol"]);
        assert_eq!(registry.by_index(2).unwrap().user.name, "Bob");
        assert!(registry.by_index(0).is_none());
        assert!(registry.by_index(4).is_none());
        assert_eq!(registry.by_name("bob").unwrap().id(), UserId(2));
        assert_eq!(registry.resolve("3").unwrap().user.name, "carol");
        assert_eq!(registry.resolve("ALICE").unwrap().id(), UserId(1));
        assert!(registry.resolve("dave").is_err());
    }

    #[test]
    fn name_lookup_needs_the_whole_name() {
        let registry = make_registry(&["alice", "Bob", "bobby"]);
        assert_eq!(registry.by_name("BOB").unwrap().id(), UserId(2));
        assert_eq!(registry.by_name("Bobby").unwrap().id(), UserId(3));
        assert!(registry.by_name("bo").is_none());
        assert!(registry.by_name("alice ").is_none());
    }

    #[test]
    fn host_is_first_and_rotates_to_the_end() {
        let mut registry = make_registry(&["alice", "bob", "carol"]);
        assert_eq!(registry.host().unwrap().user.name, "alice");
        registry.vote_kick(UserId(2)).unwrap();
        registry.rotate_host();
        assert_eq!(registry.host().unwrap().user.name, "bob");
        assert_eq!(registry.by_index(3).unwrap().user.name, "alice");
        // Vote-kicks are cleared, so bob may vote again.
        assert_eq!(registry.vote_kick(UserId(2)).unwrap(), 1);
    }

    #[test]
    fn vote_kick_counts_distinct_voters() {
        let mut registry = make_registry(&["alice", "bob", "carol"]);
        assert_eq!(registry.vote_kick(UserId(2)).unwrap(), 1);
        assert_eq!(
            registry.vote_kick(UserId(2)).unwrap_err(),
            RegistryError::AlreadyVotedKick
        );
        assert_eq!(registry.vote_kick(UserId(3)).unwrap(), 2);
    }

    #[test]
    fn replacements_are_first_in_first_out() {
        let mut registry = make_registry(&["alice"]);
        registry.add_replacement(User::new(10, "xavier")).unwrap();
        registry.add_replacement(User::new(11, "yara")).unwrap();
        assert!(registry.add_replacement(User::new(10, "xavier")).is_err());
        assert!(registry.add_replacement(User::new(1, "alice")).is_err());
        assert_eq!(registry.next_replacement().unwrap().name, "xavier");
        assert!(registry.remove_replacement(UserId(11)));
        assert!(registry.next_replacement().is_none());
    }

    #[test]
    fn replace_keeps_seat_state() {
        let catalog = RoleCatalog::standard();
        let mut registry = roster(&catalog, &["Cop", "Goon", "Vanilla"]);
        registry.get_mut(UserId(2)).unwrap().visit(UserId(1));
        registry.replace(UserId(1), User::new(20, "newbie")).unwrap();

        assert!(registry.get(UserId(1)).is_none());
        let seat = registry.get(UserId(20)).unwrap();
        assert_eq!(seat.role_name(), Some("Cop"));
        assert!(seat.alive);
        assert_eq!(registry.by_index(1).unwrap().id(), UserId(20));
        assert_eq!(registry.get(UserId(2)).unwrap().visitors, vec![UserId(20)]);
    }

    #[test]
    fn replace_rejects_existing_player() {
        let mut registry = make_registry(&["alice", "bob"]);
        assert!(registry.replace(UserId(1), User::new(2, "bob")).is_err());
    }

    #[test]
    fn show_marks_the_dead() {
        let catalog = RoleCatalog::standard();
        let mut registry = roster(&catalog, &["Cop", "Goon"]);
        registry
            .get_mut(UserId(2))
            .unwrap()
            .kill(godfather_types::DeathReason::Lynched { cycle: 1 });
        let shown = registry.show(true, false);
        assert!(shown.contains("+ 1. p1"));
        assert!(shown.contains("- 2. p2 (Mafia Goon; lynched D1)"));
    }
}
