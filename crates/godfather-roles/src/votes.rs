//! Day-phase voting.
//!
//! Every living player is in exactly one bucket at a time: backing a
//! player, backing no-lynch, or not voting. Re-voting moves the voter,
//! never duplicates them. A bucket reaching the majority threshold is the
//! hammer that ends the day.

use std::collections::BTreeMap;

use godfather_types::UserId;
use tracing::debug;

use crate::error::VoteError;
use crate::players::PlayerRegistry;

/// What a vote backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VoteTarget {
    /// Lynch this player.
    Player(UserId),
    /// Lynch nobody.
    NoLynch,
}

/// Votes needed to lynch with `alive` living players.
pub const fn majority(alive: usize) -> usize {
    (alive / 2).saturating_add(1)
}

fn check_voter(voter: UserId, players: &PlayerRegistry) -> Result<(), VoteError> {
    let v = players.get(voter).ok_or(VoteError::VoterNotPlaying(voter))?;
    if !v.alive {
        return Err(VoteError::VoterDead(voter));
    }
    Ok(())
}

/// The day's votes.
#[derive(Debug, Default, Clone)]
pub struct VoteManager {
    buckets: BTreeMap<VoteTarget, Vec<UserId>>,
    not_voting: Vec<UserId>,
    first_voted: Vec<VoteTarget>,
}

impl VoteManager {
    /// No votes and nobody seeded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a fresh day: an empty bucket per living player, an empty
    /// no-lynch bucket, and every living player not voting.
    pub fn reset(&mut self, players: &PlayerRegistry) {
        self.clear();
        for id in players.alive_ids() {
            self.buckets.insert(VoteTarget::Player(id), Vec::new());
            self.not_voting.push(id);
        }
        self.buckets.insert(VoteTarget::NoLynch, Vec::new());
    }

    /// Discard every vote and bucket.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.not_voting.clear();
        self.first_voted.clear();
    }

    /// Vote to lynch `target`. Returns whether this vote hammered.
    pub fn vote(
        &mut self,
        voter: UserId,
        target: UserId,
        players: &PlayerRegistry,
    ) -> Result<bool, VoteError> {
        check_voter(voter, players)?;
        let t = players.get(target).ok_or(VoteError::TargetNotPlaying(target))?;
        if !t.alive {
            return Err(VoteError::TargetDead(target));
        }
        self.cast(voter, VoteTarget::Player(target), players)
    }

    /// Vote to lynch nobody. Returns whether no-lynch reached majority.
    pub fn no_lynch(&mut self, voter: UserId, players: &PlayerRegistry) -> Result<bool, VoteError> {
        self.cast(voter, VoteTarget::NoLynch, players)
    }

    fn cast(
        &mut self,
        voter: UserId,
        target: VoteTarget,
        players: &PlayerRegistry,
    ) -> Result<bool, VoteError> {
        check_voter(voter, players)?;
        if self.voted_for(voter) == Some(target) {
            return Err(VoteError::AlreadyVoted(voter));
        }

        self.detach(voter);
        if !self.first_voted.contains(&target) {
            self.first_voted.push(target);
        }
        let bucket = self.buckets.entry(target).or_default();
        bucket.push(voter);
        let count = bucket.len();
        let needed = majority(players.alive_count());
        debug!(?voter, ?target, count, needed, "vote cast");
        Ok(count >= needed)
    }

    /// Withdraw `voter`'s vote. Returns false if they had none.
    pub fn unvote(&mut self, voter: UserId) -> bool {
        if self.voted_for(voter).is_none() {
            return false;
        }
        self.detach(voter);
        self.not_voting.push(voter);
        true
    }

    /// Remove `voter` from whichever bucket holds them.
    fn detach(&mut self, voter: UserId) {
        self.not_voting.retain(|&id| id != voter);
        for voters in self.buckets.values_mut() {
            voters.retain(|&id| id != voter);
        }
    }

    /// What `voter` currently backs.
    pub fn voted_for(&self, voter: UserId) -> Option<VoteTarget> {
        self.buckets
            .iter()
            .find(|(_, voters)| voters.contains(&voter))
            .map(|(&target, _)| target)
    }

    /// Voters backing `target`, in the order they voted.
    pub fn votes_on(&self, target: VoteTarget) -> &[UserId] {
        self.buckets.get(&target).map(Vec::as_slice).unwrap_or_default()
    }

    /// Living players backing nothing.
    pub fn not_voting(&self) -> &[UserId] {
        &self.not_voting
    }

    /// A substitute takes over `old`'s seat: votes on `old` now count on
    /// `new`, and `old`'s own vote is now `new`'s.
    pub fn replace_identity(&mut self, old: UserId, new: UserId) {
        if let Some(voters) = self.buckets.remove(&VoteTarget::Player(old)) {
            self.buckets.insert(VoteTarget::Player(new), voters);
        }
        for target in &mut self.first_voted {
            if *target == VoteTarget::Player(old) {
                *target = VoteTarget::Player(new);
            }
        }
        for id in self
            .buckets
            .values_mut()
            .flat_map(|voters| voters.iter_mut())
            .chain(self.not_voting.iter_mut())
        {
            if *id == old {
                *id = new;
            }
        }
    }

    /// Drop a player who left the living mid-day. Their vote is withdrawn
    /// and whoever backed them goes back to not voting.
    pub fn remove_player(&mut self, id: UserId) {
        self.detach(id);
        if let Some(voters) = self.buckets.remove(&VoteTarget::Player(id)) {
            self.not_voting.extend(voters);
        }
        self.first_voted.retain(|&t| t != VoteTarget::Player(id));
    }

    /// Vote count as shown in chat, most votes first, ties by whichever
    /// target was voted first.
    pub fn show(&self, players: &PlayerRegistry) -> String {
        let name = |id: UserId| {
            players
                .get(id)
                .map_or_else(|| id.to_string(), |p| p.user.name.clone())
        };
        let mut tallies: Vec<(usize, VoteTarget, &Vec<UserId>)> = self
            .buckets
            .iter()
            .filter(|(_, voters)| !voters.is_empty())
            .map(|(&target, voters)| {
                let first = self
                    .first_voted
                    .iter()
                    .position(|&t| t == target)
                    .unwrap_or(usize::MAX);
                (first, target, voters)
            })
            .collect();
        tallies.sort_by(|a, b| b.2.len().cmp(&a.2.len()).then(a.0.cmp(&b.0)));

        let mut out = format!(
            "Votecount (majority {}):\n",
            majority(players.alive_count())
        );
        for (_, target, voters) in tallies {
            let label = match target {
                VoteTarget::Player(id) => name(id),
                VoteTarget::NoLynch => String::from("No lynch"),
            };
            let names: Vec<String> = voters.iter().map(|&v| name(v)).collect();
            out.push_str(&format!("{label} ({}): {}\n", voters.len(), names.join(", ")));
        }
        if !self.not_voting.is_empty() {
            let names: Vec<String> = self.not_voting.iter().map(|&v| name(v)).collect();
            out.push_str(&format!(
                "Not voting ({}): {}\n",
                self.not_voting.len(),
                names.join(", ")
            ));
        }
        out
    }
}
