//! The game aggregate: one match from sign-ups to the final role list.
//!
//! [`Game`] owns everything about a single match and is driven by two kinds
//! of event: player verbs (join, vote, act, ...) and timer checks through
//! [`Game::update`]. Every call runs to completion before returning, and
//! the caller serializes calls per game. The current time is always passed
//! in so deadlines stay testable.
//!
//! # Phase loop
//!
//! ```text
//! Pregame -> Standby -> Day n -> Standby -> Night n -> Standby -> Day n+1 ...
//!                          \                     \
//!                           `-> Ended             `-> Ended
//! ```
//!
//! The cycle counter advances at dawn, so day `n` is followed by night `n`.
//! A game without a night start resolves an empty night at cycle 0 first.
//!
//! A fault while changing phase ends the game outright instead of leaving
//! it stuck in `Standby`.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use tracing::{debug, error, info, warn};

use godfather_roles::{
    ActionError, Effect, EffectContext, LynchContext, NightActions, NightRecord, Player,
    PlayerRegistry, RegistryError, Report, RoleCatalog, RoleContext, VoteError, VoteManager,
    VoteTarget, VoterInfo, majority,
};
use godfather_types::{
    ActionKind, ChannelId, DeathReason, GameId, GuildId, MatchOutcome, Phase, PlayerResult, User,
    UserId,
};

use crate::config::GameConfig;
use crate::endgame::{Endgame, Streaks, check_endgame};
use crate::ports::{DeliveryError, Ports};
use crate::settings::{GameSettings, SettingsError, minutes};
use crate::setup::{Setup, SetupError, SetupRegistry, find_setup};

/// Asked before a started player leaves with nobody to replace them.
pub const MODKILL_PROMPT: &str =
    "Are you sure you want to leave the game? You will be mod-killed.";

/// Asked before a started player leaves while replacements are waiting.
pub const REPLACE_PROMPT: &str =
    "Are you sure you want to leave the game? You will be replaced out.";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A fault while moving between phases. Ends the game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhaseChangeError {
    /// There is no next phase from here.
    #[error("cannot change phase from {phase}")]
    InvalidPhase {
        /// The phase the game was in.
        phase: Phase,
    },

    /// The cycle counter would overflow.
    #[error("cycle counter overflowed")]
    CycleOverflow,

    /// The phase deadline cannot be represented.
    #[error("phase deadline out of range")]
    DeadlineOutOfRange,
}

/// A rejected verb. The game is left unchanged unless noted.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Sign-ups are over.
    #[error("Game has already started!")]
    AlreadyStarted,

    /// The verb needs a started game.
    #[error("The game has not started yet.")]
    NotStarted,

    /// The verb belongs to another phase.
    #[error("You can only do that during the {expected}.")]
    WrongPhase {
        /// Phase the verb needs.
        expected: Phase,
        /// Phase the game is in.
        actual: Phase,
    },

    /// The player cap is reached.
    #[error("This game can accept a maximum of {max} players.")]
    Full {
        /// The cap.
        max: usize,
    },

    /// The host tried to leave.
    #[error("The host cannot leave the game.")]
    HostCannotLeave,

    /// A dead player tried to leave.
    #[error("Dead players cannot leave the game.")]
    DeadCannotLeave,

    /// The user holds no seat.
    #[error("You have not joined this game.")]
    NotPlaying(UserId),

    /// The player is already dead.
    #[error("That player is already dead.")]
    AlreadyDead(UserId),

    /// A host change needs at least three players.
    #[error("You need at least 3 players to change the host.")]
    TooFewForHostChange,

    /// Only the host may do this.
    #[error("Only the host can do that.")]
    NotHost,

    /// The channel already hosts a game.
    #[error("A game of mafia is already running in this channel.")]
    ChannelBusy(ChannelId),

    /// The user already plays elsewhere.
    #[error("You are already playing another game in the channel {channel}.")]
    InOtherGame {
        /// Where the other game runs.
        channel: ChannelId,
    },

    /// The channel has no game.
    #[error("There is no game running in this channel.")]
    NoGame(ChannelId),

    /// Rejected vote.
    #[error("{source}")]
    Vote {
        /// The underlying vote error.
        #[from]
        source: VoteError,
    },

    /// Rejected night action.
    #[error("{source}")]
    Action {
        /// The underlying action error.
        #[from]
        source: ActionError,
    },

    /// Rejected roster change.
    #[error("{source}")]
    Registry {
        /// The underlying roster error.
        #[from]
        source: RegistryError,
    },

    /// Setup could not be used.
    #[error("{source}")]
    Setup {
        /// The underlying setup error.
        #[from]
        source: SetupError,
    },

    /// Setting could not be changed.
    #[error("{source}")]
    Settings {
        /// The underlying settings error.
        #[from]
        source: SettingsError,
    },

    /// The role PM could not be delivered.
    #[error("Cannot send you your role PM. Make sure your DMs are enabled!")]
    Delivery {
        /// The underlying delivery error.
        #[from]
        source: DeliveryError,
    },

    /// The game ended on a phase fault.
    #[error("phase change failed: {source}")]
    PhaseChange {
        /// The underlying fault.
        #[from]
        source: PhaseChangeError,
    },
}

// ---------------------------------------------------------------------------
// Verb results
// ---------------------------------------------------------------------------

/// What a day vote led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOutcome {
    /// The vote was counted; the day goes on.
    Counted,
    /// The vote hammered `target`.
    Lynched {
        /// Who was lynched.
        target: UserId,
    },
    /// No-lynch reached majority.
    NoLynch,
}

/// How a player left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Removed from a game that had not started.
    Left,
    /// Left the replacement queue.
    NoLongerReplacement,
    /// A waiting replacement took the seat.
    Replaced {
        /// The replacement.
        by: UserId,
    },
    /// Nobody could take the seat; the player was modkilled.
    Modkilled,
}

/// Result of a host-change vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostChange {
    /// Counted, not yet a majority.
    Pending {
        /// Votes so far.
        votes: usize,
        /// Votes needed.
        needed: usize,
    },
    /// The host changed.
    Changed {
        /// The new host.
        host: UserId,
    },
}

/// Result of a timer check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing due.
    Waiting,
    /// The phase deadline passed and the game moved on.
    Advanced,
    /// The game sat in pregame too long and is over.
    Expired,
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// One match.
#[derive(Debug)]
pub struct Game {
    id: GameId,
    channel: ChannelId,
    guild: Option<GuildId>,
    phase: Phase,
    cycle: u32,
    phase_end_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    idle_timeout: TimeDelta,
    players: PlayerRegistry,
    votes: VoteManager,
    night: NightActions,
    catalog: RoleCatalog,
    setup: Option<Setup>,
    settings: GameSettings,
    streaks: Streaks,
    pm_failed: BTreeSet<UserId>,
    ports: Ports,
}

impl Game {
    /// Open sign-ups in `channel` with `host` as the first player.
    pub fn new(
        channel: ChannelId,
        guild: Option<GuildId>,
        host: User,
        config: &GameConfig,
        ports: Ports,
        now: DateTime<Utc>,
    ) -> Result<Self, GameError> {
        let mut players = PlayerRegistry::new();
        let host_id = host.id;
        players.add(host)?;
        let game = Self {
            id: GameId::new(),
            channel,
            guild,
            phase: Phase::Pregame,
            cycle: 0,
            phase_end_at: None,
            created_at: now,
            idle_timeout: seconds(config.idle_timeout_secs),
            players,
            votes: VoteManager::new(),
            night: NightActions::new(),
            catalog: RoleCatalog::standard(),
            setup: None,
            settings: GameSettings::from_config(config),
            streaks: Streaks::default(),
            pm_failed: BTreeSet::new(),
            ports,
        };
        info!(game_id = %game.id, %channel, host = %host_id, "game created");
        Ok(game)
    }

    /// Match identity.
    pub const fn id(&self) -> GameId {
        self.id
    }

    /// The channel the game runs in.
    pub const fn channel(&self) -> ChannelId {
        self.channel
    }

    /// The guild the channel belongs to, if any.
    pub const fn guild(&self) -> Option<GuildId> {
        self.guild
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Current cycle. Day `n` and night `n` share it.
    pub const fn cycle(&self) -> u32 {
        self.cycle
    }

    /// When the current day or night ends.
    pub const fn phase_end_at(&self) -> Option<DateTime<Utc>> {
        self.phase_end_at
    }

    /// The roster.
    pub const fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    /// Today's votes.
    pub const fn votes(&self) -> &VoteManager {
        &self.votes
    }

    /// Tonight's actions.
    pub const fn night(&self) -> &NightActions {
        &self.night
    }

    /// The chosen or custom setup.
    pub const fn setup(&self) -> Option<&Setup> {
        self.setup.as_ref()
    }

    /// Durations and player cap.
    pub const fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Quiet-cycle streak.
    pub const fn streaks(&self) -> &Streaks {
        &self.streaks
    }

    /// Players whose role PM could not be delivered.
    pub fn pm_failed(&self) -> impl Iterator<Item = UserId> + '_ {
        self.pm_failed.iter().copied()
    }

    /// Whether sign-ups are over.
    pub const fn has_started(&self) -> bool {
        self.phase.has_started()
    }

    /// Whether `user` is the host.
    pub fn is_host(&self, user: UserId) -> bool {
        self.players.host().is_some_and(|p| p.id() == user)
    }

    /// Whether `user` holds a seat or waits as a replacement.
    pub fn involves(&self, user: UserId) -> bool {
        self.players.contains(user) || self.players.is_replacement(user)
    }

    // --- messaging ---

    fn say(&self, text: &str) {
        self.ports.messages.send(self.channel, text);
    }

    fn notify(&self, to: UserId, text: &str) {
        if let Err(e) = self.ports.notifier.notify(to, text) {
            warn!(game_id = %self.id, user = %to, error = %e, "direct message not delivered");
        }
    }

    fn publish_notifications(&self, report: &Report) {
        for n in &report.notifications {
            self.notify(n.to, &n.text);
        }
    }

    fn publish_announcements(&self, report: &Report) {
        for text in &report.announcements {
            self.say(text);
        }
    }

    fn deliver(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Notify { to, text } => self.notify(to, &text),
                Effect::Announce { text } => self.say(&text),
                other => debug!(game_id = %self.id, effect = ?other, "effect outside resolution ignored"),
            }
        }
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), GameError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    // --- lobby ---

    /// Sign up for a game that has not started.
    pub fn join(&mut self, user: User) -> Result<(), GameError> {
        if self.has_started() {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() >= self.settings.max_players {
            return Err(GameError::Full {
                max: self.settings.max_players,
            });
        }
        let id = user.id;
        self.players.add(user)?;
        info!(game_id = %self.id, user = %id, players = self.players.len(), "player joined");
        Ok(())
    }

    /// Queue as a replacement for a started game.
    pub fn sign_up_replacement(&mut self, user: User) -> Result<(), GameError> {
        if !self.has_started() {
            return Err(GameError::NotStarted);
        }
        let id = user.id;
        self.players.add_replacement(user)?;
        info!(game_id = %self.id, user = %id, "replacement queued");
        Ok(())
    }

    /// The question to confirm before `user` leaves, if one is needed.
    pub fn leave_prompt(&self, user: UserId) -> Result<Option<&'static str>, GameError> {
        if self.players.is_replacement(user) {
            return Ok(None);
        }
        let player = self.players.get(user).ok_or(GameError::NotPlaying(user))?;
        if self.is_host(user) {
            return Err(GameError::HostCannotLeave);
        }
        if !self.has_started() {
            return Ok(None);
        }
        if !player.alive {
            return Err(GameError::DeadCannotLeave);
        }
        if self.players.replacements().next().is_none() {
            Ok(Some(MODKILL_PROMPT))
        } else {
            Ok(Some(REPLACE_PROMPT))
        }
    }

    /// Leave the game. Once started, the seat goes to the oldest waiting
    /// replacement, or the player is modkilled.
    pub fn leave(&mut self, user: UserId, now: DateTime<Utc>) -> Result<Departure, GameError> {
        self.leave_prompt(user)?;
        if self.players.remove_replacement(user) {
            return Ok(Departure::NoLongerReplacement);
        }
        if !self.has_started() {
            self.players.remove(user)?;
            info!(game_id = %self.id, %user, "player left");
            return Ok(Departure::Left);
        }
        self.depart(user, now)
    }

    /// `user` left the platform. Same as leaving, except the host may go
    /// and no confirmation is involved.
    pub fn remove_member(
        &mut self,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<Departure, GameError> {
        if self.players.remove_replacement(user) {
            return Ok(Departure::NoLongerReplacement);
        }
        let alive = self
            .players
            .get(user)
            .ok_or(GameError::NotPlaying(user))?
            .alive;
        if !self.has_started() {
            self.players.remove(user)?;
            return Ok(Departure::Left);
        }
        if !alive {
            return Err(GameError::DeadCannotLeave);
        }
        self.depart(user, now)
    }

    fn depart(&mut self, user: UserId, now: DateTime<Utc>) -> Result<Departure, GameError> {
        match self.players.next_replacement() {
            Some(replacement) => {
                let by = replacement.id;
                self.replace(user, replacement)?;
                Ok(Departure::Replaced { by })
            }
            None => {
                self.modkill(user, now)?;
                Ok(Departure::Modkilled)
            }
        }
    }

    /// Put `new` into `old`'s seat. Role, liveness, votes, and tonight's
    /// action stay with the seat.
    pub fn replace(&mut self, old: UserId, new: User) -> Result<(), GameError> {
        let old_name = self
            .players
            .get(old)
            .ok_or(GameError::NotPlaying(old))?
            .user
            .name
            .clone();
        let new_id = new.id;
        let new_name = new.name.clone();
        self.players.replace(old, new)?;
        self.votes.replace_identity(old, new_id);
        self.night.replace_identity(old, new_id);
        self.pm_failed.remove(&old);
        info!(game_id = %self.id, %old, new = %new_id, "player replaced");
        self.say(&format!("{new_name} has replaced {old_name}."));
        if !self.has_started() {
            return Ok(());
        }
        if let Err(e) = self.send_role_pm(new_id) {
            debug!(game_id = %self.id, user = %new_id, error = %e, "replacement role PM failed");
        }
        Ok(())
    }

    /// Remove a living player from play. On-death effects do not run.
    pub fn modkill(&mut self, user: UserId, now: DateTime<Utc>) -> Result<(), GameError> {
        if !self.has_started() {
            return Err(GameError::NotStarted);
        }
        let (phase, cycle) = (self.phase, self.cycle);
        let player = self
            .players
            .get_mut(user)
            .ok_or(GameError::NotPlaying(user))?;
        if !player.alive {
            return Err(GameError::AlreadyDead(user));
        }
        let text = format!(
            "{} was modkilled. They were a *{}*.",
            player.user.name,
            player.display_role()
        );
        player.kill(DeathReason::Modkilled { phase, cycle });
        self.votes.remove_player(user);
        self.say(&text);
        info!(game_id = %self.id, %user, %phase, cycle, "player modkilled");

        let end = check_endgame(&self.players);
        if end.ended {
            self.end(&end, now);
        }
        Ok(())
    }

    /// Use a host-supplied setup instead of a registered one.
    pub fn use_setup(&mut self, text: &str) -> Result<&Setup, GameError> {
        if self.has_started() {
            return Err(GameError::AlreadyStarted);
        }
        let setup = Setup::parse_custom(text, &self.catalog)?;
        self.say(&format!(
            "Using the setup **{}** with {} players.",
            setup.name,
            setup.total_players()
        ));
        Ok(self.setup.insert(setup))
    }

    /// Close sign-ups, assign roles, send role PMs, and begin the first
    /// phase. A failed role PM never blocks the start.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        setups: &dyn SetupRegistry,
        setup_name: Option<&str>,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<(), GameError> {
        if self.has_started() {
            return Err(GameError::AlreadyStarted);
        }
        let setup = match &self.setup {
            Some(custom) if custom.total_players() != self.players.len() => {
                return Err(SetupError::PlayerCountMismatch {
                    needed: custom.total_players(),
                    have: self.players.len(),
                }
                .into());
            }
            Some(custom) => custom.clone(),
            None => find_setup(setups, setup_name, self.players.len(), rng)?,
        };
        let roles = setup.roll(&self.catalog, rng)?;

        self.phase = Phase::Standby;
        self.say(&format!(
            "Chose the setup **{}**. Randing roles...",
            setup.name
        ));
        for (player, role) in self.players.iter_mut().zip(roles) {
            player.assign_role(role);
        }
        info!(
            game_id = %self.id,
            setup = %setup.name,
            players = self.players.len(),
            night_start = setup.night_start,
            "game started"
        );
        let night_start = setup.night_start;
        self.setup = Some(setup);

        let ids: Vec<UserId> = self.players.iter().map(Player::id).collect();
        let mut failed = Vec::new();
        for id in ids {
            if self.send_role_pm(id).is_err() {
                failed.push(id);
            }
        }
        self.say("Sent all role PMs!");
        if !failed.is_empty() {
            let names: Vec<&str> = failed
                .iter()
                .filter_map(|&id| self.players.get(id))
                .map(|p| p.user.name.as_str())
                .collect();
            self.say(&format!(
                "I couldn't DM {}. Use the rolepm command to receive your PM.",
                names.join(", ")
            ));
        }

        if night_start {
            self.cycle = 1;
            self.phase = Phase::Day;
        }
        self.advance(now);
        Ok(())
    }

    fn role_pm_text(&self, user: UserId) -> Option<String> {
        let player = self.players.get(user)?;
        let mut text = player.role_pm()?;
        if let Some(faction) = player.faction().filter(|f| f.informed) {
            let team: Vec<String> = self
                .players
                .alive_in_faction(faction.id)
                .map(|p| format!("{} ({})", p.user.name, p.role_name().unwrap_or_default()))
                .collect();
            if team.len() > 1 {
                text.push_str("\nYour team consists of: ");
                text.push_str(&team.join(", "));
            }
        }
        Some(text)
    }

    fn send_role_pm(&mut self, user: UserId) -> Result<(), DeliveryError> {
        let Some(text) = self.role_pm_text(user) else {
            return Ok(());
        };
        match self.ports.notifier.notify(user, &text) {
            Ok(()) => {
                self.pm_failed.remove(&user);
                Ok(())
            }
            Err(e) => {
                warn!(game_id = %self.id, %user, error = %e, "role PM not delivered");
                self.pm_failed.insert(user);
                Err(e)
            }
        }
    }

    /// Send `user` their role PM again, and tonight's prompt if they may
    /// act.
    pub fn resend_role_pm(&mut self, user: UserId) -> Result<(), GameError> {
        if !self.has_started() {
            return Err(GameError::NotStarted);
        }
        if !self.players.contains(user) {
            return Err(GameError::NotPlaying(user));
        }
        self.send_role_pm(user)?;
        if self.phase == Phase::Night {
            self.deliver(self.night_prompt(user));
        }
        Ok(())
    }

    fn night_prompt(&self, user: UserId) -> Vec<Effect> {
        let Some(me) = self.players.get(user) else {
            return Vec::new();
        };
        let Some(role) = me.role() else {
            return Vec::new();
        };
        let ctx = RoleContext {
            me,
            players: &self.players,
            cycle: self.cycle,
        };
        if role.can_do_action(&ctx).is_eligible() {
            role.on_night(&ctx)
        } else {
            Vec::new()
        }
    }

    // --- day ---

    /// Vote to lynch `target`. A hammer lynches at once and moves on.
    pub fn submit_vote(
        &mut self,
        voter: UserId,
        target: UserId,
        now: DateTime<Utc>,
    ) -> Result<DayOutcome, GameError> {
        self.expect_phase(Phase::Day)?;
        let hammered = self.votes.vote(voter, target, &self.players)?;
        debug!(game_id = %self.id, %voter, %target, hammered, "vote counted");
        if !hammered {
            return Ok(DayOutcome::Counted);
        }
        self.phase = Phase::Standby;
        self.lynch(target, now);
        Ok(DayOutcome::Lynched { target })
    }

    /// Vote to end the day without a lynch.
    pub fn submit_no_lynch(
        &mut self,
        voter: UserId,
        now: DateTime<Utc>,
    ) -> Result<DayOutcome, GameError> {
        self.expect_phase(Phase::Day)?;
        let reached = self.votes.no_lynch(voter, &self.players)?;
        debug!(game_id = %self.id, %voter, reached, "no-lynch vote counted");
        if !reached {
            return Ok(DayOutcome::Counted);
        }
        self.phase = Phase::Standby;
        self.streaks.day_without_lynch();
        self.say("Nobody was lynched!");
        info!(game_id = %self.id, cycle = self.cycle, "day ended without a lynch");
        self.phase = Phase::Day;
        self.advance(now);
        Ok(DayOutcome::NoLynch)
    }

    /// Withdraw today's vote. Returns whether there was one.
    pub fn unvote(&mut self, voter: UserId) -> Result<bool, GameError> {
        self.expect_phase(Phase::Day)?;
        if !self.players.contains(voter) {
            return Err(GameError::NotPlaying(voter));
        }
        Ok(self.votes.unvote(voter))
    }

    /// Today's vote count.
    pub fn vote_count(&self) -> Result<String, GameError> {
        self.expect_phase(Phase::Day)?;
        Ok(self.votes.show(&self.players))
    }

    fn lynch(&mut self, target: UserId, now: DateTime<Utc>) {
        let cycle = self.cycle;
        if let Some(player) = self.players.get(target) {
            self.say(&format!(
                "{} was lynched. They were a *{}*.",
                player.user.name,
                player.display_role()
            ));
        }
        let voters: Vec<VoterInfo> = self
            .votes
            .votes_on(VoteTarget::Player(target))
            .iter()
            .filter_map(|&id| self.players.get(id))
            .map(|p| VoterInfo {
                id: p.id(),
                name: p.user.name.clone(),
                display_role: p.display_role(),
            })
            .collect();
        let lynch = LynchContext {
            me: target,
            cycle,
            voters,
        };
        let effects = self
            .players
            .get_mut(target)
            .and_then(Player::role_mut)
            .map(|role| role.on_lynch(&lynch))
            .unwrap_or_default();

        let mut record = NightRecord::default();
        let mut report = Report::default();
        {
            let mut ctx = EffectContext {
                players: &mut self.players,
                catalog: &self.catalog,
                record: &mut record,
                report: &mut report,
                cycle,
                death_reason: DeathReason::Exploded { cycle },
            };
            ctx.apply_all(effects);
            if ctx
                .players
                .get_mut(target)
                .is_some_and(|p| p.kill(DeathReason::Lynched { cycle }))
            {
                ctx.report.deaths.push(target);
            }
            ctx.run_death_hooks(0);
        }
        self.publish_notifications(&report);
        self.publish_announcements(&report);
        self.streaks.lynched();
        info!(game_id = %self.id, cycle, %target, deaths = report.deaths.len(), "player lynched");

        let end = check_endgame(&self.players);
        if end.ended {
            self.end(&end, now);
        } else {
            self.phase = Phase::Day;
            self.advance(now);
        }
    }

    // --- night ---

    /// Submit or overwrite tonight's action.
    pub fn submit_night_action(
        &mut self,
        actor: UserId,
        kind: ActionKind,
        targets: Vec<UserId>,
    ) -> Result<(), GameError> {
        self.expect_phase(Phase::Night)?;
        self.night
            .submit(actor, kind, targets, &self.players, self.cycle)?;
        Ok(())
    }

    /// Withdraw tonight's action. Returns whether there was one.
    pub fn withdraw_night_action(&mut self, actor: UserId) -> Result<bool, GameError> {
        self.expect_phase(Phase::Night)?;
        Ok(self.night.withdraw(actor)?)
    }

    // --- host ---

    /// Vote to hand hosting to the next player. The host's own vote counts
    /// as a majority.
    pub fn change_host_vote(&mut self, voter: UserId) -> Result<HostChange, GameError> {
        if self.has_started() {
            return Err(GameError::AlreadyStarted);
        }
        if !self.players.contains(voter) {
            return Err(GameError::NotPlaying(voter));
        }
        if self.players.len() < 3 {
            return Err(GameError::TooFewForHostChange);
        }
        if !self.is_host(voter) {
            let votes = self.players.vote_kick(voter)?;
            let needed = majority(self.players.len());
            if votes < needed {
                return Ok(HostChange::Pending { votes, needed });
            }
        }
        self.players.rotate_host();
        let host = self.players.host().ok_or(GameError::NotPlaying(voter))?;
        let (id, name) = (host.id(), host.user.name.clone());
        self.say(&format!("The host is now {name}"));
        info!(game_id = %self.id, host = %id, "host changed");
        Ok(HostChange::Changed { host: id })
    }

    /// Change a per-game setting. Host only.
    pub fn configure(&mut self, user: UserId, key: &str, value: &str) -> Result<String, GameError> {
        if !self.is_host(user) {
            return Err(GameError::NotHost);
        }
        let msg = self.settings.set(key, value)?;
        self.say(&msg);
        Ok(msg)
    }

    // --- status ---

    /// Sign-up list with the replacement queue.
    pub fn player_list(&self) -> String {
        format!(
            "**Players: {}**\n{}",
            self.players.len(),
            self.players.show(false, true)
        )
    }

    /// What the status command shows.
    pub fn status(&self, now: DateTime<Utc>) -> String {
        match self.phase {
            Phase::Pregame => format!(
                "The game hasn't started yet. Use the join command to join it!\n{}",
                self.player_list()
            ),
            Phase::Standby => String::from("The bot is currently processing the game. Sit tight!"),
            Phase::Ended => String::from("The game is over."),
            Phase::Day | Phase::Night => {
                let host = self
                    .players
                    .host()
                    .map_or("nobody", |p| p.user.name.as_str());
                format!(
                    "Host: {host}\nPhase: {} {}\nTime remaining: {}\nPlayers:\n```diff\n{}```",
                    self.phase,
                    self.cycle,
                    self.remaining(now),
                    self.players.show(true, false)
                )
            }
        }
    }

    /// Time left in the current phase, e.g. `4m 05s`.
    pub fn remaining(&self, now: DateTime<Utc>) -> String {
        match self.phase_end_at {
            None => String::from("no deadline"),
            Some(end) if now >= end => String::from("any second now..."),
            Some(end) => {
                let secs = u64::try_from(end.signed_duration_since(now).num_seconds()).unwrap_or(0);
                format!("{}m {:02}s", secs / 60, secs % 60)
            }
        }
    }

    // --- phases ---

    /// Check deadlines. Pregame games expire after the idle timeout; an
    /// elapsed day ends without a lynch; an elapsed night resolves.
    pub fn update(&mut self, now: DateTime<Utc>) -> Tick {
        match self.phase {
            Phase::Pregame => {
                if now.signed_duration_since(self.created_at) < self.idle_timeout {
                    return Tick::Waiting;
                }
                self.say("The game took too long to start, deleting it.");
                info!(game_id = %self.id, channel = %self.channel, "idle game expired");
                self.phase = Phase::Ended;
                Tick::Expired
            }
            Phase::Standby | Phase::Ended => Tick::Waiting,
            Phase::Day | Phase::Night => {
                let Some(end) = self.phase_end_at else {
                    return Tick::Waiting;
                };
                if now <= end {
                    return Tick::Waiting;
                }
                if self.phase == Phase::Day {
                    self.streaks.day_without_lynch();
                    self.say("Nobody was lynched");
                }
                self.advance(now);
                Tick::Advanced
            }
        }
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        if let Err(e) = self.increment_phase(now) {
            error!(
                game_id = %self.id,
                channel = %self.channel,
                cycle = self.cycle,
                error = %e,
                "phase change failed, ending game"
            );
            self.say("There was an error incrementing the phase. The game has ended.");
            self.phase = Phase::Ended;
            self.phase_end_at = None;
        }
    }

    fn increment_phase(&mut self, now: DateTime<Utc>) -> Result<(), PhaseChangeError> {
        match self.phase {
            phase @ (Phase::Pregame | Phase::Ended) => Err(PhaseChangeError::InvalidPhase { phase }),
            Phase::Night => self.dawn(now),
            _ if self.cycle == 0 => self.dawn(now),
            _ => self.dusk(now),
        }
    }

    /// Resolve the night and open the next day.
    fn dawn(&mut self, now: DateTime<Utc>) -> Result<(), PhaseChangeError> {
        self.phase = Phase::Standby;
        let report = self
            .night
            .resolve(&mut self.players, &self.catalog, self.cycle);
        self.publish_notifications(&report);
        self.streaks.night_ended(report.deaths.len(), self.cycle);

        for player in report.deaths.iter().filter_map(|&id| self.players.get(id)) {
            let role_text = if player.cleaned {
                String::from("We could not determine their role.")
            } else {
                format!("They were a {}.", player.display_role())
            };
            self.say(&format!("{} died last night. {role_text}", player.user.name));
        }
        self.publish_announcements(&report);

        if self.streaks.is_draw() {
            self.say("Nobody was killed in 3 consecutive cycles. Ending game...");
            let end = Endgame::draw(check_endgame(&self.players).independent);
            self.end(&end, now);
            return Ok(());
        }
        let end = check_endgame(&self.players);
        if end.ended {
            self.end(&end, now);
            return Ok(());
        }

        self.night.reset();
        self.cycle = self
            .cycle
            .checked_add(1)
            .ok_or(PhaseChangeError::CycleOverflow)?;
        self.votes.reset(&self.players);
        self.players.clear_vote_kicks();
        let alive = self.players.alive_count();
        self.say(&format!(
            "Day **{}** will last {} minutes. With {alive} alive, it takes {} to lynch.",
            self.cycle,
            minutes(self.settings.day_duration_secs),
            majority(alive)
        ));
        self.phase_end_at = Some(deadline(now, self.settings.day_duration_secs)?);
        self.phase = Phase::Day;
        info!(game_id = %self.id, cycle = self.cycle, alive, "day started");
        Ok(())
    }

    /// Close the day and open the night.
    fn dusk(&mut self, now: DateTime<Utc>) -> Result<(), PhaseChangeError> {
        self.phase = Phase::Standby;
        self.votes.clear();

        if self.streaks.is_draw() {
            self.say("Nobody was lynched on 3 consecutive days. Ending game...");
            let end = Endgame::draw(check_endgame(&self.players).independent);
            self.end(&end, now);
            return Ok(());
        }

        self.say(&format!(
            "Night **{}** will last {} minutes. Send in those actions quickly!",
            self.cycle,
            minutes(self.settings.night_duration_secs)
        ));
        let prompts: Vec<Effect> = self
            .players
            .iter()
            .flat_map(|p| self.night_prompt(p.id()))
            .collect();
        self.deliver(prompts);

        self.phase_end_at = Some(deadline(now, self.settings.night_duration_secs)?);
        self.phase = Phase::Night;
        info!(game_id = %self.id, cycle = self.cycle, "night started");
        Ok(())
    }

    /// Announce the result, record the outcome, and mark the game ended.
    fn end(&mut self, end: &Endgame, now: DateTime<Utc>) {
        match &end.winner {
            Some(faction) => self.say(&format!("The game is over. {} wins!", faction.name)),
            None => self.say("The game is over. Nobody wins!"),
        }

        if !end.independent.is_empty() {
            let wins: Vec<String> = end
                .independent
                .iter()
                .filter_map(|&id| self.players.get(id))
                .map(|p| format!("{} ({})", p.user.name, p.role_name().unwrap_or_default()))
                .collect();
            self.say(&format!("Independent wins: {}", wins.join(", ")));
        }

        let rolelist: Vec<String> = self
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}. {} ({})", i.saturating_add(1), p.user.name, p.full_role()))
            .collect();
        self.say(&format!("**Final Rolelist**: ```{}```", rolelist.join("\n")));

        let outcome = self.outcome(end, now);
        if let Err(e) = self.ports.outcomes.record(&outcome) {
            warn!(game_id = %self.id, error = %e, "match outcome not recorded");
        }

        self.phase = Phase::Ended;
        self.phase_end_at = None;
        info!(
            game_id = %self.id,
            cycle = self.cycle,
            winner = end.winner.as_ref().map(|f| f.name),
            independent = end.independent.len(),
            "game ended"
        );
    }

    fn outcome(&self, end: &Endgame, now: DateTime<Utc>) -> MatchOutcome {
        let winner = end.winner_id();
        MatchOutcome {
            game_id: self.id,
            setup: self
                .setup
                .as_ref()
                .map_or_else(String::new, |s| s.name.clone()),
            winning_faction: end.winner.as_ref().map(|f| f.name.to_owned()),
            independent_winners: end
                .independent
                .iter()
                .filter_map(|&id| self.players.get(id))
                .filter_map(Player::role_name)
                .map(str::to_owned)
                .collect(),
            players: self
                .players
                .iter()
                .map(|p| PlayerResult {
                    user: p.id(),
                    faction: p.faction().map_or_else(String::new, |f| f.name.to_owned()),
                    role: p.role_name().unwrap_or_default().to_owned(),
                    won: end.independent.contains(&p.id())
                        || (winner.is_some() && p.faction_id() == winner),
                })
                .collect(),
            ended_at: now,
        }
    }
}

fn seconds(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

fn deadline(now: DateTime<Utc>, secs: u64) -> Result<DateTime<Utc>, PhaseChangeError> {
    now.checked_add_signed(seconds(secs))
        .ok_or(PhaseChangeError::DeadlineOutOfRange)
}
