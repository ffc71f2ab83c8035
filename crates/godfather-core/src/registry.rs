//! Every running game, keyed by channel.
//!
//! A channel holds at most one game, and a user plays in at most one game
//! at a time. Each game sits behind its own lock so verbs in different
//! channels never wait on each other.
//!
//! # Locking
//!
//! Seating a user (create, join, replacement sign-up) first takes the
//! seating lock, so the one-game-per-user check and the seat it guards are
//! atomic. After that the channel map is always locked before a game, never
//! after. Confirmation prompts are awaited with no lock held, and the game
//! is revalidated once the answer arrives.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use godfather_types::{ChannelId, GuildId, Phase, User, UserId};

use crate::config::GameConfig;
use crate::game::{Departure, Game, GameError, Tick};
use crate::ports::{ConfirmPrompt, Ports};
use crate::setup::SetupRegistry;

/// Asked before a late joiner is queued as a replacement.
pub const REPLACEMENT_PROMPT: &str =
    "Sign-ups for this game have ended. Would you like to be a replacement?";

/// Asked before the host deletes a started game.
pub const DELETE_PROMPT: &str = "Are you sure you want to delete an ongoing game?";

/// A game shared between verbs and the driver.
pub type SharedGame = Arc<Mutex<Game>>;

/// How a join request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Signed up for the game.
    Joined,
    /// Queued as a replacement.
    Replacement,
    /// Declined the replacement prompt.
    Declined,
}

/// What one driver pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Games whose phase deadline passed.
    pub advanced: usize,
    /// Pregame games removed for idling.
    pub expired: usize,
}

/// All games of one host process.
#[derive(Debug)]
pub struct GameRegistry {
    games: RwLock<BTreeMap<ChannelId, SharedGame>>,
    seating: Mutex<()>,
    setups: Arc<dyn SetupRegistry>,
    ports: Ports,
    config: GameConfig,
}

impl GameRegistry {
    /// An empty registry. New games take their defaults from `config`.
    pub fn new(setups: Arc<dyn SetupRegistry>, ports: Ports, config: GameConfig) -> Self {
        Self {
            games: RwLock::new(BTreeMap::new()),
            seating: Mutex::new(()),
            setups,
            ports,
            config,
        }
    }

    /// Registered setups.
    pub fn setups(&self) -> &dyn SetupRegistry {
        self.setups.as_ref()
    }

    /// Number of live games.
    pub async fn len(&self) -> usize {
        self.games.read().await.len()
    }

    /// Whether no game is running.
    pub async fn is_empty(&self) -> bool {
        self.games.read().await.is_empty()
    }

    /// The game in `channel`.
    pub async fn get(&self, channel: ChannelId) -> Option<SharedGame> {
        self.games.read().await.get(&channel).cloned()
    }

    async fn snapshot(&self) -> Vec<(ChannelId, SharedGame)> {
        self.games
            .read()
            .await
            .iter()
            .map(|(&c, g)| (c, Arc::clone(g)))
            .collect()
    }

    /// The channel of another game `user` is part of.
    async fn playing_elsewhere(&self, channel: ChannelId, user: UserId) -> Option<ChannelId> {
        for (other, game) in self.snapshot().await {
            if other != channel && game.lock().await.involves(user) {
                return Some(other);
            }
        }
        None
    }

    async fn reap(&self, channel: ChannelId) {
        let mut games = self.games.write().await;
        if games.remove(&channel).is_some() {
            info!(%channel, games = games.len(), "game removed");
        }
    }

    /// Open sign-ups in `channel` hosted by `host`.
    pub async fn create(
        &self,
        channel: ChannelId,
        guild: Option<GuildId>,
        host: User,
        now: DateTime<Utc>,
    ) -> Result<SharedGame, GameError> {
        let _seating = self.seating.lock().await;
        if self.get(channel).await.is_some() {
            return Err(GameError::ChannelBusy(channel));
        }
        if let Some(other) = self.playing_elsewhere(channel, host.id).await {
            return Err(GameError::InOtherGame { channel: other });
        }
        let name = host.name.clone();
        let game = Game::new(channel, guild, host, &self.config, self.ports.clone(), now)?;

        let mut games = self.games.write().await;
        if games.contains_key(&channel) {
            return Err(GameError::ChannelBusy(channel));
        }
        let shared = Arc::new(Mutex::new(game));
        games.insert(channel, Arc::clone(&shared));
        drop(games);

        self.ports.messages.send(
            channel,
            &format!("Started a game of mafia in this channel, hosted by **{name}**"),
        );
        Ok(shared)
    }

    /// Run `f` against the game in `channel`. A game that ended during the
    /// call is removed afterwards.
    pub async fn with_game<T>(
        &self,
        channel: ChannelId,
        f: impl FnOnce(&mut Game) -> T,
    ) -> Result<T, GameError> {
        let game = self.get(channel).await.ok_or(GameError::NoGame(channel))?;
        let mut guard = game.lock().await;
        let out = f(&mut guard);
        let ended = guard.phase() == Phase::Ended;
        drop(guard);
        if ended {
            self.reap(channel).await;
        }
        Ok(out)
    }

    /// Join the game in `channel`. After sign-ups close, the user is asked
    /// whether to queue as a replacement.
    pub async fn join<C: ConfirmPrompt>(
        &self,
        channel: ChannelId,
        user: User,
        confirm: &C,
    ) -> Result<JoinOutcome, GameError> {
        let game = {
            let _seating = self.seating.lock().await;
            if let Some(other) = self.playing_elsewhere(channel, user.id).await {
                return Err(GameError::InOtherGame { channel: other });
            }
            let game = self.get(channel).await.ok_or(GameError::NoGame(channel))?;
            let mut guard = game.lock().await;
            if !guard.has_started() {
                guard.join(user)?;
                return Ok(JoinOutcome::Joined);
            }
            if guard.involves(user.id) {
                return Err(godfather_roles::RegistryError::AlreadyPlaying(user.name).into());
            }
            drop(guard);
            game
        };

        if !confirm
            .confirm(user.id, channel, REPLACEMENT_PROMPT)
            .await
            .is_yes()
        {
            return Ok(JoinOutcome::Declined);
        }
        let _seating = self.seating.lock().await;
        if let Some(other) = self.playing_elsewhere(channel, user.id).await {
            return Err(GameError::InOtherGame { channel: other });
        }
        game.lock().await.sign_up_replacement(user)?;
        Ok(JoinOutcome::Replacement)
    }

    /// Leave the game in `channel`, confirming first when the departure
    /// would modkill or replace the player. `None` means the user backed
    /// out.
    pub async fn leave<C: ConfirmPrompt>(
        &self,
        channel: ChannelId,
        user: UserId,
        confirm: &C,
        now: DateTime<Utc>,
    ) -> Result<Option<Departure>, GameError> {
        let game = self.get(channel).await.ok_or(GameError::NoGame(channel))?;
        let prompt = game.lock().await.leave_prompt(user)?;
        let confirmed = match prompt {
            Some(prompt) => confirm.confirm(user, channel, prompt).await.is_yes(),
            None => true,
        };
        if !confirmed {
            return Ok(None);
        }
        self.with_game(channel, |g| g.leave(user, now))
            .await?
            .map(Some)
    }

    /// Start the game in `channel`. Host only.
    pub async fn start_game<R: Rng + ?Sized>(
        &self,
        channel: ChannelId,
        user: UserId,
        setup: Option<&str>,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<(), GameError> {
        let setups = Arc::clone(&self.setups);
        self.with_game(channel, |g| {
            if !g.is_host(user) {
                return Err(GameError::NotHost);
            }
            g.start(setups.as_ref(), setup, rng, now)
        })
        .await?
    }

    /// Delete the game in `channel`. Host only; a started game needs
    /// confirmation. Returns whether the game was deleted.
    pub async fn delete_game<C: ConfirmPrompt>(
        &self,
        channel: ChannelId,
        user: UserId,
        confirm: &C,
    ) -> Result<bool, GameError> {
        let game = self.get(channel).await.ok_or(GameError::NoGame(channel))?;
        let started = {
            let guard = game.lock().await;
            if !guard.is_host(user) {
                return Err(GameError::NotHost);
            }
            guard.has_started()
        };
        if started && !confirm.confirm(user, channel, DELETE_PROMPT).await.is_yes() {
            return Ok(false);
        }
        self.reap(channel).await;
        self.ports.messages.send(channel, "Deleted the game.");
        info!(%channel, %user, "game deleted by host");
        Ok(true)
    }

    /// The channel is gone; drop its game.
    pub async fn channel_deleted(&self, channel: ChannelId) {
        self.reap(channel).await;
    }

    /// The bot left `guild`; drop every game there.
    pub async fn guild_left(&self, guild: GuildId) {
        let mut doomed = Vec::new();
        for (channel, game) in self.snapshot().await {
            if game.lock().await.guild() == Some(guild) {
                doomed.push(channel);
            }
        }
        for channel in doomed {
            self.reap(channel).await;
        }
    }

    /// `user` left `guild`; free their seats there.
    pub async fn member_left(&self, guild: GuildId, user: UserId, now: DateTime<Utc>) {
        for (channel, game) in self.snapshot().await {
            let mut guard = game.lock().await;
            if guard.guild() != Some(guild) || !guard.involves(user) {
                continue;
            }
            match guard.remove_member(user, now) {
                Ok(departure) => info!(%channel, %user, ?departure, "member left the guild"),
                Err(e) => warn!(%channel, %user, error = %e, "could not remove departed member"),
            }
            let gone = guard.phase() == Phase::Ended || guard.players().is_empty();
            drop(guard);
            if gone {
                self.reap(channel).await;
            }
        }
    }

    /// Check every game's deadlines once and drop games that ended.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();
        let mut ended = Vec::new();
        for (channel, game) in self.snapshot().await {
            let mut guard = game.lock().await;
            match guard.update(now) {
                Tick::Waiting => {}
                Tick::Advanced => report.advanced = report.advanced.saturating_add(1),
                Tick::Expired => report.expired = report.expired.saturating_add(1),
            }
            if guard.phase() == Phase::Ended {
                ended.push(channel);
            }
        }
        for channel in ended {
            self.reap(channel).await;
        }
        report
    }
}
