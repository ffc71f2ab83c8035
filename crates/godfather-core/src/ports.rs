//! Boundaries to the chat platform and to storage.
//!
//! The game never talks to a platform directly. It sends channel messages
//! through a [`MessageSink`], role PMs through a [`Notifier`], asks yes/no
//! questions through a [`ConfirmPrompt`], and hands finished matches to an
//! [`OutcomeSink`]. Failures on any of these never abort game logic.
//!
//! # Stock implementations
//!
//! - [`NullOutcomeSink`] -- discards outcomes
//! - [`JsonLinesOutcomeSink`] -- appends one JSON line per outcome
//! - [`MemorySink`] -- records everything, for tests and replays
//! - [`AutoConfirm`] -- answers every prompt the same way

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use godfather_types::{ChannelId, MatchOutcome, UserId};
use tracing::debug;

/// A direct message could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The user does not accept direct messages from us.
    #[error("the user does not accept direct messages")]
    Forbidden,

    /// Delivery failed for another reason.
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// A match outcome could not be stored.
#[derive(Debug, thiserror::Error)]
pub enum OutcomeError {
    /// Writing the record failed.
    #[error("failed to write outcome: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Encoding the record failed.
    #[error("failed to encode outcome: {source}")]
    Json {
        /// The underlying encoding error.
        #[from]
        source: serde_json::Error,
    },
}

/// Public messages to a game channel. Fire-and-forget.
pub trait MessageSink: core::fmt::Debug + Send + Sync {
    /// Post `text` to `channel`.
    fn send(&self, channel: ChannelId, text: &str);
}

/// Private messages to a single user.
pub trait Notifier: core::fmt::Debug + Send + Sync {
    /// Deliver `text` to `user`.
    fn notify(&self, user: UserId, text: &str) -> Result<(), DeliveryError>;
}

/// Append-only store of finished matches.
pub trait OutcomeSink: core::fmt::Debug + Send + Sync {
    /// Store one outcome.
    fn record(&self, outcome: &MatchOutcome) -> Result<(), OutcomeError>;
}

/// Answer to a yes/no prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The user agreed.
    Yes,
    /// The user declined.
    No,
    /// Nobody answered in time. Treated like a decline.
    TimedOut,
}

impl Confirmation {
    /// Only an explicit yes counts.
    pub const fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }
}

/// Asks a user a yes/no question in a channel.
pub trait ConfirmPrompt: Send + Sync {
    /// Ask `user` and wait for the answer.
    fn confirm(
        &self,
        user: UserId,
        channel: ChannelId,
        prompt: &str,
    ) -> impl Future<Output = Confirmation> + Send;
}

/// The collaborators one game talks to.
#[derive(Debug, Clone)]
pub struct Ports {
    /// Channel messages.
    pub messages: Arc<dyn MessageSink>,
    /// Role PMs and night prompts.
    pub notifier: Arc<dyn Notifier>,
    /// Finished matches.
    pub outcomes: Arc<dyn OutcomeSink>,
}

impl Ports {
    /// Bundle the three sinks.
    pub fn new(
        messages: Arc<dyn MessageSink>,
        notifier: Arc<dyn Notifier>,
        outcomes: Arc<dyn OutcomeSink>,
    ) -> Self {
        Self {
            messages,
            notifier,
            outcomes,
        }
    }

    /// Route everything into one recording sink.
    pub fn memory(sink: &Arc<MemorySink>) -> Self {
        Self::new(sink.clone(), sink.clone(), sink.clone())
    }
}

// ---------------------------------------------------------------------------
// NullOutcomeSink
// ---------------------------------------------------------------------------

/// Drops every outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOutcomeSink;

impl OutcomeSink for NullOutcomeSink {
    fn record(&self, outcome: &MatchOutcome) -> Result<(), OutcomeError> {
        debug!(game_id = %outcome.game_id, "outcome discarded");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonLinesOutcomeSink
// ---------------------------------------------------------------------------

/// Appends each outcome as one JSON line to a file.
#[derive(Debug, Clone)]
pub struct JsonLinesOutcomeSink {
    path: PathBuf,
}

impl JsonLinesOutcomeSink {
    /// Write to `path`, creating it on first use.
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl OutcomeSink for JsonLinesOutcomeSink {
    fn record(&self, outcome: &MatchOutcome) -> Result<(), OutcomeError> {
        let line = serde_json::to_string(outcome)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        debug!(game_id = %outcome.game_id, path = %self.path.display(), "outcome recorded");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Records every message, notification, and outcome.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<(ChannelId, String)>>,
    notifications: Mutex<Vec<(UserId, String)>>,
    outcomes: Mutex<Vec<MatchOutcome>>,
    forbidden: Mutex<BTreeSet<UserId>>,
}

impl MemorySink {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse direct messages to `user` from now on.
    pub fn forbid(&self, user: UserId) {
        self.forbidden
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user);
    }

    /// Every channel message, in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Whether any channel message contains `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|(_, text)| text.contains(needle))
    }

    /// Every delivered direct message to `user`, in order.
    pub fn notifications_to(&self, user: UserId) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(to, _)| *to == user)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Every recorded outcome.
    pub fn outcomes(&self) -> Vec<MatchOutcome> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forget every message and notification.
    pub fn clear(&self) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl MessageSink for MemorySink {
    fn send(&self, channel: ChannelId, text: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((channel, text.to_owned()));
    }
}

impl Notifier for MemorySink {
    fn notify(&self, user: UserId, text: &str) -> Result<(), DeliveryError> {
        if self
            .forbidden
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&user)
        {
            return Err(DeliveryError::Forbidden);
        }
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((user, text.to_owned()));
        Ok(())
    }
}

impl OutcomeSink for MemorySink {
    fn record(&self, outcome: &MatchOutcome) -> Result<(), OutcomeError> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AutoConfirm
// ---------------------------------------------------------------------------

/// Answers every prompt with the same value.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub Confirmation);

impl ConfirmPrompt for AutoConfirm {
    fn confirm(
        &self,
        user: UserId,
        channel: ChannelId,
        prompt: &str,
    ) -> impl Future<Output = Confirmation> + Send {
        debug!(%user, %channel, prompt, answer = ?self.0, "prompt answered automatically");
        std::future::ready(self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use godfather_types::{GameId, PlayerResult};

    use super::*;

    fn make_outcome() -> MatchOutcome {
        MatchOutcome {
            game_id: GameId::new(),
            setup: String::from("cop5"),
            winning_faction: Some(String::from("Town")),
            independent_winners: Vec::new(),
            players: vec![PlayerResult {
                user: UserId(1),
                faction: String::from("Town"),
                role: String::from("Cop"),
                won: true,
            }],
            ended_at: Utc::now(),
        }
    }

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.send(ChannelId(9), "first");
        sink.send(ChannelId(9), "second");
        assert_eq!(sink.messages(), vec!["first", "second"]);
        assert!(sink.saw("sec"));
        assert!(!sink.saw("third"));
    }

    #[test]
    fn forbidden_users_get_no_notifications() {
        let sink = MemorySink::new();
        sink.forbid(UserId(2));
        assert_eq!(sink.notify(UserId(2), "hi"), Err(DeliveryError::Forbidden));
        sink.notify(UserId(1), "hi").unwrap();
        assert_eq!(sink.notifications_to(UserId(1)), vec!["hi"]);
        assert!(sink.notifications_to(UserId(2)).is_empty());
    }

    #[test]
    fn json_lines_sink_appends_one_line_per_outcome() {
        let path = std::env::temp_dir().join(format!("godfather-{}.jsonl", GameId::new()));
        let sink = JsonLinesOutcomeSink::new(path.clone());
        let outcome = make_outcome();
        sink.record(&outcome).unwrap();
        sink.record(&outcome).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: MatchOutcome = serde_json::from_str(lines.first().unwrap()).unwrap();
        assert_eq!(parsed, outcome);
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn timeouts_are_not_a_yes() {
        let answer = AutoConfirm(Confirmation::TimedOut)
            .confirm(UserId(1), ChannelId(1), "sure?")
            .await;
        assert!(!answer.is_yes());
        assert!(
            AutoConfirm(Confirmation::Yes)
                .confirm(UserId(1), ChannelId(1), "sure?")
                .await
                .is_yes()
        );
    }
}
