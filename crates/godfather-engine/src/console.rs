//! Line-oriented console for playing on one machine.
//!
//! Each input line is `<name> <command> [args...]`, e.g. `alice vote bob`.
//! A name gets a stable user id the first time it is seen, and every
//! command acts on a single console channel. Prompts are answered yes.
//! Channel messages and DMs are written to stdout by [`ConsoleSink`].

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use godfather_core::game::{DayOutcome, Departure, Game, GameError, HostChange};
use godfather_core::ports::{AutoConfirm, Confirmation, DeliveryError, MessageSink, Notifier};
use godfather_core::registry::{GameRegistry, JoinOutcome};
use godfather_roles::{Player, RegistryError};
use godfather_types::{ActionKind, ChannelId, User, UserId};
use rand::rngs::StdRng;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::error::EngineError;

/// The one channel console games run in.
pub const CONSOLE_CHANNEL: ChannelId = ChannelId(1);

const YES: AutoConfirm = AutoConfirm(Confirmation::Yes);

/// A console line that could not be carried out.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The line is missing arguments.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// No command has this name.
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    /// The game rejected the command.
    #[error("{source}")]
    Game {
        /// The underlying game error.
        #[from]
        source: GameError,
    },
}

/// Parses console lines into registry calls.
#[derive(Debug)]
pub struct Console {
    registry: Arc<GameRegistry>,
    users: BTreeMap<String, UserId>,
    next_id: u64,
    rng: StdRng,
}

impl Console {
    /// A console over `registry`, rolling setups with `rng`.
    pub const fn new(registry: Arc<GameRegistry>, rng: StdRng) -> Self {
        Self {
            registry,
            users: BTreeMap::new(),
            next_id: 1,
            rng,
        }
    }

    fn user(&mut self, name: &str) -> User {
        let next_id = &mut self.next_id;
        let id = *self
            .users
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| {
                let id = UserId(*next_id);
                *next_id = next_id.saturating_add(1);
                id
            });
        User::new(id, name)
    }

    async fn game<T>(&self, f: impl FnOnce(&mut Game) -> T) -> Result<T, GameError> {
        self.registry.with_game(CONSOLE_CHANNEL, f).await
    }

    /// Carry out one line. Returns the reply to print, if any; game
    /// announcements go through the channel sink instead.
    #[allow(clippy::too_many_lines)]
    pub async fn handle(
        &mut self,
        line: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, ConsoleError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let Some(command) = words.next() else {
            return Err(ConsoleError::Usage("<name> <command> [args...]"));
        };
        let args: Vec<&str> = words.collect();
        let user = self.user(name);
        let id = user.id;

        let reply = match command.to_ascii_lowercase().as_str() {
            "create" => {
                self.registry.create(CONSOLE_CHANNEL, None, user, now).await?;
                None
            }
            "join" => match self.registry.join(CONSOLE_CHANNEL, user, &YES).await? {
                JoinOutcome::Joined => Some(format!("{name} joined the game.")),
                JoinOutcome::Replacement => Some(format!("{name} is now a replacement.")),
                JoinOutcome::Declined => None,
            },
            "leave" => match self.registry.leave(CONSOLE_CHANNEL, id, &YES, now).await? {
                Some(Departure::Left) => Some(format!("{name} left the game.")),
                Some(Departure::NoLongerReplacement) => {
                    Some(format!("{name} is no longer a replacement."))
                }
                Some(Departure::Replaced { .. } | Departure::Modkilled) | None => None,
            },
            "setup" => {
                let text = args.join(" ");
                self.game(|g| {
                    if !g.is_host(id) {
                        return Err(GameError::NotHost);
                    }
                    g.use_setup(&text).map(|_| ())
                })
                .await??;
                None
            }
            "start" => {
                let setup = args.first().copied();
                self.registry
                    .start_game(CONSOLE_CHANNEL, id, setup, &mut self.rng, now)
                    .await?;
                None
            }
            "delete" => {
                self.registry.delete_game(CONSOLE_CHANNEL, id, &YES).await?;
                None
            }
            "host" => match self.game(|g| g.change_host_vote(id)).await?? {
                HostChange::Pending { votes, needed } => {
                    Some(format!("{votes}/{needed} votes to change the host."))
                }
                HostChange::Changed { .. } => None,
            },
            "set" => {
                let [key, value] = args.as_slice() else {
                    return Err(ConsoleError::Usage(
                        "set <day_duration|night_duration|max_players> <value>",
                    ));
                };
                self.game(|g| g.configure(id, key, value)).await??;
                None
            }
            "vote" => {
                let [target] = args.as_slice() else {
                    return Err(ConsoleError::Usage("vote <player>"));
                };
                let outcome = self
                    .game(|g| {
                        let target = g.players().resolve(target)?.id();
                        g.submit_vote(id, target, now)
                    })
                    .await??;
                match outcome {
                    DayOutcome::Counted => Some(String::from("Vote counted.")),
                    DayOutcome::Lynched { .. } | DayOutcome::NoLynch => None,
                }
            }
            "nolynch" => match self.game(|g| g.submit_no_lynch(id, now)).await?? {
                DayOutcome::Counted => Some(String::from("Vote counted.")),
                DayOutcome::Lynched { .. } | DayOutcome::NoLynch => None,
            },
            "unvote" => {
                if self.game(|g| g.unvote(id)).await?? {
                    Some(String::from("Vote removed."))
                } else {
                    Some(String::from("You have not voted."))
                }
            }
            "votecount" | "vc" => Some(self.game(|g| g.vote_count()).await??),
            "status" => Some(self.game(|g| g.status(now)).await?),
            "players" => Some(self.game(|g| g.player_list()).await?),
            "rolepm" => {
                self.game(|g| g.resend_role_pm(id)).await??;
                None
            }
            "cancel" => {
                if self.game(|g| g.withdraw_night_action(id)).await?? {
                    Some(String::from("Action cancelled."))
                } else {
                    Some(String::from("You had no action to cancel."))
                }
            }
            other => {
                let kind = ActionKind::from_command(other)
                    .ok_or_else(|| ConsoleError::UnknownCommand(other.to_owned()))?;
                self.game(|g| {
                    let targets = args
                        .iter()
                        .map(|q| g.players().resolve(q).map(Player::id))
                        .collect::<Result<Vec<_>, RegistryError>>()?;
                    g.submit_night_action(id, kind, targets)
                })
                .await??;
                Some(format!("You will {kind} tonight."))
            }
        };
        Ok(reply)
    }
}

/// Serve stdin until it closes.
pub async fn run(mut console: Console) -> Result<(), EngineError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        let reply = match console.handle(&line, Utc::now()).await {
            Ok(Some(text)) => text,
            Ok(None) => continue,
            Err(e) => e.to_string(),
        };
        out.write_all(reply.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
    info!("console input closed");
    Ok(())
}

/// Prints channel messages and DMs to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl MessageSink for ConsoleSink {
    fn send(&self, channel: ChannelId, text: &str) {
        if let Err(e) = write_line(&format!("[#{channel}] {text}")) {
            warn!(%channel, error = %e, "console write failed");
        }
    }
}

impl Notifier for ConsoleSink {
    fn notify(&self, user: UserId, text: &str) -> Result<(), DeliveryError> {
        write_line(&format!("[DM {user}] {text}")).map_err(|e| DeliveryError::Failed(e.to_string()))
    }
}

fn write_line(line: &str) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{line}")?;
    out.flush()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use godfather_core::config::GameConfig;
    use godfather_core::ports::{MemorySink, Ports};
    use godfather_core::setup::StaticSetups;
    use rand::SeedableRng;

    use super::*;

    fn make_console() -> (Console, Arc<GameRegistry>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let registry = Arc::new(GameRegistry::new(
            Arc::new(StaticSetups::standard()),
            Ports::memory(&sink),
            GameConfig::default(),
        ));
        let console = Console::new(Arc::clone(&registry), StdRng::seed_from_u64(1));
        (console, registry, sink)
    }

    async fn say(console: &mut Console, line: &str) -> Result<Option<String>, ConsoleError> {
        console.handle(line, Utc::now()).await
    }

    #[tokio::test]
    async fn names_map_to_stable_ids() {
        let (mut console, _, _) = make_console();
        let a = console.user("Alice").id;
        let b = console.user("bob").id;
        assert_ne!(a, b);
        assert_eq!(console.user("alice").id, a);
    }

    #[tokio::test]
    async fn plays_a_short_game() {
        let (mut console, registry, sink) = make_console();
        assert_eq!(say(&mut console, "alice create").await.unwrap(), None);
        assert!(sink.saw("hosted by **alice**"));
        assert_eq!(
            say(&mut console, "bob join").await.unwrap().as_deref(),
            Some("bob joined the game.")
        );
        say(&mut console, "carol join").await.unwrap();

        let err = say(&mut console, "bob start").await.unwrap_err();
        assert_eq!(err.to_string(), "Only the host can do that.");

        say(&mut console, "alice setup Vanilla x2, Goon").await.unwrap();
        say(&mut console, "alice start").await.unwrap();
        let status = say(&mut console, "bob status").await.unwrap().unwrap();
        assert!(status.contains("Phase: Day 1"));

        assert_eq!(
            say(&mut console, "alice vote bob").await.unwrap().as_deref(),
            Some("Vote counted.")
        );
        assert_eq!(say(&mut console, "carol vote 2").await.unwrap(), None);
        assert!(sink.saw("bob was lynched."));
        assert!(sink.saw("The game is over."));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn rejects_bad_lines() {
        let (mut console, _, _) = make_console();
        assert_eq!(say(&mut console, "   ").await.unwrap(), None);
        assert!(matches!(
            say(&mut console, "alice").await,
            Err(ConsoleError::Usage(_))
        ));
        assert!(matches!(
            say(&mut console, "alice dance").await,
            Err(ConsoleError::UnknownCommand(_))
        ));
        assert!(matches!(
            say(&mut console, "alice status").await,
            Err(ConsoleError::Game {
                source: GameError::NoGame(_)
            })
        ));
        say(&mut console, "alice create").await.unwrap();
        assert!(matches!(
            say(&mut console, "alice set day_duration").await,
            Err(ConsoleError::Usage(_))
        ));
    }
}
