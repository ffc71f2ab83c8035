//! Background loop that advances phases on their deadlines.
//!
//! [`run_driver`] polls the [`GameRegistry`] on a fixed interval: days and
//! nights past their deadline move on, and lobbies idle past the timeout
//! are removed. It stops when [`DriverControl::request_stop`] is called.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::registry::GameRegistry;

/// Stop switch shared between the driver task and its owner.
#[derive(Debug, Default)]
pub struct DriverControl {
    stop_requested: AtomicBool,
    wake: Notify,
}

impl DriverControl {
    /// A control with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the driver to stop. It exits without waiting for the next poll.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }
}

/// Totals over a driver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverSummary {
    /// Polls performed.
    pub ticks: u64,
    /// Phase changes triggered by deadlines.
    pub advanced: u64,
    /// Idle lobbies removed.
    pub expired: u64,
}

/// Poll `registry` every `interval` until a stop is requested.
pub async fn run_driver(
    registry: Arc<GameRegistry>,
    control: Arc<DriverControl>,
    interval: Duration,
) -> DriverSummary {
    let mut summary = DriverSummary::default();
    info!(interval_ms = interval.as_millis(), "phase driver starting");

    loop {
        if control.is_stop_requested() {
            break;
        }

        let report = registry.tick(Utc::now()).await;
        summary.ticks = summary.ticks.saturating_add(1);
        summary.advanced = summary.advanced.saturating_add(count(report.advanced));
        summary.expired = summary.expired.saturating_add(count(report.expired));
        if report.advanced > 0 || report.expired > 0 {
            debug!(
                advanced = report.advanced,
                expired = report.expired,
                "driver pass"
            );
        }

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            () = control.wake.notified() => {}
        }
    }

    info!(
        ticks = summary.ticks,
        advanced = summary.advanced,
        expired = summary.expired,
        "phase driver stopped"
    );
    summary
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use godfather_types::{ChannelId, User};

    use super::*;
    use crate::config::GameConfig;
    use crate::ports::{MemorySink, Ports};
    use crate::setup::StaticSetups;

    fn make_registry(idle_timeout_secs: u64) -> (Arc<GameRegistry>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let config = GameConfig {
            idle_timeout_secs,
            ..GameConfig::default()
        };
        let registry = GameRegistry::new(
            Arc::new(StaticSetups::standard()),
            Ports::memory(&sink),
            config,
        );
        (Arc::new(registry), sink)
    }

    #[tokio::test]
    async fn stops_immediately_when_asked_first() {
        let (registry, _) = make_registry(900);
        let control = Arc::new(DriverControl::new());
        control.request_stop();
        let summary = run_driver(registry, control, Duration::from_secs(1)).await;
        assert_eq!(summary, DriverSummary::default());
    }

    #[tokio::test(start_paused = true)]
    async fn expires_idle_lobbies_and_stops_on_request() {
        let (registry, sink) = make_registry(0);
        registry
            .create(ChannelId(1), None, User::new(1_u64, "p1"), Utc::now())
            .await
            .unwrap();

        let control = Arc::new(DriverControl::new());
        let task = tokio::spawn(run_driver(
            Arc::clone(&registry),
            Arc::clone(&control),
            Duration::from_millis(50),
        ));

        tokio::time::sleep(Duration::from_millis(120)).await;
        control.request_stop();
        let summary = task.await.unwrap();

        assert!(summary.ticks >= 1);
        assert_eq!(summary.expired, 1);
        assert!(registry.is_empty().await);
        assert!(sink.saw("The game took too long to start, deleting it."));
    }
}
