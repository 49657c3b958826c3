//! Periodic stats and health polling
//!
//! Runs independently of the active mode. Each tick fetches stats and health
//! concurrently; a failed call is logged and otherwise ignored, leaving the
//! previous snapshot in place. A failing tick never stops later ticks.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use imgsim_common::events::{ClientEvent, EventBus};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::metrics::{MetricsReport, MetricsSnapshot};
use crate::client::SimilarityService;

/// Which calls of a tick succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub stats_ok: bool,
    pub health_ok: bool,
}

/// Stats/health poller
pub struct MetricsPoller {
    service: Arc<dyn SimilarityService>,
    interval: Duration,
    latest: RwLock<MetricsSnapshot>,
    events: EventBus,
}

impl MetricsPoller {
    pub fn new(service: Arc<dyn SimilarityService>, interval: Duration, events: EventBus) -> Self {
        Self {
            service,
            interval,
            latest: RwLock::new(MetricsSnapshot::default()),
            events,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fetch stats and health once
    ///
    /// Used by the scheduled loop and by manual refresh.
    pub async fn tick(&self) -> TickOutcome {
        let (stats, health) = tokio::join!(self.service.get_stats(), self.service.get_health());
        let now = Utc::now();

        let mut latest = self.latest.write().await;
        latest.ticks += 1;

        let stats_ok = match stats {
            Ok(stats) => {
                latest.stats = Some(stats);
                latest.stats_updated_at = Some(now);
                true
            }
            Err(e) => {
                warn!(cause = e.kind(), error = %e, "Stats poll failed, keeping last snapshot");
                false
            }
        };

        let health_ok = match health {
            Ok(health) => {
                latest.health = Some(health);
                latest.health_updated_at = Some(now);
                true
            }
            Err(e) => {
                warn!(cause = e.kind(), error = %e, "Health poll failed, keeping last snapshot");
                false
            }
        };

        if !(stats_ok && health_ok) {
            latest.failed_ticks += 1;
        }

        let derived = latest.derived();
        self.events.emit_lossy(ClientEvent::MetricsUpdated {
            status: latest.health.as_ref().map(|h| h.status.clone()),
            points_count: latest.stats.as_ref().and_then(|s| s.collection.points_count),
            cache_hit_rate: derived.cache_hit_rate,
            timestamp: now,
        });
        debug!(tick = latest.ticks, stats_ok, health_ok, "Metrics tick complete");

        TickOutcome { stats_ok, health_ok }
    }

    /// Copy of the last-known-good snapshots
    pub async fn snapshot(&self) -> MetricsSnapshot {
        self.latest.read().await.clone()
    }

    /// Snapshot with freshly derived metrics
    pub async fn report(&self) -> MetricsReport {
        MetricsReport::from(self.snapshot().await)
    }

    /// Poll until `shutdown` is cancelled
    ///
    /// The first tick runs immediately. A tick in progress is allowed to
    /// finish; slow ticks delay the schedule instead of bursting.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "Metrics poller started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Metrics poller stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// Spawn [`run`](Self::run) on the runtime
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}
