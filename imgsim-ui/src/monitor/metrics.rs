//! Metrics derived from stats and health snapshots
//!
//! Nothing here is stored: derived values are recomputed from the latest
//! snapshots every time they are requested.

use chrono::{DateTime, Utc};
use imgsim_common::api::{HealthSnapshot, StatsSnapshot};
use serde::Serialize;

/// Status string the service reports for a healthy component
pub const HEALTHY: &str = "healthy";

/// Cache hit rate as a fraction in `[0, 1]`
///
/// `hits / (hits + misses)`, or `0.0` when there were no lookups.
pub fn cache_hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits.saturating_add(misses);
    if total == 0 {
        return 0.0;
    }
    hits as f64 / total as f64
}

/// Aggregates shown on the monitor dashboard
///
/// Fields are `None` until the snapshot they derive from has been fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedMetrics {
    /// Fraction of cache lookups that hit (0.0-1.0)
    pub cache_hit_rate: Option<f64>,
    pub total_lookups: Option<u64>,
    pub healthy_services: Option<usize>,
    pub total_services: Option<usize>,
    /// Overall service status is healthy
    pub service_healthy: Option<bool>,
}

impl DerivedMetrics {
    pub fn derive(stats: Option<&StatsSnapshot>, health: Option<&HealthSnapshot>) -> Self {
        let mut metrics = DerivedMetrics::default();

        if let Some(stats) = stats {
            let cache = &stats.cache;
            metrics.cache_hit_rate = Some(cache_hit_rate(cache.keyspace_hits, cache.keyspace_misses));
            metrics.total_lookups = Some(cache.keyspace_hits.saturating_add(cache.keyspace_misses));
        }

        if let Some(health) = health {
            metrics.healthy_services = Some(
                health
                    .services
                    .values()
                    .filter(|status| status.as_str() == HEALTHY)
                    .count(),
            );
            metrics.total_services = Some(health.services.len());
            metrics.service_healthy = Some(health.status == HEALTHY);
        }

        metrics
    }
}

/// Last-known-good snapshots plus poll bookkeeping
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub stats: Option<StatsSnapshot>,
    pub health: Option<HealthSnapshot>,
    pub stats_updated_at: Option<DateTime<Utc>>,
    pub health_updated_at: Option<DateTime<Utc>>,
    /// Completed ticks, scheduled and manual
    pub ticks: u64,
    /// Ticks where at least one of the two calls failed
    pub failed_ticks: u64,
}

impl MetricsSnapshot {
    pub fn derived(&self) -> DerivedMetrics {
        DerivedMetrics::derive(self.stats.as_ref(), self.health.as_ref())
    }
}

/// Snapshot with freshly derived metrics, as served to presentation
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    #[serde(flatten)]
    pub snapshot: MetricsSnapshot,
    pub derived: DerivedMetrics,
}

impl From<MetricsSnapshot> for MetricsReport {
    fn from(snapshot: MetricsSnapshot) -> Self {
        let derived = snapshot.derived();
        Self { snapshot, derived }
    }
}
