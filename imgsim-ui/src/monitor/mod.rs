//! Service monitoring

pub mod metrics;
pub mod poller;

pub use metrics::{cache_hit_rate, DerivedMetrics, MetricsReport, MetricsSnapshot};
pub use poller::{MetricsPoller, TickOutcome};
