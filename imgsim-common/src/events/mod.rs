//! Event types for the imgsim event system
//!
//! Events notify presentation of state changes. They never carry state the
//! workflow controller does not also hold; a late subscriber can always
//! catch up by reading the current view.

mod workflow_types;

pub use workflow_types::{Mode, Phase, Workflow};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// imgsim client event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Active mode changed (both workflows were reset)
    ModeChanged {
        old_mode: Mode,
        new_mode: Mode,
        timestamp: DateTime<Utc>,
    },

    /// A workflow moved to a new presentation phase
    WorkflowPhaseChanged {
        workflow: Workflow,
        phase: Phase,
        timestamp: DateTime<Utc>,
    },

    /// A search result was published
    SearchCompleted {
        query_id: String,
        total_found: u64,
        search_time_ms: f64,
        cached: bool,
        timestamp: DateTime<Utc>,
    },

    /// An image was indexed (the index form has been cleared)
    IndexCompleted {
        image_id: String,
        message: String,
        processing_time_ms: f64,
        timestamp: DateTime<Utc>,
    },

    /// A workflow resolved to Failed; `message` is the user-facing text
    WorkflowFailed {
        workflow: Workflow,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Metrics poller finished a tick
    MetricsUpdated {
        /// Overall health status, if a health snapshot is known
        status: Option<String>,
        /// Indexed vector count, if a stats snapshot is known
        points_count: Option<u64>,
        /// Cache hit rate as a fraction (0.0-1.0), if stats are known
        cache_hit_rate: Option<f64>,
        timestamp: DateTime<Utc>,
    },
}

impl ClientEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::ModeChanged { .. } => "ModeChanged",
            ClientEvent::WorkflowPhaseChanged { .. } => "WorkflowPhaseChanged",
            ClientEvent::SearchCompleted { .. } => "SearchCompleted",
            ClientEvent::IndexCompleted { .. } => "IndexCompleted",
            ClientEvent::WorkflowFailed { .. } => "WorkflowFailed",
            ClientEvent::MetricsUpdated { .. } => "MetricsUpdated",
        }
    }
}

/// Broadcast bus for [`ClientEvent`]s
///
/// Non-blocking publish; slow subscribers lag rather than stall producers.
///
/// # Examples
///
/// ```
/// use imgsim_common::events::{ClientEvent, EventBus, Mode};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(ClientEvent::ModeChanged {
///     old_mode: Mode::Search,
///     new_mode: Mode::Monitor,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ClientEvent,
    ) -> Result<usize, broadcast::error::SendError<ClientEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ClientEvent) {
        let _ = self.emit(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
