//! imgsim-ui library interface
//!
//! Client core for the image similarity-search service: image encoding,
//! the remote API client, search and index workflows, metrics polling, and
//! the local HTTP surface the browser presentation layer talks to.

pub mod api;
pub mod classifier;
pub mod client;
pub mod config;
pub mod encoder;
pub mod error;
pub mod monitor;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use chrono::{DateTime, Utc};
use imgsim_common::events::EventBus;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::monitor::MetricsPoller;
use crate::workflow::WorkflowController;

/// Largest accepted image upload
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<WorkflowController>,
    pub poller: Arc<MetricsPoller>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Remote service base URL, reported by /health
    pub api_base_url: String,
    /// Startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        controller: Arc<WorkflowController>,
        poller: Arc<MetricsPoller>,
        event_bus: EventBus,
        api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            controller,
            poller,
            event_bus,
            api_base_url: api_base_url.into(),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::workflow_routes())
        .merge(api::monitor_routes())
        .route("/events", get(api::event_stream))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
