//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Module status ("ok")
    pub status: String,
    /// Module name ("imgsim-ui")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since the module started
    pub uptime_seconds: u64,
    /// Remote service base URL in use
    pub api_base_url: String,
}

/// GET /health
///
/// Liveness of this module only; remote service health is reported by the
/// metrics poller.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "imgsim-ui".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        api_base_url: state.api_base_url.clone(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
