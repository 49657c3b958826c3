//! Metrics API handlers

use axum::{extract::State, routing::get, routing::post, Json, Router};
use serde::Serialize;

use crate::monitor::MetricsReport;
use crate::AppState;

/// POST /api/metrics/refresh response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub stats_ok: bool,
    pub health_ok: bool,
    pub metrics: MetricsReport,
}

/// GET /api/metrics
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsReport> {
    Json(state.poller.report().await)
}

/// POST /api/metrics/refresh
///
/// Runs one tick now. Failed calls keep the previous snapshot, as on a
/// scheduled tick.
pub async fn refresh_metrics(State(state): State<AppState>) -> Json<RefreshResponse> {
    let outcome = state.poller.tick().await;
    Json(RefreshResponse {
        stats_ok: outcome.stats_ok,
        health_ok: outcome.health_ok,
        metrics: state.poller.report().await,
    })
}

/// Build metrics routes
pub fn monitor_routes() -> Router<AppState> {
    Router::new()
        .route("/api/metrics", get(get_metrics))
        .route("/api/metrics/refresh", post(refresh_metrics))
}
