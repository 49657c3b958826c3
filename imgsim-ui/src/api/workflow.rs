//! Workflow API handlers
//!
//! Image uploads arrive as the raw request body; `Content-Type` declares the
//! media kind and `?name=` the file name. Requests resolve once the cycle is
//! published or superseded, and answer with the resulting workflow state.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use imgsim_common::events::Mode;
use serde::{Deserialize, Serialize};

use crate::encoder::SelectedFile;
use crate::error::{ApiError, ApiResult};
use crate::workflow::{Completion, ViewState, WorkflowState};
use crate::AppState;

const DEFAULT_UPLOAD_NAME: &str = "upload";

/// POST /api/mode request
#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: Mode,
}

/// POST /api/mode response
#[derive(Debug, Serialize)]
pub struct ModeResponse {
    pub mode: Mode,
    /// False when the requested mode was already active
    pub changed: bool,
}

/// Upload query parameters
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub name: Option<String>,
}

/// POST /api/index/submit request
#[derive(Debug, Default, Deserialize)]
pub struct IndexSubmitRequest {
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

/// Response to a search or index operation
#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub completion: Completion,
    pub state: WorkflowState,
}

/// Build a selected file from an upload
///
/// Without a `Content-Type`, the media kind is guessed from the name.
fn selected_file(headers: &HeaderMap, query: UploadQuery, body: Bytes) -> ApiResult<SelectedFile> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Empty image upload".to_string()));
    }

    let name = query
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());
    let media_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| {
            mime_guess::from_path(&name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

    Ok(SelectedFile::from_bytes(name, media_type, body.to_vec()))
}

/// GET /api/state
pub async fn get_state(State(state): State<AppState>) -> Json<WorkflowState> {
    Json(state.controller.state().await)
}

/// GET /api/view
pub async fn get_view(State(state): State<AppState>) -> Json<ViewState> {
    Json(state.controller.view().await)
}

/// POST /api/mode
pub async fn set_mode(
    State(state): State<AppState>,
    payload: Result<Json<ModeRequest>, JsonRejection>,
) -> ApiResult<Json<ModeResponse>> {
    let Json(request) = payload?;
    let changed = state.controller.set_mode(request.mode).await;
    Ok(Json(ModeResponse {
        mode: request.mode,
        changed,
    }))
}

/// POST /api/reset
pub async fn reset(State(state): State<AppState>) -> Json<WorkflowState> {
    state.controller.reset().await;
    Json(state.controller.state().await)
}

/// POST /api/search
///
/// Search failures resolve to the `Failed` phase with a 200 response; only
/// operations rejected up front are HTTP errors.
pub async fn submit_search(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WorkflowResponse>> {
    let file = selected_file(&headers, query, body)?;
    let completion = state.controller.submit_search(file).await?;

    Ok(Json(WorkflowResponse {
        completion,
        state: state.controller.state().await,
    }))
}

/// POST /api/index/image
pub async fn select_index_image(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WorkflowResponse>> {
    let file = selected_file(&headers, query, body)?;
    let completion = state.controller.select_index_image(file).await?;

    Ok(Json(WorkflowResponse {
        completion,
        state: state.controller.state().await,
    }))
}

/// POST /api/index/submit
pub async fn submit_index(
    State(state): State<AppState>,
    payload: Result<Json<IndexSubmitRequest>, JsonRejection>,
) -> ApiResult<Json<WorkflowResponse>> {
    let Json(request) = payload?;
    state
        .controller
        .update_index_metadata(request.image_id, request.tags)
        .await?;
    let completion = state.controller.submit_index().await?;

    Ok(Json(WorkflowResponse {
        completion,
        state: state.controller.state().await,
    }))
}

/// DELETE /api/images/:image_id
pub async fn delete_image(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.controller.delete_image(&image_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build workflow routes
pub fn workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/view", get(get_view))
        .route("/api/mode", post(set_mode))
        .route("/api/reset", post(reset))
        .route("/api/search", post(submit_search))
        .route("/api/index/image", post(select_index_image))
        .route("/api/index/submit", post(submit_index))
        .route("/api/images/:image_id", delete(delete_image))
}
