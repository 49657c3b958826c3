//! Workflow controller
//!
//! Single owner of the client's mutable state: the active [`Mode`] and both
//! orchestrators. All transitions happen under one `RwLock`, which is never
//! held across an await. A mutation cycle therefore looks like:
//!
//! 1. lock, issue a sequence token, transition, unlock
//! 2. await encoding / the remote call
//! 3. lock, publish only if the token is still current, unlock
//!
//! Mode changes and resets invalidate tokens, so a result that arrives after
//! them is dropped rather than rendered. Requests are never aborted.

use std::sync::Arc;

use imgsim_common::api::{IndexResponse, SearchResponse};
use imgsim_common::config::SearchSettings;
use imgsim_common::events::{ClientEvent, EventBus, Mode, Phase, Workflow};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::index::{IndexOrchestrator, IndexPhase};
use super::search::{SearchOrchestrator, SearchPhase};
use super::{Completion, WorkflowError};
use crate::classifier::ClassifiedResult;
use crate::client::{ClientError, SimilarityService};
use crate::encoder::{self, EncodedImage, SelectedFile};

/// Result shown for the active workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "workflow", rename_all = "lowercase")]
pub enum WorkflowResult {
    Search(SearchResponse),
    Index(IndexResponse),
}

/// Presentation-level state of the active workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowState {
    pub mode: Mode,
    pub phase: Phase,
    pub last_result: Option<WorkflowResult>,
    /// Stable user-facing message when `phase` is `Failed`
    pub error: Option<String>,
}

/// Everything the search screen renders
#[derive(Debug, Clone, Serialize)]
pub struct SearchView {
    pub phase: SearchPhase,
    pub image: Option<EncodedImage>,
    pub results: Vec<ClassifiedResult>,
    pub total_found: Option<u64>,
    pub summary: Option<String>,
    pub error: Option<String>,
}

/// Everything the index screen renders
#[derive(Debug, Clone, Serialize)]
pub struct IndexView {
    pub phase: IndexPhase,
    pub image: Option<EncodedImage>,
    pub image_id: Option<String>,
    pub tags: String,
    pub last_response: Option<IndexResponse>,
    pub success_message: Option<String>,
    pub error: Option<String>,
}

/// Full view handed to presentation
#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub mode: Mode,
    pub state: WorkflowState,
    pub search: SearchView,
    pub index: IndexView,
}

struct ControllerState {
    mode: Mode,
    /// Last issued sequence token
    next_token: u64,
    search: SearchOrchestrator,
    index: IndexOrchestrator,
}

impl ControllerState {
    fn issue_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    fn require_mode(&self, expected: Mode) -> Result<(), WorkflowError> {
        if self.mode != expected {
            return Err(WorkflowError::WrongMode {
                expected,
                actual: self.mode,
            });
        }
        Ok(())
    }

    fn public_phase(&self, workflow: Workflow) -> Phase {
        match workflow {
            Workflow::Search => self.search.phase().public(),
            Workflow::Index => self.index.phase().public(),
        }
    }
}

/// Top-level client state holder
pub struct WorkflowController {
    service: Arc<dyn SimilarityService>,
    settings: SearchSettings,
    events: EventBus,
    inner: RwLock<ControllerState>,
}

impl WorkflowController {
    /// Create a controller in search mode with both workflows idle
    pub fn new(service: Arc<dyn SimilarityService>, settings: SearchSettings, events: EventBus) -> Self {
        Self {
            service,
            settings,
            events,
            inner: RwLock::new(ControllerState {
                mode: Mode::default(),
                next_token: 0,
                search: SearchOrchestrator::new(),
                index: IndexOrchestrator::new(),
            }),
        }
    }

    /// Switch mode
    ///
    /// Resets both workflows so any pending result is discarded when it
    /// arrives. Selecting the active mode is a no-op. Returns whether the
    /// mode changed.
    pub async fn set_mode(&self, mode: Mode) -> bool {
        let mut state = self.inner.write().await;
        let old_mode = state.mode;
        if old_mode == mode {
            return false;
        }

        let search_before = state.search.phase().public();
        let index_before = state.index.phase().public();
        state.search.reset();
        state.index.reset();
        state.mode = mode;

        info!("Mode changed: {} -> {}", old_mode, mode);
        self.events.emit_lossy(ClientEvent::ModeChanged {
            old_mode,
            new_mode: mode,
            timestamp: chrono::Utc::now(),
        });
        self.phase_changed(Workflow::Search, search_before, state.search.phase().public());
        self.phase_changed(Workflow::Index, index_before, state.index.phase().public());
        true
    }

    /// Explicit reset of the active workflow
    pub async fn reset(&self) {
        let mut state = self.inner.write().await;
        let workflow = match state.mode {
            Mode::Search => Workflow::Search,
            Mode::Index => Workflow::Index,
            Mode::Monitor => return,
        };

        let before = state.public_phase(workflow);
        match workflow {
            Workflow::Search => state.search.reset(),
            Workflow::Index => state.index.reset(),
        }
        debug!(workflow = %workflow, "Workflow reset");
        self.phase_changed(workflow, before, state.public_phase(workflow));
    }

    /// Run one search cycle for a newly chosen file
    ///
    /// Resolves when the cycle is published or superseded. Failures of the
    /// cycle itself (encoding, transport, service) end in the `Failed` phase
    /// and are not returned as errors.
    pub async fn submit_search(&self, file: SelectedFile) -> Result<Completion, WorkflowError> {
        let token = {
            let mut state = self.inner.write().await;
            state.require_mode(Mode::Search)?;
            let before = state.search.phase().public();
            let token = state.issue_token();
            state.search.begin(token);
            self.phase_changed(Workflow::Search, before, state.search.phase().public());
            token
        };
        debug!(workflow = "search", token, file = %file.name, "Search cycle started");

        let image = match encoder::encode(&file).await {
            Ok(image) => image,
            Err(e) => {
                warn!(workflow = "search", token, error = %e, "Image encoding failed");
                return Ok(self.fail(Workflow::Search, token).await);
            }
        };

        let request = {
            let mut state = self.inner.write().await;
            match state.search.encoded(token, image, &self.settings) {
                Some(request) => request,
                None => {
                    debug!(workflow = "search", token, "Search superseded during encoding");
                    return Ok(Completion::Superseded);
                }
            }
        };

        let response = match self.service.search(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.log_request_failure(Workflow::Search, token, &e);
                return Ok(self.fail(Workflow::Search, token).await);
            }
        };

        let mut state = self.inner.write().await;
        let event = ClientEvent::SearchCompleted {
            query_id: response.query_id.clone(),
            total_found: response.total_found,
            search_time_ms: response.search_time_ms,
            cached: response.cached,
            timestamp: chrono::Utc::now(),
        };

        let completion = state.search.complete(token, response);
        match completion {
            Completion::Published => {
                info!(workflow = "search", token, "Search results published");
                self.phase_changed(Workflow::Search, Phase::Loading, Phase::Succeeded);
                self.events.emit_lossy(event);
            }
            Completion::Superseded => {
                warn!(workflow = "search", token, "Discarding stale search response");
            }
        }
        Ok(completion)
    }

    /// Choose the image to index
    ///
    /// Encodes the file and waits for an explicit [`submit_index`]. A pending
    /// submission is superseded.
    ///
    /// [`submit_index`]: Self::submit_index
    pub async fn select_index_image(&self, file: SelectedFile) -> Result<Completion, WorkflowError> {
        let token = {
            let mut state = self.inner.write().await;
            state.require_mode(Mode::Index)?;
            let before = state.index.phase().public();
            let token = state.issue_token();
            state.index.begin_selection(token);
            self.phase_changed(Workflow::Index, before, state.index.phase().public());
            token
        };
        debug!(workflow = "index", token, file = %file.name, "Index image selected");

        let image = match encoder::encode(&file).await {
            Ok(image) => image,
            Err(e) => {
                warn!(workflow = "index", token, error = %e, "Image encoding failed");
                return Ok(self.fail(Workflow::Index, token).await);
            }
        };

        let mut state = self.inner.write().await;
        Ok(state.index.image_selected(token, image))
    }

    /// Update the optional image id and free-text tags
    pub async fn update_index_metadata(
        &self,
        image_id: Option<String>,
        tags: Option<String>,
    ) -> Result<(), WorkflowError> {
        let mut state = self.inner.write().await;
        state.require_mode(Mode::Index)?;
        state.index.set_metadata(image_id, tags);
        Ok(())
    }

    /// Submit the selected image for indexing
    pub async fn submit_index(&self) -> Result<Completion, WorkflowError> {
        let (token, request) = {
            let mut state = self.inner.write().await;
            state.require_mode(Mode::Index)?;
            let before = state.index.phase().public();
            let token = state.issue_token();
            let request = state.index.submit(token)?;
            self.phase_changed(Workflow::Index, before, state.index.phase().public());
            (token, request)
        };
        debug!(workflow = "index", token, image_id = ?request.image_id, "Index submission started");

        let response = match self.service.index(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.log_request_failure(Workflow::Index, token, &e);
                return Ok(self.fail(Workflow::Index, token).await);
            }
        };

        let mut state = self.inner.write().await;
        let success = response.success;
        let event = ClientEvent::IndexCompleted {
            image_id: response.image_id.clone(),
            message: response.message.clone(),
            processing_time_ms: response.processing_time_ms,
            timestamp: chrono::Utc::now(),
        };
        if !success {
            warn!(
                workflow = "index",
                token,
                message = %response.message,
                "Service reported unsuccessful indexing"
            );
        }

        let completion = state.index.complete(token, response);
        match completion {
            Completion::Published if success => {
                info!(workflow = "index", token, "Image indexed");
                self.phase_changed(Workflow::Index, Phase::Loading, Phase::Succeeded);
                self.events.emit_lossy(event);
                self.phase_changed(Workflow::Index, Phase::Succeeded, state.index.phase().public());
            }
            Completion::Published => {
                self.publish_failure(Workflow::Index, state.index.error());
            }
            Completion::Superseded => {
                warn!(workflow = "index", token, "Discarding stale index response");
            }
        }
        Ok(completion)
    }

    /// Remove an image from the remote index
    pub async fn delete_image(&self, image_id: &str) -> Result<(), ClientError> {
        match self.service.delete_image(image_id).await {
            Ok(()) => {
                info!(image_id = %image_id, "Image deleted from index");
                Ok(())
            }
            Err(e) => {
                warn!(image_id = %image_id, cause = e.kind(), error = %e, "Image delete failed");
                Err(e)
            }
        }
    }

    /// Presentation state of the active workflow
    pub async fn state(&self) -> WorkflowState {
        let state = self.inner.read().await;
        Self::workflow_state(&state)
    }

    /// Full view for rendering
    pub async fn view(&self) -> ViewState {
        let state = self.inner.read().await;
        let search = &state.search;
        let index = &state.index;

        ViewState {
            mode: state.mode,
            state: Self::workflow_state(&state),
            search: SearchView {
                phase: search.phase(),
                image: search.image().cloned(),
                results: search.results().to_vec(),
                total_found: search.response().map(|r| r.total_found),
                summary: search.summary(),
                error: search.error().map(String::from),
            },
            index: IndexView {
                phase: index.phase(),
                image: index.image().cloned(),
                image_id: index.image_id().map(String::from),
                tags: index.tags().to_string(),
                last_response: index.last_response().cloned(),
                success_message: index.success_message(),
                error: index.error().map(String::from),
            },
        }
    }

    fn workflow_state(state: &ControllerState) -> WorkflowState {
        match state.mode {
            Mode::Search => WorkflowState {
                mode: Mode::Search,
                phase: state.search.phase().public(),
                last_result: state.search.response().cloned().map(WorkflowResult::Search),
                error: state.search.error().map(String::from),
            },
            Mode::Index => WorkflowState {
                mode: Mode::Index,
                phase: state.index.phase().public(),
                last_result: state.index.last_response().cloned().map(WorkflowResult::Index),
                error: state.index.error().map(String::from),
            },
            Mode::Monitor => WorkflowState {
                mode: Mode::Monitor,
                phase: Phase::Idle,
                last_result: None,
                error: None,
            },
        }
    }

    /// Resolve a cycle to `Failed` if it is still current
    async fn fail(&self, workflow: Workflow, token: u64) -> Completion {
        let mut state = self.inner.write().await;
        let completion = match workflow {
            Workflow::Search => state.search.fail(token),
            Workflow::Index => state.index.fail(token),
        };

        match completion {
            Completion::Published => {
                let message = match workflow {
                    Workflow::Search => state.search.error(),
                    Workflow::Index => state.index.error(),
                };
                self.publish_failure(workflow, message);
            }
            Completion::Superseded => {
                debug!(workflow = %workflow, token, "Failure of superseded request dropped");
            }
        }
        completion
    }

    fn publish_failure(&self, workflow: Workflow, message: Option<&str>) {
        self.events.emit_lossy(ClientEvent::WorkflowPhaseChanged {
            workflow,
            phase: Phase::Failed,
            timestamp: chrono::Utc::now(),
        });
        self.events.emit_lossy(ClientEvent::WorkflowFailed {
            workflow,
            message: message.unwrap_or_default().to_string(),
            timestamp: chrono::Utc::now(),
        });
    }

    fn log_request_failure(&self, workflow: Workflow, token: u64, error: &ClientError) {
        warn!(
            workflow = %workflow,
            token,
            cause = error.kind(),
            status = ?error.status_code(),
            service_side = error.is_service_side(),
            error = %error,
            "Request failed"
        );
    }

    fn phase_changed(&self, workflow: Workflow, before: Phase, after: Phase) {
        if before == after {
            return;
        }
        self.events.emit_lossy(ClientEvent::WorkflowPhaseChanged {
            workflow,
            phase: after,
            timestamp: chrono::Utc::now(),
        });
    }
}
