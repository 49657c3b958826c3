//! Index workflow state machine
//!
//! ```text
//! Idle -> AwaitingMetadata -> Requesting -> Succeeded -> Idle (form cleared)
//!                                  |
//!                                  +-------> Failed (image kept for resubmit)
//! ```
//!
//! Unlike search, choosing an image does not send anything: the user fills
//! in the optional image id and tags, then submits explicitly.

use imgsim_common::api::{IndexRequest, IndexResponse, Metadata};
use imgsim_common::events::Phase;
use serde::Serialize;
use serde_json::Value;

use super::{Completion, WorkflowError};
use crate::encoder::EncodedImage;

/// Stable user-facing message for any index failure
pub const INDEX_FAILED_MESSAGE: &str = "Indexing failed. Please try again.";

/// Index workflow phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexPhase {
    #[default]
    Idle,
    AwaitingMetadata,
    Requesting,
    Succeeded,
    Failed,
}

impl IndexPhase {
    /// Collapse onto the presentation phase
    pub fn public(self) -> Phase {
        match self {
            IndexPhase::Idle | IndexPhase::AwaitingMetadata => Phase::Idle,
            IndexPhase::Requesting => Phase::Loading,
            IndexPhase::Succeeded => Phase::Succeeded,
            IndexPhase::Failed => Phase::Failed,
        }
    }
}

/// Split free-text tags on commas, trimming and dropping empty entries
///
/// Never fails: any text yields a (possibly empty) list.
pub fn parse_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// Build index metadata from free-text tags
///
/// Always `{"tags": [...]}`, with an empty list for blank input.
pub fn tags_metadata(text: &str) -> Metadata {
    let tags = parse_tags(text).into_iter().map(Value::String).collect();
    let mut metadata = Metadata::new();
    metadata.insert("tags".to_string(), Value::Array(tags));
    metadata
}

/// Index workflow state
#[derive(Debug, Default)]
pub struct IndexOrchestrator {
    phase: IndexPhase,
    token: Option<u64>,
    image: Option<EncodedImage>,
    /// Trimmed; `None` lets the service generate one
    image_id: Option<String>,
    tags: String,
    last_response: Option<IndexResponse>,
    error: Option<String>,
}

impl IndexOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new file was chosen and is being encoded
    ///
    /// Supersedes any pending submission and drops the previous success.
    /// Image id and tags typed so far are kept.
    pub fn begin_selection(&mut self, token: u64) {
        self.token = Some(token);
        self.image = None;
        self.last_response = None;
        self.error = None;
        self.phase = IndexPhase::Idle;
    }

    /// True when `token` identifies the selection or submission in progress
    pub fn is_current(&self, token: u64) -> bool {
        self.token == Some(token)
    }

    /// Encoding finished; wait for the user to submit
    pub fn image_selected(&mut self, token: u64, image: EncodedImage) -> Completion {
        if !self.is_current(token) || self.phase != IndexPhase::Idle {
            return Completion::Superseded;
        }

        self.image = Some(image);
        self.phase = IndexPhase::AwaitingMetadata;
        Completion::Published
    }

    /// Update the optional form fields
    ///
    /// `None` leaves a field untouched. A blank image id clears it.
    pub fn set_metadata(&mut self, image_id: Option<String>, tags: Option<String>) {
        if let Some(id) = image_id {
            let id = id.trim();
            self.image_id = (!id.is_empty()).then(|| id.to_string());
        }
        if let Some(tags) = tags {
            self.tags = tags;
        }
    }

    /// Explicit user trigger: build the request to send
    pub fn submit(&mut self, token: u64) -> Result<IndexRequest, WorkflowError> {
        if self.phase == IndexPhase::Requesting {
            return Err(WorkflowError::RequestPending);
        }
        let image = self.image.as_ref().ok_or(WorkflowError::NoImageSelected)?;

        let request = IndexRequest {
            image_data: image.payload.clone(),
            image_id: self.image_id.clone(),
            metadata: tags_metadata(&self.tags),
        };

        self.token = Some(token);
        self.error = None;
        self.phase = IndexPhase::Requesting;
        Ok(request)
    }

    /// Publish a response if it belongs to the current submission
    ///
    /// `success: false` resolves to `Failed`. On success the form is cleared
    /// and the workflow returns to `Idle`; the response stays available for
    /// the success message.
    pub fn complete(&mut self, token: u64, response: IndexResponse) -> Completion {
        if !self.is_current(token) || self.phase != IndexPhase::Requesting {
            return Completion::Superseded;
        }

        if !response.success {
            self.error = Some(INDEX_FAILED_MESSAGE.to_string());
            self.phase = IndexPhase::Failed;
            return Completion::Published;
        }

        self.phase = IndexPhase::Succeeded;
        self.last_response = Some(response);
        self.clear_form();
        Completion::Published
    }

    /// Resolve the current selection or submission to `Failed`
    ///
    /// The image, if any, is kept so the user can resubmit.
    pub fn fail(&mut self, token: u64) -> Completion {
        if !self.is_current(token)
            || matches!(self.phase, IndexPhase::Succeeded | IndexPhase::Failed)
        {
            return Completion::Superseded;
        }

        self.error = Some(INDEX_FAILED_MESSAGE.to_string());
        self.phase = IndexPhase::Failed;
        Completion::Published
    }

    /// Back to `Idle`, clearing the form and any pending submission
    pub fn reset(&mut self) {
        self.clear_form();
        self.last_response = None;
    }

    fn clear_form(&mut self) {
        self.phase = IndexPhase::Idle;
        self.token = None;
        self.image = None;
        self.image_id = None;
        self.tags.clear();
        self.error = None;
    }

    pub fn phase(&self) -> IndexPhase {
        self.phase
    }

    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    pub fn image_id(&self) -> Option<&str> {
        self.image_id.as_deref()
    }

    /// Raw tag text as typed
    pub fn tags(&self) -> &str {
        &self.tags
    }

    /// Last successful response, kept after the form is cleared
    pub fn last_response(&self) -> Option<&IndexResponse> {
        self.last_response.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// "Image indexed successfully in X ms" for the last success
    pub fn success_message(&self) -> Option<String> {
        self.last_response.as_ref().map(|r| {
            format!("Image indexed successfully in {:.0}ms", r.processing_time_ms)
        })
    }
}
