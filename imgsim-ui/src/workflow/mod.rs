//! Search and index workflows
//!
//! Each orchestrator is a plain state machine: the [`WorkflowController`]
//! owns both, hands out sequence tokens, performs the awaits, and feeds
//! results back through the orchestrators' transition calls.

pub mod controller;
pub mod index;
pub mod search;

pub use controller::{IndexView, SearchView, ViewState, WorkflowController, WorkflowResult, WorkflowState};
pub use index::{parse_tags, tags_metadata, IndexOrchestrator, IndexPhase, INDEX_FAILED_MESSAGE};
pub use search::{SearchOrchestrator, SearchPhase, SEARCH_FAILED_MESSAGE};

use imgsim_common::events::Mode;
use serde::Serialize;
use thiserror::Error;

/// Outcome of offering a completed request to an orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Completion {
    /// Token was current; the result is now visible
    Published,
    /// A newer cycle or a reset superseded the request; result dropped
    Superseded,
}

/// Workflow operation rejections
///
/// These reject an operation before any request is made. Failures of a
/// request in flight resolve to the `Failed` phase instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Operation belongs to a mode that is not active
    #[error("Operation requires {expected} mode, current mode is {actual}")]
    WrongMode { expected: Mode, actual: Mode },

    /// Index submission without a selected image
    #[error("No image selected")]
    NoImageSelected,

    /// Index submission while the previous one is still pending
    #[error("A request is already pending")]
    RequestPending,
}
