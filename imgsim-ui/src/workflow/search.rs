//! Search workflow state machine
//!
//! ```text
//! Idle -> Encoding -> Requesting -> Succeeded
//!            |            |
//!            +------------+-------> Failed
//! ```
//!
//! Every cycle carries a sequence token. A transition offered with any token
//! other than the current one is ignored, so a slow response from an earlier
//! submission can never overwrite a newer one.

use imgsim_common::api::{SearchRequest, SearchResponse};
use imgsim_common::config::SearchSettings;
use imgsim_common::events::Phase;
use serde::Serialize;

use super::Completion;
use crate::classifier::{classify_results, ClassifiedResult};
use crate::encoder::EncodedImage;

/// Stable user-facing message for any search failure
pub const SEARCH_FAILED_MESSAGE: &str = "Search failed. Please try again.";

/// Search workflow phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    #[default]
    Idle,
    Encoding,
    Requesting,
    Succeeded,
    Failed,
}

impl SearchPhase {
    /// Collapse onto the presentation phase
    pub fn public(self) -> Phase {
        match self {
            SearchPhase::Idle => Phase::Idle,
            SearchPhase::Encoding | SearchPhase::Requesting => Phase::Loading,
            SearchPhase::Succeeded => Phase::Succeeded,
            SearchPhase::Failed => Phase::Failed,
        }
    }
}

/// Search workflow state
#[derive(Debug, Default)]
pub struct SearchOrchestrator {
    phase: SearchPhase,
    token: Option<u64>,
    image: Option<EncodedImage>,
    response: Option<SearchResponse>,
    /// Tiers derived from `response`, rebuilt whenever it is replaced
    classified: Vec<ClassifiedResult>,
    error: Option<String>,
}

impl SearchOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh cycle for a newly chosen file
    ///
    /// Drops whatever the previous cycle left behind, including its preview.
    pub fn begin(&mut self, token: u64) {
        self.clear();
        self.token = Some(token);
        self.phase = SearchPhase::Encoding;
    }

    /// True when `token` identifies the cycle in progress
    pub fn is_current(&self, token: u64) -> bool {
        self.token == Some(token)
    }

    /// Record the encoded image and build the request to send
    ///
    /// Returns `None` when the cycle was superseded while encoding.
    pub fn encoded(
        &mut self,
        token: u64,
        image: EncodedImage,
        settings: &SearchSettings,
    ) -> Option<SearchRequest> {
        if !self.is_current(token) || self.phase != SearchPhase::Encoding {
            return None;
        }

        let request = SearchRequest::new(
            image.payload.clone(),
            settings.top_k,
            settings.threshold,
            settings.include_metadata,
        );
        self.image = Some(image);
        self.phase = SearchPhase::Requesting;
        Some(request)
    }

    /// Publish a response if it belongs to the current cycle
    ///
    /// The response is kept verbatim; result order is the service's.
    pub fn complete(&mut self, token: u64, response: SearchResponse) -> Completion {
        if !self.is_current(token) || self.phase != SearchPhase::Requesting {
            return Completion::Superseded;
        }

        self.classified = classify_results(&response.results);
        self.response = Some(response);
        self.error = None;
        self.phase = SearchPhase::Succeeded;
        Completion::Published
    }

    /// Resolve the current cycle to `Failed`
    pub fn fail(&mut self, token: u64) -> Completion {
        if !self.is_current(token) || self.phase.public() != Phase::Loading {
            return Completion::Superseded;
        }

        self.response = None;
        self.classified.clear();
        self.error = Some(SEARCH_FAILED_MESSAGE.to_string());
        self.phase = SearchPhase::Failed;
        Completion::Published
    }

    /// Back to `Idle`, forgetting the cycle in progress
    pub fn reset(&mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        self.phase = SearchPhase::Idle;
        self.token = None;
        self.image = None;
        self.response = None;
        self.classified.clear();
        self.error = None;
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    /// Image being searched; kept after success so the user sees the query
    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    pub fn response(&self) -> Option<&SearchResponse> {
        self.response.as_ref()
    }

    /// Results with their tiers, in service order
    pub fn results(&self) -> &[ClassifiedResult] {
        &self.classified
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// "Found N similar images in X ms", flagged when served from cache
    pub fn summary(&self) -> Option<String> {
        self.response.as_ref().map(|r| {
            format!(
                "Found {} similar images in {:.0}ms{}",
                r.total_found,
                r.search_time_ms,
                if r.cached { " (cached)" } else { "" }
            )
        })
    }
}
