//! Workflow mode and phase types shared by the controller and presentation

use serde::{Deserialize, Serialize};

/// Active client mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Query the index for visually similar images
    #[default]
    Search,
    /// Register a new image into the index
    Index,
    /// Observe collection, cache and health metrics
    Monitor,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Search => write!(f, "search"),
            Mode::Index => write!(f, "index"),
            Mode::Monitor => write!(f, "monitor"),
        }
    }
}

/// Which mutation workflow an event or state belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Workflow {
    Search,
    Index,
}

impl std::fmt::Display for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Workflow::Search => write!(f, "search"),
            Workflow::Index => write!(f, "index"),
        }
    }
}

/// Presentation-level phase of the active workflow
///
/// Workflow-specific phases (encoding, awaiting metadata, ...) collapse
/// onto these four for display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Loading => write!(f, "loading"),
            Phase::Succeeded => write!(f, "succeeded"),
            Phase::Failed => write!(f, "failed"),
        }
    }
}
