//! # imgsim Common Library
//!
//! Shared code for the image similarity client including:
//! - REST wire types for the remote search/index service
//! - Event types (ClientEvent enum) and the event bus
//! - Workflow mode and phase enums shared with presentation
//! - Configuration loading and base URL resolution

pub mod api;
pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
