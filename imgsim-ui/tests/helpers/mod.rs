//! Test Helper Utilities
//!
//! Shared utilities for testing imgsim-ui

#![allow(dead_code)]

pub mod fake_service;
pub mod fixtures;

// Re-export commonly used items
pub use fake_service::FakeService;
pub use fixtures::{
    health_snapshot, index_response, jpeg_file, search_response, stats_snapshot, test_controller,
};
