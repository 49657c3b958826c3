//! HTTP API handlers for imgsim-ui
//!
//! The browser presentation layer drives the client core through these
//! routes and listens on `/events` for state changes.

pub mod health;
pub mod monitor;
pub mod sse;
pub mod workflow;

pub use health::health_routes;
pub use monitor::monitor_routes;
pub use sse::event_stream;
pub use workflow::workflow_routes;
