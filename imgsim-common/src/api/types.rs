//! Request/response types for the remote service REST contract
//!
//! Field names match the service's snake_case JSON exactly. The client only
//! decodes structure here; semantic checks belong to the workflows.
//!
//! | Operation | Method & Path            | Body                  |
//! |-----------|--------------------------|-----------------------|
//! | search    | `POST /search`           | [`SearchRequest`]     |
//! | index     | `POST /index`            | [`IndexRequest`]      |
//! | delete    | `DELETE /index/{id}`     | none                  |
//! | stats     | `GET /stats`             | none                  |
//! | health    | `GET /health`            | none                  |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form metadata attached to an indexed image
pub type Metadata = Map<String, Value>;

// ========================================
// Search
// ========================================

/// POST /search request body
///
/// # Examples
///
/// ```
/// use imgsim_common::api::SearchRequest;
///
/// let request = SearchRequest::new("aGVsbG8=".to_string(), 10, 0.0, true);
/// assert_eq!(request.top_k, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Base64 image payload (no data URI prefix)
    pub image_data: String,
    /// Maximum number of results the service should return
    pub top_k: u32,
    /// Minimum similarity score (0.0-1.0), applied by the service
    pub threshold: f32,
    /// Ask the service to include per-result metadata
    pub include_metadata: bool,
}

impl SearchRequest {
    pub fn new(image_data: String, top_k: u32, threshold: f32, include_metadata: bool) -> Self {
        Self {
            image_data,
            top_k,
            threshold,
            include_metadata,
        }
    }
}

/// One ranked hit in a search response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    /// Identifier of the matching indexed image
    pub image_id: String,
    /// Similarity score (0.0-1.0)
    pub score: f64,
    /// Metadata stored with the image, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// POST /search response body
///
/// `results` arrive ranked by the service (score descending). The order is
/// trusted as-is and never re-sorted or re-filtered client-side, so
/// `total_found` always agrees with what the service counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query_id: String,
    pub results: Vec<SearchResultItem>,
    pub total_found: u64,
    pub search_time_ms: f64,
    pub cached: bool,
}

// ========================================
// Index
// ========================================

/// POST /index request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRequest {
    /// Base64 image payload (no data URI prefix)
    pub image_data: String,
    /// Caller-chosen id; the service generates one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// POST /index response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexResponse {
    pub image_id: String,
    pub success: bool,
    pub message: String,
    pub processing_time_ms: f64,
}

// ========================================
// Stats
// ========================================

/// Vector collection statistics reported by GET /stats
///
/// The vector store reports counts as nullable while a collection is
/// being optimized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub vector_size: u64,
    pub distance: String,
    #[serde(default)]
    pub points_count: Option<u64>,
    #[serde(default)]
    pub segments_count: Option<u64>,
}

/// Cache statistics reported by GET /stats
///
/// The cache backend omits counters it has not started yet, so every
/// field falls back to zero / empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheInfo {
    #[serde(default)]
    pub connected_clients: u64,
    #[serde(default)]
    pub used_memory: u64,
    #[serde(default)]
    pub used_memory_human: String,
    #[serde(default)]
    pub keyspace_hits: u64,
    #[serde(default)]
    pub keyspace_misses: u64,
    #[serde(default)]
    pub total_commands_processed: u64,
}

/// GET /stats response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub collection: CollectionInfo,
    pub cache: CacheInfo,
    pub status: String,
}

// ========================================
// Health
// ========================================

/// GET /health response body
///
/// `timestamp` is kept as the ISO-8601 string the service sent; the service
/// emits local time without an offset, which a strict UTC parse rejects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    /// Service name -> status string (e.g. "healthy", "unhealthy")
    #[serde(default)]
    pub services: BTreeMap<String, String>,
}
