//! Wire types for the remote similarity-search service
//!
//! Base path `/api/v1`, JSON bodies throughout.

pub mod types;

pub use types::{
    CacheInfo, CollectionInfo, HealthSnapshot, IndexRequest, IndexResponse, Metadata, SearchRequest,
    SearchResponse, SearchResultItem, StatsSnapshot,
};
