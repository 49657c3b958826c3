//! Test fixtures: sample files, responses and a wired-up controller

use std::collections::BTreeMap;
use std::sync::Arc;

use imgsim_common::api::{
    CacheInfo, CollectionInfo, HealthSnapshot, IndexResponse, SearchResponse, SearchResultItem,
    StatsSnapshot,
};
use imgsim_common::config::SearchSettings;
use imgsim_common::events::EventBus;
use imgsim_ui::encoder::SelectedFile;
use imgsim_ui::workflow::WorkflowController;

use super::FakeService;

/// JPEG magic bytes followed by a marker unique to `name`
pub fn jpeg_file(name: &str) -> SelectedFile {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend_from_slice(name.as_bytes());
    SelectedFile::from_bytes(name, "image/jpeg", bytes)
}

pub fn search_response(query_id: &str, results: &[(&str, f64)]) -> SearchResponse {
    SearchResponse {
        query_id: query_id.to_string(),
        results: results
            .iter()
            .map(|(id, score)| SearchResultItem {
                image_id: id.to_string(),
                score: *score,
                metadata: None,
            })
            .collect(),
        total_found: results.len() as u64,
        search_time_ms: 12.3,
        cached: false,
    }
}

pub fn index_response(image_id: &str, success: bool) -> IndexResponse {
    IndexResponse {
        image_id: image_id.to_string(),
        success,
        message: if success {
            "Image indexed successfully".to_string()
        } else {
            "Failed to index image".to_string()
        },
        processing_time_ms: 48.0,
    }
}

pub fn stats_snapshot(hits: u64, misses: u64) -> StatsSnapshot {
    StatsSnapshot {
        collection: CollectionInfo {
            name: "image_embeddings".to_string(),
            vector_size: 512,
            distance: "Cosine".to_string(),
            points_count: Some(1500),
            segments_count: Some(2),
        },
        cache: CacheInfo {
            connected_clients: 3,
            used_memory: 1_048_576,
            used_memory_human: "1.00M".to_string(),
            keyspace_hits: hits,
            keyspace_misses: misses,
            total_commands_processed: 400,
        },
        status: "healthy".to_string(),
    }
}

pub fn health_snapshot(status: &str) -> HealthSnapshot {
    let mut services = BTreeMap::new();
    services.insert("vector_db".to_string(), "healthy".to_string());
    services.insert("cache".to_string(), status.to_string());
    HealthSnapshot {
        status: status.to_string(),
        timestamp: "2024-05-01T10:00:00.123456".to_string(),
        version: "1.0.0".to_string(),
        services,
    }
}

/// Controller over a fresh fake service with default search settings
pub fn test_controller() -> (Arc<FakeService>, Arc<WorkflowController>, EventBus) {
    let fake = Arc::new(FakeService::new());
    let events = EventBus::new(100);
    let controller = Arc::new(WorkflowController::new(
        fake.clone(),
        SearchSettings::default(),
        events.clone(),
    ));
    (fake, controller, events)
}
