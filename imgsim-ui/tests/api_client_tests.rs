//! ApiClient wire-contract tests against a mock HTTP server

use imgsim_common::api::{IndexRequest, Metadata, SearchRequest};
use imgsim_ui::client::{ApiClient, ClientError, SimilarityService};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&format!("{}/api/v1", server.uri())).unwrap()
}

#[tokio::test]
async fn test_search_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/search"))
        .and(body_json(json!({
            "image_data": "aGVsbG8=",
            "top_k": 10,
            "threshold": 0.0,
            "include_metadata": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query_id": "q1",
            "results": [
                {"image_id": "img42", "score": 0.95, "metadata": {"tags": ["cat"]}},
                {"image_id": "img7", "score": 0.61}
            ],
            "total_found": 2,
            "search_time_ms": 12.3,
            "cached": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .search(&SearchRequest::new("aGVsbG8=".into(), 10, 0.0, true))
        .await
        .unwrap();

    assert_eq!(response.query_id, "q1");
    assert_eq!(response.results.len(), 2);
    assert_eq!(response.results[0].image_id, "img42");
    assert!(response.results[0].metadata.is_some());
    assert!(response.results[1].metadata.is_none());
    assert_eq!(response.total_found, 2);
    assert!(!response.cached);
}

#[tokio::test]
async fn test_index_omits_absent_image_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/index"))
        .and(body_json(json!({
            "image_data": "AQID",
            "metadata": {}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "image_id": "generated-1",
            "success": true,
            "message": "Image indexed successfully",
            "processing_time_ms": 88.1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .index(&IndexRequest {
            image_data: "AQID".into(),
            image_id: None,
            metadata: Metadata::new(),
        })
        .await
        .unwrap();

    assert_eq!(response.image_id, "generated-1");
    assert!(response.success);
}

#[tokio::test]
async fn test_unsuccessful_index_is_not_a_client_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/index"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "image_id": "x",
            "success": false,
            "message": "duplicate",
            "processing_time_ms": 1.0
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .index(&IndexRequest {
            image_data: "AQID".into(),
            image_id: Some("x".into()),
            metadata: Metadata::new(),
        })
        .await
        .unwrap();
    assert!(!response.success);
}

#[tokio::test]
async fn test_delete_success_on_any_2xx() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/index/img-42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.delete_image("img-42").await.unwrap();
}

#[tokio::test]
async fn test_error_status_is_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/index/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Image not found"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.delete_image("missing").await.unwrap_err();
    match err {
        ClientError::Service { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "Image not found");
        }
        other => panic!("expected service error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_undecodable_body_is_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .search(&SearchRequest::new("AA==".into(), 5, 0.5, false))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)));
    assert!(err.is_service_side());
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Port 1 is reserved and nothing listens on it
    let client = ApiClient::new("http://127.0.0.1:1/api/v1").unwrap();
    let err = client.get_health().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn test_stats_tolerates_missing_cache_counters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": {
                "name": "image_embeddings",
                "vector_size": 512,
                "distance": "Cosine",
                "points_count": 1500,
                "segments_count": 2
            },
            "cache": {"connected_clients": 1},
            "status": "healthy"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let stats = client.get_stats().await.unwrap();
    assert_eq!(stats.collection.points_count, Some(1500));
    assert_eq!(stats.cache.keyspace_hits, 0);
    assert_eq!(stats.cache.used_memory_human, "");
}

#[tokio::test]
async fn test_health_keeps_naive_timestamp() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "timestamp": "2024-05-01T10:00:00.123456",
            "version": "1.0.0",
            "services": {"vector_db": "healthy", "cache": "unhealthy"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let health = client.get_health().await.unwrap();
    assert_eq!(health.timestamp, "2024-05-01T10:00:00.123456");
    assert_eq!(health.services.len(), 2);
    assert_eq!(health.services["cache"], "unhealthy");
}
