//! Remote similarity-search service client
//!
//! Typed binding to the service's REST contract (base path `/api/v1`).
//! Each operation is exactly one request/response round trip. There is no
//! client-side retry and no explicit timeout; the HTTP layer's defaults
//! decide when a request counts as a transport failure.
//!
//! Responses are only decoded structurally. Whether a decoded response makes
//! sense (e.g. `success: false` on index) is for the workflows to decide.

use async_trait::async_trait;
use imgsim_common::api::{
    HealthSnapshot, IndexRequest, IndexResponse, SearchRequest, SearchResponse, StatsSnapshot,
};
use reqwest::Url;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = concat!("imgsim-ui/", env!("CARGO_PKG_VERSION"));

/// Remote call errors
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// No response reached us (connect failure, reset, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status
    #[error("Service error {status}: {body}")]
    Service { status: u16, body: String },

    /// A 2xx response whose body does not decode to the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The configured base URL cannot be used
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ClientError {
    /// Short cause name for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Transport(_) => "transport",
            ClientError::Service { .. } => "service",
            ClientError::MalformedResponse(_) => "malformed_response",
            ClientError::InvalidBaseUrl(_) => "invalid_base_url",
        }
    }

    /// HTTP status reported by the service, if it answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for failures on the service side of the wire
    ///
    /// A malformed response is presented like a service error.
    pub fn is_service_side(&self) -> bool {
        matches!(self, ClientError::Service { .. } | ClientError::MalformedResponse(_))
    }
}

/// Operations offered by the remote service
///
/// [`ApiClient`] is the production implementation; tests substitute
/// scripted fakes.
#[async_trait]
pub trait SimilarityService: Send + Sync {
    /// POST /search
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ClientError>;

    /// POST /index
    async fn index(&self, request: &IndexRequest) -> Result<IndexResponse, ClientError>;

    /// DELETE /index/{image_id}; any 2xx is success
    async fn delete_image(&self, image_id: &str) -> Result<(), ClientError>;

    /// GET /stats
    async fn get_stats(&self) -> Result<StatsSnapshot, ClientError>;

    /// GET /health
    async fn get_health(&self) -> Result<HealthSnapshot, ClientError>;
}

/// HTTP client for the remote service
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8000/api/v1`)
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Base URL requests are made against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, mapping failures onto the error taxonomy
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Service {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Decode a successful response body
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl SimilarityService for ApiClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ClientError> {
        let url = self.endpoint(&["search"])?;
        debug!(url = %url, top_k = request.top_k, threshold = request.threshold, "POST search");

        let response = self.send(self.http_client.post(url).json(request)).await?;
        Self::decode(response).await
    }

    async fn index(&self, request: &IndexRequest) -> Result<IndexResponse, ClientError> {
        let url = self.endpoint(&["index"])?;
        debug!(url = %url, image_id = ?request.image_id, "POST index");

        let response = self.send(self.http_client.post(url).json(request)).await?;
        Self::decode(response).await
    }

    async fn delete_image(&self, image_id: &str) -> Result<(), ClientError> {
        let url = self.endpoint(&["index", image_id])?;
        debug!(url = %url, "DELETE index entry");

        self.send(self.http_client.delete(url)).await?;
        Ok(())
    }

    async fn get_stats(&self) -> Result<StatsSnapshot, ClientError> {
        let url = self.endpoint(&["stats"])?;
        let response = self.send(self.http_client.get(url)).await?;
        Self::decode(response).await
    }

    async fn get_health(&self) -> Result<HealthSnapshot, ClientError> {
        let url = self.endpoint(&["health"])?;
        let response = self.send(self.http_client.get(url)).await?;
        Self::decode(response).await
    }
}
