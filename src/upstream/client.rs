//! HTTP client seam for upstream providers.
//!
//! The [`UpstreamClient`] trait abstracts the outbound HTTP GET so services
//! can be exercised in tests with mock clients; [`HttpUpstreamClient`] is the
//! reqwest-backed implementation used in production.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::trace;

use crate::error::UpstreamError;

/// Request timeout for upstream calls.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Content type assumed when the provider omits the header.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A successful upstream response: the raw payload and its content type.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub body: Bytes,
    pub content_type: String,
}

/// Outbound HTTP GET against an upstream provider.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Fetch `url`, returning the payload and content type on a 2xx
    /// response and an [`UpstreamError`] otherwise.
    async fn get(&self, url: &str) -> Result<UpstreamResponse, UpstreamError>;
}

/// Production [`UpstreamClient`] backed by a shared reqwest client.
pub struct HttpUpstreamClient {
    client: reqwest::Client,
}

impl HttpUpstreamClient {
    /// Create a client with connection pooling and a 30s request timeout.
    pub fn new() -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .map_err(|e| UpstreamError::Connection(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn get(&self, url: &str) -> Result<UpstreamResponse, UpstreamError> {
        trace!(url, "upstream GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let host = response
                .url()
                .host_str()
                .unwrap_or("unknown")
                .to_string();
            return Err(UpstreamError::Status {
                host,
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Connection(e.to_string()))?;

        Ok(UpstreamResponse { body, content_type })
    }
}
