//! Geocoding fetch orchestration.
//!
//! Same cache-first shape as the tile service, against the provider's
//! geocoding endpoint. Geocoding has its own daily quota and operating
//! window, so it gets its own throttler instance; it never shares queues or
//! counters with tile imagery.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheKind, TileCacheStore};
use crate::error::FetchError;
use crate::throttle::Throttler;
use crate::upstream::{UpstreamClient, UpstreamResponse};

use super::{FetchResponse, PayloadSource, ServiceStatus};

/// Upstream geocoding API version segment.
const GEOCODE_API_VERSION: &str = "6.2";

/// Cache-first geocoding lookups, gated by the geocoding throttler.
///
/// # Type Parameters
///
/// * `C` - The upstream client type
pub struct GeocodeService<C: UpstreamClient> {
    client: Arc<C>,
    host: String,
    throttler: Throttler<UpstreamResponse>,
    cache: TileCacheStore,
    api_key: String,
}

impl<C: UpstreamClient + 'static> GeocodeService<C> {
    pub fn new(
        client: Arc<C>,
        host: impl Into<String>,
        throttler: Throttler<UpstreamResponse>,
        cache: TileCacheStore,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            host: host.into(),
            throttler,
            cache,
            api_key: api_key.into(),
        }
    }

    /// Geocode a free-text query, consulting the cache first.
    ///
    /// Queries are trimmed and cached case-insensitively, so "Berlin" and
    /// "berlin " share an entry.
    ///
    /// # Errors
    ///
    /// - [`FetchError::EmptyQuery`] - rejected before the cache or queue is
    ///   touched
    /// - [`FetchError::RateLimitExceeded`] - daily geocoding quota exhausted
    /// - [`FetchError::Upstream`] - the upstream call failed
    pub async fn geocode(&self, query: &str) -> Result<FetchResponse, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FetchError::EmptyQuery);
        }

        let key = cache_key(query);
        if let Some(hit) = self.cache.get(&key).await {
            debug!(key = %key, "geocode result served from cache");
            return Ok(FetchResponse {
                payload: hit.payload,
                content_type: hit.content_type,
                source: PayloadSource::Cache,
            });
        }

        let client = Arc::clone(&self.client);
        let url = format!(
            "https://{}/{}/geocode.json?searchtext={}&apiKey={}",
            self.host,
            GEOCODE_API_VERSION,
            urlencoding::encode(query),
            self.api_key
        );
        let context = format!("geocode \"{}\"", query);

        let response = self
            .throttler
            .submit(move || async move { client.get(&url).await }, context)
            .await?;

        self.cache
            .put(
                key,
                response.body.clone(),
                response.content_type.clone(),
                CacheKind::Geocode,
            )
            .await;

        Ok(FetchResponse {
            payload: response.body,
            content_type: response.content_type,
            source: PayloadSource::Upstream,
        })
    }

    /// Snapshot of this service's throttle and cache state.
    pub async fn status(&self) -> ServiceStatus {
        ServiceStatus {
            throttle: self.throttler.status().await,
            cache: self.cache.stats().await,
        }
    }

    /// Evict expired cache entries, returning how many were cleared.
    pub async fn clear_expired(&self) -> usize {
        self.cache.purge_expired().await
    }
}

/// Deterministic cache key for a geocoding query.
fn cache_key(query: &str) -> String {
    format!("geocode/{}", query.to_lowercase())
}

// =============================================================================
// Tests
// =============================================================================
