//! Tile fetch orchestration.
//!
//! The tile service is the main entry point for tile requests. It validates
//! coordinates, probes the cache, and on a miss submits a throttled fetch
//! against the next host in the rotation. Base imagery and traffic overlays
//! use different upstream endpoints and different cache TTLs.

use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheKind, TileCacheStore};
use crate::error::FetchError;
use crate::throttle::Throttler;
use crate::upstream::{TileServerPool, UpstreamClient, UpstreamResponse};

use super::{FetchResponse, PayloadSource, ServiceStatus};

/// Highest supported zoom level.
pub const MAX_ZOOM: u32 = 22;

/// Upstream map-tile API version segment.
const TILE_API_VERSION: &str = "2.1";

// =============================================================================
// Request Types
// =============================================================================

/// Which tile layer a request targets.
///
/// The layer selects both the upstream endpoint and the cache TTL: base
/// imagery is static and cached long, traffic overlays are volatile and
/// cached briefly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileLayer {
    /// Static base map imagery
    Base,

    /// Live traffic overlay
    Traffic,
}

impl TileLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            TileLayer::Base => "base",
            TileLayer::Traffic => "traffic",
        }
    }

    /// Upstream path segment for this layer's endpoint.
    fn path_segment(&self) -> &'static str {
        match self {
            TileLayer::Base => "maptile",
            TileLayer::Traffic => "traffictile",
        }
    }

    /// Cache kind (and thereby TTL) for payloads of this layer.
    fn cache_kind(&self) -> CacheKind {
        match self {
            TileLayer::Base => CacheKind::Base,
            TileLayer::Traffic => CacheKind::Traffic,
        }
    }
}

impl FromStr for TileLayer {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(TileLayer::Base),
            "traffic" => Ok(TileLayer::Traffic),
            other => Err(FetchError::UnknownLayer {
                layer: other.to_string(),
            }),
        }
    }
}

/// A request for a single tile.
#[derive(Debug, Clone)]
pub struct TileRequest {
    /// Tile layer (base imagery or traffic overlay)
    pub layer: TileLayer,

    /// Map style identifier (e.g. "satellite.day")
    pub style: String,

    /// Zoom level (0 = whole world)
    pub zoom: u32,

    /// Tile column, 0-indexed from the west
    pub x: u32,

    /// Tile row, 0-indexed from the north
    pub y: u32,

    /// Image format (e.g. "png", "jpg")
    pub format: String,
}

impl TileRequest {
    pub fn new(
        layer: TileLayer,
        style: impl Into<String>,
        zoom: u32,
        x: u32,
        y: u32,
        format: impl Into<String>,
    ) -> Self {
        Self {
            layer,
            style: style.into(),
            zoom,
            x,
            y,
            format: format.into(),
        }
    }
}

// =============================================================================
// Validation and Keys
// =============================================================================

/// Check coordinate preconditions before a request touches cache or queue.
fn validate(request: &TileRequest) -> Result<(), FetchError> {
    if request.zoom > MAX_ZOOM {
        return Err(FetchError::InvalidZoom {
            zoom: request.zoom,
            max: MAX_ZOOM,
        });
    }

    let max_index = (1u32 << request.zoom) - 1;
    if request.x > max_index || request.y > max_index {
        return Err(FetchError::CoordinateOutOfRange {
            zoom: request.zoom,
            x: request.x,
            y: request.y,
            max: max_index,
        });
    }

    Ok(())
}

/// Deterministic cache key: identical logical requests map to the same key.
fn cache_key(request: &TileRequest) -> String {
    format!(
        "tile/{}/{}/{}/{}/{}.{}",
        request.layer.as_str(),
        request.style,
        request.zoom,
        request.x,
        request.y,
        request.format
    )
}

/// Upstream path for the request, without host or credential.
fn tile_path(request: &TileRequest) -> String {
    format!(
        "/maptile/{}/{}/newest/{}/{}/{}/{}/256/{}",
        TILE_API_VERSION,
        request.layer.path_segment(),
        request.style,
        request.zoom,
        request.x,
        request.y,
        request.format
    )
}

// =============================================================================
// Tile Fetch Service
// =============================================================================

/// Cache-first tile fetches, gated by the shared tile throttler.
///
/// # Type Parameters
///
/// * `C` - The upstream client type (reqwest-backed in production, a mock in
///   tests)
///
/// # Example
///
/// ```ignore
/// use tilegate::fetch::{TileFetchService, TileLayer, TileRequest};
///
/// let service = TileFetchService::new(client, pool, throttler, cache, api_key);
///
/// let request = TileRequest::new(TileLayer::Base, "satellite.day", 12, 2200, 1343, "png");
/// let response = service.fetch_tile(request).await?;
/// println!("{} bytes from {}", response.payload.len(), response.source.as_str());
/// ```
pub struct TileFetchService<C: UpstreamClient> {
    client: Arc<C>,
    pool: Arc<TileServerPool>,
    throttler: Throttler<UpstreamResponse>,
    cache: TileCacheStore,
    api_key: String,
}

impl<C: UpstreamClient + 'static> TileFetchService<C> {
    pub fn new(
        client: Arc<C>,
        pool: TileServerPool,
        throttler: Throttler<UpstreamResponse>,
        cache: TileCacheStore,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            pool: Arc::new(pool),
            throttler,
            cache,
            api_key: api_key.into(),
        }
    }

    /// Fetch a tile, consulting the cache first.
    ///
    /// On a miss the fetch is submitted to the tile throttler, which enforces
    /// the operating window, the daily quota, and the pacing interval before
    /// any upstream call happens. Successful upstream payloads are cached
    /// under the layer's TTL before returning.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidZoom`] / [`FetchError::CoordinateOutOfRange`] -
    ///   rejected before the cache or queue is touched
    /// - [`FetchError::RateLimitExceeded`] - daily quota exhausted
    /// - [`FetchError::Upstream`] - the upstream call failed; no stale cache
    ///   fallback is attempted
    pub async fn fetch_tile(&self, request: TileRequest) -> Result<FetchResponse, FetchError> {
        validate(&request)?;

        let key = cache_key(&request);
        if let Some(hit) = self.cache.get(&key).await {
            debug!(key = %key, "tile served from cache");
            return Ok(FetchResponse {
                payload: hit.payload,
                content_type: hit.content_type,
                source: PayloadSource::Cache,
            });
        }

        let client = Arc::clone(&self.client);
        let pool = Arc::clone(&self.pool);
        let path = tile_path(&request);
        let api_key = self.api_key.clone();
        let context = format!(
            "{} {}/{}/{} ({})",
            request.layer.as_str(),
            request.zoom,
            request.x,
            request.y,
            request.style
        );

        let response = self
            .throttler
            .submit(
                move || async move {
                    // The host rotates at execution time, not enqueue time.
                    let host = pool.next();
                    let url = format!("https://{}{}?apiKey={}", host, path, api_key);
                    client.get(&url).await
                },
                context,
            )
            .await?;

        self.cache
            .put(
                key,
                response.body.clone(),
                response.content_type.clone(),
                request.layer.cache_kind(),
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

// =============================================================================
// Tests
// =============================================================================
