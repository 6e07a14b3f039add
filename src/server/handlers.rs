//! HTTP request handlers for the tilegate API.
//!
//! This module contains the Axum handlers for serving tiles, geocoding
//! results, status, and cache administration.
//!
//! # Endpoints
//!
//! - `GET /tiles/{layer}/{style}/{zoom}/{x}/{y}.{format}` - Serve a tile
//! - `GET /geocode?q={query}` - Geocode a free-text query
//! - `GET /status` - Quota, queue, window, and cache state
//! - `POST /cache/clear` - Evict expired cache entries
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::FetchError;
use crate::fetch::{
    FetchResponse, GeocodeService, ServiceStatus, TileFetchService, TileLayer, TileRequest,
};
use crate::upstream::UpstreamClient;

/// Response header reporting whether a payload came from cache or upstream.
const SOURCE_HEADER: &str = "X-Tilegate-Source";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing both fetch services.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<C: UpstreamClient> {
    /// The tile fetch service
    pub tiles: Arc<TileFetchService<C>>,

    /// The geocoding service
    pub geocode: Arc<GeocodeService<C>>,

    /// Cache-Control max-age in seconds for served payloads
    pub cache_max_age: u32,
}

impl<C: UpstreamClient> AppState<C> {
    /// Create a new application state with the given services.
    pub fn new(tiles: TileFetchService<C>, geocode: GeocodeService<C>, cache_max_age: u32) -> Self {
        Self {
            tiles: Arc::new(tiles),
            geocode: Arc::new(geocode),
            cache_max_age,
        }
    }
}

impl<C: UpstreamClient> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            tiles: Arc::clone(&self.tiles),
            geocode: Arc::clone(&self.geocode),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for tile requests.
///
/// Extracted from: `/tiles/{layer}/{style}/{zoom}/{x}/{filename}`
/// where filename is `{y}.{format}` or bare `{y}`.
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    /// Tile layer name ("base" or "traffic")
    pub layer: String,

    /// Map style identifier (e.g. "satellite.day")
    pub style: String,

    /// Zoom level
    pub zoom: u32,

    /// Tile X coordinate (0-indexed from the west)
    pub x: u32,

    /// Tile Y coordinate with optional format extension (e.g. "1343.png")
    pub filename: String,
}

impl TilePathParams {
    /// Parse the Y coordinate and image format from the filename.
    ///
    /// The format defaults to "png" when the filename carries no extension.
    pub fn y_and_format(&self) -> Result<(u32, String), std::num::ParseIntError> {
        match self.filename.split_once('.') {
            Some((y, format)) if !format.is_empty() => Ok((y.parse()?, format.to_string())),
            Some((y, _)) => Ok((y.parse()?, "png".to_string())),
            None => Ok((self.filename.parse()?, "png".to_string())),
        }
    }
}

/// Query parameters for geocoding requests.
#[derive(Debug, Deserialize)]
pub struct GeocodeQueryParams {
    /// Free-text query to geocode
    #[serde(default)]
    pub q: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g. "invalid_zoom", "rate_limit_exceeded")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Response from the status endpoint.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Tile service throttle and cache state
    pub tiles: ServiceStatus,

    /// Geocoding service throttle and cache state
    pub geocode: ServiceStatus,
}

/// Response from the cache-clear endpoint.
#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    /// Expired tile entries evicted
    pub tiles_cleared: usize,

    /// Expired geocoding entries evicted
    pub geocode_cleared: usize,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert FetchError to HTTP response.
///
/// This implementation logs errors appropriately based on their severity:
/// - 4xx errors are logged at WARN level (client errors)
/// - 5xx errors are logged at ERROR level (server/upstream errors)
impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            // 400 Bad Request - precondition failures
            FetchError::InvalidZoom { .. } => (StatusCode::BAD_REQUEST, "invalid_zoom"),
            FetchError::CoordinateOutOfRange { .. } => {
                (StatusCode::BAD_REQUEST, "tile_out_of_range")
            }
            FetchError::UnknownLayer { .. } => (StatusCode::BAD_REQUEST, "unknown_layer"),
            FetchError::EmptyQuery => (StatusCode::BAD_REQUEST, "empty_query"),

            // 429 Too Many Requests - daily quota exhausted
            FetchError::RateLimitExceeded { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded")
            }

            // 502 Bad Gateway - the upstream call failed
            FetchError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),

            // 503 Service Unavailable - dropped during shutdown
            FetchError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "cancelled"),
        };

        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Upstream error: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle tile requests.
///
/// # Endpoint
///
/// `GET /tiles/{layer}/{style}/{zoom}/{x}/{y}.{format}`
///
/// # Response
///
/// - `200 OK`: tile payload with the provider's content type
/// - `400 Bad Request`: unknown layer, invalid zoom, or tile out of range
/// - `429 Too Many Requests`: daily tile quota exhausted
/// - `502 Bad Gateway`: the upstream fetch failed
///
/// # Headers
///
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Tilegate-Source: cache|upstream`
pub async fn tile_handler<C: UpstreamClient + 'static>(
    State(state): State<AppState<C>>,
    Path(params): Path<TilePathParams>,
) -> Result<Response, FetchError> {
    let layer: TileLayer = params.layer.parse()?;

    // Parse Y coordinate and format from the filename ("1343.png" or "1343").
    let (y, format) = params
        .y_and_format()
        .map_err(|_| FetchError::CoordinateOutOfRange {
            zoom: params.zoom,
            x: params.x,
            y: 0,
            max: 0,
        })?;

    let request = TileRequest::new(layer, params.style.clone(), params.zoom, params.x, y, format);
    let response = state.tiles.fetch_tile(request).await?;

    Ok(payload_response(response, state.cache_max_age))
}

/// Handle geocoding requests.
///
/// # Endpoint
///
/// `GET /geocode?q={query}`
///
/// # Response
///
/// - `200 OK`: provider geocoding payload (JSON)
/// - `400 Bad Request`: missing or empty query
/// - `429 Too Many Requests`: daily geocoding quota exhausted
/// - `502 Bad Gateway`: the upstream fetch failed
pub async fn geocode_handler<C: UpstreamClient + 'static>(
    State(state): State<AppState<C>>,
    Query(query): Query<GeocodeQueryParams>,
) -> Result<Response, FetchError> {
    let q = query.q.unwrap_or_default();
    let response = state.geocode.geocode(&q).await?;

    Ok(payload_response(response, state.cache_max_age))
}

/// Build the HTTP response for a served payload.
fn payload_response(response: FetchResponse, cache_max_age: u32) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, response.content_type)
        .header(
            header::CACHE_CONTROL,
            format!("public, max-age={}", cache_max_age),
        )
        .header(SOURCE_HEADER, response.source.as_str())
        .body(axum::body::Body::from(response.payload))
        .unwrap()
}

/// Handle status requests.
///
/// # Endpoint
///
/// `GET /status`
///
/// # Response
///
/// `200 OK` with JSON body reporting, per service: the daily counter, quota,
/// remaining budget, queue length, worker state, operating-window view, and
/// cache statistics. Always reflects true queue/quota state so operators can
/// distinguish "waiting for the window" from "quota exhausted" from "healthy".
pub async fn status_handler<C: UpstreamClient + 'static>(
    State(state): State<AppState<C>>,
) -> Json<StatusResponse> {
    Json(StatusResponse {
        tiles: state.tiles.status().await,
        geocode: state.geocode.status().await,
    })
}

/// Handle cache-clear requests.
///
/// # Endpoint
///
/// `POST /cache/clear`
///
/// # Response
///
/// `200 OK` with JSON body reporting how many expired entries were evicted
/// from each service's cache.
pub async fn clear_cache_handler<C: UpstreamClient + 'static>(
    State(state): State<AppState<C>>,
) -> Json<ClearCacheResponse> {
    let tiles_cleared = state.tiles.clear_expired().await;
    let geocode_cleared = state.geocode.clear_expired().await;

    info!(tiles_cleared, geocode_cleared, "expired cache entries evicted");

    Json(ClearCacheResponse {
        tiles_cleared,
        geocode_cleared,
    })
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
