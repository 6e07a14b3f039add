use thiserror::Error;

/// Errors produced by an upstream provider call.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// The provider answered with a non-success HTTP status
    #[error("upstream {host} returned HTTP {status}")]
    Status { host: String, status: u16 },

    /// Network or connection failure before a response was received
    #[error("connection error: {0}")]
    Connection(String),

    /// The provider answered with a response we could not use
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

/// Errors surfaced on a completion handle returned by the throttler.
#[derive(Debug, Clone, Error)]
pub enum ThrottleError {
    /// The daily quota is exhausted; the item (and everything queued behind
    /// it) is rejected. Recoverable only by waiting for the next daily reset.
    #[error("daily quota of {quota} upstream requests exhausted")]
    RateLimitExceeded { quota: u32 },

    /// The work function itself failed; only this item is affected
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// The item was dropped before execution (shutdown)
    #[error("request cancelled before execution")]
    Cancelled,
}

/// Errors returned by the tile and geocoding fetch services.
///
/// The first group are precondition failures: they are rejected before the
/// request touches the cache or the queue. The rest are propagated verbatim
/// from the throttler so callers can decide how to degrade.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Zoom level outside the supported range
    #[error("invalid zoom: {zoom} (valid range: 0-{max})")]
    InvalidZoom { zoom: u32, max: u32 },

    /// Tile x/y index outside the grid for the requested zoom
    #[error("tile ({x}, {y}) out of range at zoom {zoom} (max index: {max})")]
    CoordinateOutOfRange { zoom: u32, x: u32, y: u32, max: u32 },

    /// Unknown tile layer name
    #[error("unknown layer: {layer} (expected \"base\" or \"traffic\")")]
    UnknownLayer { layer: String },

    /// Geocoding query was empty or whitespace
    #[error("geocoding query must not be empty")]
    EmptyQuery,

    /// Daily quota exhausted (see [`ThrottleError::RateLimitExceeded`])
    #[error("daily quota of {quota} upstream requests exhausted")]
    RateLimitExceeded { quota: u32 },

    /// The upstream call for this request failed
    #[error("upstream error: {0}")]
    Upstream(UpstreamError),

    /// The request was dropped before execution (shutdown)
    #[error("request cancelled before execution")]
    Cancelled,
}

impl From<ThrottleError> for FetchError {
    fn from(err: ThrottleError) -> Self {
        match err {
            ThrottleError::RateLimitExceeded { quota } => FetchError::RateLimitExceeded { quota },
            ThrottleError::Upstream(e) => FetchError::Upstream(e),
            ThrottleError::Cancelled => FetchError::Cancelled,
        }
    }
}
