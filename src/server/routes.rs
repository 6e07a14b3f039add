//! Router configuration for tilegate.
//!
//! This module defines the HTTP routes and applies middleware for CORS and
//! request tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health                                      - Health check
//! /status                                      - Quota/queue/window/cache state
//! /tiles/{layer}/{style}/{zoom}/{x}/{y}.{fmt}  - Tile endpoint
//! /geocode?q={query}                           - Geocoding endpoint
//! /cache/clear                                 - Evict expired cache entries (POST)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tilegate::server::{create_router, RouterConfig};
//!
//! let router = create_router(tiles, geocode, RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3100").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    clear_cache_handler, geocode_handler, health_handler, status_handler, tile_handler, AppState,
};
use crate::fetch::{GeocodeService, TileFetchService};
use crate::upstream::UpstreamClient;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds for served payloads
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration with defaults:
    /// - CORS allows any origin
    /// - Cache max-age is 1 hour (3600 seconds)
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: 3600,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with the tile, geocoding,
/// status, cache-admin, and health routes, plus CORS and optional request
/// tracing.
pub fn create_router<C>(
    tiles: TileFetchService<C>,
    geocode: GeocodeService<C>,
    config: RouterConfig,
) -> Router
where
    C: UpstreamClient + 'static,
{
    let app_state = AppState::new(tiles, geocode, config.cache_max_age);

    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler::<C>))
        .route(
            "/tiles/{layer}/{style}/{zoom}/{x}/{filename}",
            get(tile_handler::<C>),
        )
        .route("/geocode", get(geocode_handler::<C>))
        .route("/cache/clear", post(clear_cache_handler::<C>))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::HEAD, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
