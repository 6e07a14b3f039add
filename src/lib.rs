//! # tilegate
//!
//! A quota-aware caching proxy for metered map-tile and geocoding providers.
//!
//! Upstream map providers meter usage with a hard daily transaction quota,
//! and for cost reasons outbound traffic is only meant to flow during a
//! configurable operating window (e.g. 06:00-00:15, crossing midnight).
//! This library admits and paces outbound requests against that ceiling and
//! time-of-day gate, while serving repeat requests from a bounded,
//! time-expiring cache so the ceiling is rarely touched at all.
//!
//! ## Features
//!
//! - **Hard daily quota**: once the counter reaches the ceiling, queued
//!   requests are rejected rather than sent; the counter resets 24h after
//!   the previous reset
//! - **Operating window**: no upstream call ever happens outside the
//!   configured local-time window, which may cross midnight
//! - **Pacing**: requests are spread evenly across the window so the quota
//!   lasts the whole day
//! - **Read-through cache**: bounded LRU store with per-kind TTLs (long for
//!   base imagery, short for traffic overlays)
//! - **Host rotation**: outbound load spread round-robin over equivalent
//!   provider hosts
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`throttle`] - Quota, operating-window, and pacing admission control
//! - [`cache`] - Bounded TTL-aware payload store
//! - [`upstream`] - HTTP client seam and round-robin host pool
//! - [`fetch`] - Read-through tile and geocoding services
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tilegate::cache::{CacheTtls, TileCacheStore};
//! use tilegate::fetch::{TileFetchService, TileLayer, TileRequest};
//! use tilegate::throttle::{BusinessHoursWindow, Throttler};
//! use tilegate::upstream::{HttpUpstreamClient, TileServerPool};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Arc::new(HttpUpstreamClient::new().unwrap());
//!     let pool = TileServerPool::new(vec!["maps1.example.com".to_string()]);
//!     let window = BusinessHoursWindow::new(6, 0, 0, 15);
//!     let throttler = Throttler::new("tiles", 50_000, window);
//!     let cache = TileCacheStore::new(10_000, CacheTtls::default());
//!
//!     let service = TileFetchService::new(client, pool, throttler, cache, "api-key");
//!
//!     let request = TileRequest::new(TileLayer::Base, "satellite.day", 12, 2200, 1343, "png");
//!     let response = service.fetch_tile(request).await.unwrap();
//!     println!("{} bytes from {}", response.payload.len(), response.source.as_str());
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod server;
pub mod throttle;
pub mod upstream;

// Re-export commonly used types
pub use cache::{CacheKind, CacheStats, CacheTtls, TileCacheStore, DEFAULT_CACHE_CAPACITY};
pub use config::Config;
pub use error::{FetchError, ThrottleError, UpstreamError};
pub use fetch::{
    FetchResponse, GeocodeService, PayloadSource, ServiceStatus, TileFetchService, TileLayer,
    TileRequest, MAX_ZOOM,
};
pub use server::{create_router, AppState, RouterConfig};
pub use throttle::{BusinessHoursWindow, ThrottleStatus, Throttler, WindowStatus};
pub use upstream::{HttpUpstreamClient, TileServerPool, UpstreamClient, UpstreamResponse};
