//! Read-through fetch services for tiles and geocoding.
//!
//! Each service owns its own cache and its own [`Throttler`](crate::throttle::Throttler)
//! instance, so tile imagery and geocoding never share queues or counters.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │               TileFetchService / GeocodeService         │
//! │  1. Validate params      4. Throttled upstream fetch    │
//! │  2. Probe cache          5. Populate cache              │
//! │  3. On hit, return       6. Return with source marker   │
//! └──────────┬──────────────────┬──────────────────┬────────┘
//! │          ▼                  ▼                  ▼        │
//! │   ┌──────────────┐   ┌────────────┐   ┌──────────────┐  │
//! │   │TileCacheStore│   │ Throttler  │   │TileServerPool│  │
//! │   └──────────────┘   └────────────┘   └──────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileFetchService`]: cache-first tile fetches against the rotated host pool
//! - [`GeocodeService`]: the geocoding equivalent, with its own quota
//! - [`FetchResponse`]: payload, content type, and whether it came from cache

mod geocode;
mod tiles;

use bytes::Bytes;
use serde::Serialize;

use crate::cache::CacheStats;
use crate::throttle::ThrottleStatus;

pub use geocode::GeocodeService;
pub use tiles::{TileFetchService, TileLayer, TileRequest, MAX_ZOOM};

/// Where a served payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadSource {
    /// Served from the local cache; no upstream call happened
    Cache,

    /// Fetched from the upstream provider (and now cached)
    Upstream,
}

impl PayloadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadSource::Cache => "cache",
            PayloadSource::Upstream => "upstream",
        }
    }
}

/// Response from a fetch service.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The raw payload (image bytes or geocoding JSON)
    pub payload: Bytes,

    /// Content type reported by the provider (or stored with the entry)
    pub content_type: String,

    /// Whether this response was served from cache or upstream
    pub source: PayloadSource,
}

/// Combined throttle and cache view of one service, for status display.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub throttle: ThrottleStatus,
    pub cache: CacheStats,
}
