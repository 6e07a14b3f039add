//! Test utilities for integration tests.
//!
//! This module provides a mock upstream client with request tracking and
//! helpers for assembling services with test-friendly quotas and windows.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use tilegate::cache::{CacheTtls, TileCacheStore};
use tilegate::error::UpstreamError;
use tilegate::fetch::{GeocodeService, TileFetchService};
use tilegate::throttle::{BusinessHoursWindow, Throttler};
use tilegate::upstream::{TileServerPool, UpstreamClient, UpstreamResponse};

// =============================================================================
// Mock Upstream Client with Request Tracking
// =============================================================================

/// A mock upstream client that records every requested URL.
///
/// This is useful for verifying cache behavior, host rotation, and that
/// rejected requests never reach upstream.
pub struct MockUpstreamClient {
    payload: Bytes,
    content_type: String,
    fail_status: Option<u16>,
    request_count: Arc<AtomicUsize>,
    requests: Arc<RwLock<Vec<String>>>,
}

impl MockUpstreamClient {
    /// A client that answers every request with the given payload.
    pub fn new(payload: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            content_type: content_type.into(),
            fail_status: None,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// A client that fails every request with the given HTTP status.
    pub fn failing_with_status(status: u16) -> Self {
        Self {
            payload: Bytes::new(),
            content_type: String::new(),
            fail_status: Some(status),
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl UpstreamClient for MockUpstreamClient {
    async fn get(&self, url: &str) -> Result<UpstreamResponse, UpstreamError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.write().await.push(url.to_string());

        if let Some(status) = self.fail_status {
            let host = url
                .strip_prefix("https://")
                .and_then(|rest| rest.split('/').next())
                .unwrap_or("unknown")
                .to_string();
            return Err(UpstreamError::Status { host, status });
        }

        Ok(UpstreamResponse {
            body: self.payload.clone(),
            content_type: self.content_type.clone(),
        })
    }
}

// =============================================================================
// Service Builders
// =============================================================================

/// Window that is open at any time of day.
pub fn open_window() -> BusinessHoursWindow {
    BusinessHoursWindow::new(0, 0, 23, 59)
}

pub const TEST_HOSTS: [&str; 3] = ["maps1.example.com", "maps2.example.com", "maps3.example.com"];

/// Tile service over the given mock, with an always-open window.
pub fn tile_service(
    client: Arc<MockUpstreamClient>,
    quota: u32,
) -> TileFetchService<MockUpstreamClient> {
    tile_service_with_ttls(client, quota, CacheTtls::default())
}

/// Tile service with explicit cache TTLs.
pub fn tile_service_with_ttls(
    client: Arc<MockUpstreamClient>,
    quota: u32,
    ttls: CacheTtls,
) -> TileFetchService<MockUpstreamClient> {
    let hosts = TEST_HOSTS.iter().map(|h| h.to_string()).collect();
    TileFetchService::new(
        client,
        TileServerPool::new(hosts),
        Throttler::new("tiles", quota, open_window()),
        TileCacheStore::new(100, ttls),
        "test-key",
    )
}

/// Geocoding service over the given mock, with an always-open window.
pub fn geocode_service(
    client: Arc<MockUpstreamClient>,
    quota: u32,
) -> GeocodeService<MockUpstreamClient> {
    GeocodeService::new(
        client,
        "geocoder.example.com",
        Throttler::new("geocode", quota, open_window()),
        TileCacheStore::new(100, CacheTtls::default()),
        "test-key",
    )
}
