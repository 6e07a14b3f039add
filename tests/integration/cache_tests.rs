//! Cache TTL and eviction behavior through the tile service.

use std::sync::Arc;
use std::time::Duration;

use tilegate::cache::CacheTtls;
use tilegate::fetch::{PayloadSource, TileLayer, TileRequest};

use super::test_utils::{tile_service_with_ttls, MockUpstreamClient};

fn short_ttls() -> CacheTtls {
    CacheTtls {
        base: Duration::from_secs(3600),
        traffic: Duration::from_secs(60),
        geocode: Duration::from_secs(600),
    }
}

fn base_tile() -> TileRequest {
    TileRequest::new(TileLayer::Base, "satellite.day", 10, 5, 5, "png")
}

fn traffic_tile() -> TileRequest {
    TileRequest::new(TileLayer::Traffic, "normal.day", 10, 5, 5, "png")
}

#[tokio::test(start_paused = true)]
async fn test_traffic_expires_before_base() {
    let client = Arc::new(MockUpstreamClient::new(&b"tile"[..], "image/png"));
    let service = tile_service_with_ttls(Arc::clone(&client), 100, short_ttls());

    service.fetch_tile(base_tile()).await.unwrap();
    service.fetch_tile(traffic_tile()).await.unwrap();
    assert_eq!(client.request_count(), 2);

    // Inside the traffic TTL both layers are cache hits.
    tokio::time::advance(Duration::from_secs(59)).await;
    assert_eq!(
        service.fetch_tile(traffic_tile()).await.unwrap().source,
        PayloadSource::Cache
    );
    assert_eq!(
        service.fetch_tile(base_tile()).await.unwrap().source,
        PayloadSource::Cache
    );
    assert_eq!(client.request_count(), 2);

    // Past the traffic TTL the overlay refetches, base imagery does not.
    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(
        service.fetch_tile(traffic_tile()).await.unwrap().source,
        PayloadSource::Upstream
    );
    assert_eq!(
        service.fetch_tile(base_tile()).await.unwrap().source,
        PayloadSource::Cache
    );
    assert_eq!(client.request_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_base_expires_after_its_own_ttl() {
    let client = Arc::new(MockUpstreamClient::new(&b"tile"[..], "image/png"));
    let service = tile_service_with_ttls(Arc::clone(&client), 100, short_ttls());

    service.fetch_tile(base_tile()).await.unwrap();

    tokio::time::advance(Duration::from_secs(3601)).await;
    assert_eq!(
        service.fetch_tile(base_tile()).await.unwrap().source,
        PayloadSource::Upstream
    );
    assert_eq!(client.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_clear_expired_reports_count() {
    let client = Arc::new(MockUpstreamClient::new(&b"tile"[..], "image/png"));
    let service = tile_service_with_ttls(Arc::clone(&client), 100, short_ttls());

    service.fetch_tile(base_tile()).await.unwrap();
    service.fetch_tile(traffic_tile()).await.unwrap();

    // Nothing expired yet.
    assert_eq!(service.clear_expired().await, 0);
    assert_eq!(service.status().await.cache.entries, 2);

    // Only the traffic entry has expired.
    tokio::time::advance(Duration::from_secs(61)).await;
    assert_eq!(service.clear_expired().await, 1);
    assert_eq!(service.status().await.cache.entries, 1);
}
