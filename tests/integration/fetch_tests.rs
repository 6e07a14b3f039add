//! Service-level tests for the tile and geocoding fetch paths.

use std::sync::Arc;

use tilegate::error::{FetchError, UpstreamError};
use tilegate::fetch::{PayloadSource, TileLayer, TileRequest};

use super::test_utils::{geocode_service, tile_service, MockUpstreamClient, TEST_HOSTS};

fn tile(zoom: u32, x: u32, y: u32) -> TileRequest {
    TileRequest::new(TileLayer::Base, "satellite.day", zoom, x, y, "png")
}

#[tokio::test(start_paused = true)]
async fn test_repeat_fetch_served_from_cache() {
    let client = Arc::new(MockUpstreamClient::new(&b"\x89PNG tile"[..], "image/png"));
    let service = tile_service(Arc::clone(&client), 100);

    let first = service.fetch_tile(tile(12, 2200, 1343)).await.unwrap();
    assert_eq!(first.source, PayloadSource::Upstream);
    assert_eq!(first.content_type, "image/png");

    let second = service.fetch_tile(tile(12, 2200, 1343)).await.unwrap();
    assert_eq!(second.source, PayloadSource::Cache);
    assert_eq!(second.payload, first.payload);

    // The second call never reached upstream or the counter.
    assert_eq!(client.request_count(), 1);
    assert_eq!(service.status().await.throttle.daily_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_zoom_never_touches_cache_or_queue() {
    let client = Arc::new(MockUpstreamClient::new(&b"tile"[..], "image/png"));
    let service = tile_service(Arc::clone(&client), 100);

    let result = service.fetch_tile(tile(30, 0, 0)).await;
    assert!(matches!(
        result,
        Err(FetchError::InvalidZoom { zoom: 30, max: 22 })
    ));

    assert_eq!(client.request_count(), 0);
    let status = service.status().await;
    assert_eq!(status.throttle.daily_count, 0);
    assert_eq!(status.throttle.queue_length, 0);
    assert_eq!(status.cache.entries, 0);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_coordinate_rejected() {
    let client = Arc::new(MockUpstreamClient::new(&b"tile"[..], "image/png"));
    let service = tile_service(Arc::clone(&client), 100);

    let result = service.fetch_tile(tile(1, 5, 0)).await;
    assert!(matches!(
        result,
        Err(FetchError::CoordinateOutOfRange { zoom: 1, x: 5, .. })
    ));
    assert_eq!(client.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_hosts_rotate_round_robin() {
    let client = Arc::new(MockUpstreamClient::new(&b"tile"[..], "image/png"));
    let service = tile_service(Arc::clone(&client), 100);

    // Six distinct tiles: two full cycles over the three hosts.
    for x in 0..6 {
        service.fetch_tile(tile(10, x, 0)).await.unwrap();
    }

    let requests = client.requests().await;
    assert_eq!(requests.len(), 6);
    for (i, url) in requests.iter().enumerate() {
        let expected_host = TEST_HOSTS[i % TEST_HOSTS.len()];
        assert!(
            url.starts_with(&format!("https://{expected_host}/")),
            "request {i} hit {url}, expected host {expected_host}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_tile_url_shape() {
    let client = Arc::new(MockUpstreamClient::new(&b"tile"[..], "image/png"));
    let service = tile_service(Arc::clone(&client), 100);

    service.fetch_tile(tile(12, 2200, 1343)).await.unwrap();
    service
        .fetch_tile(TileRequest::new(
            TileLayer::Traffic,
            "normal.day",
            8,
            137,
            83,
            "png",
        ))
        .await
        .unwrap();

    let requests = client.requests().await;
    assert_eq!(
        requests[0],
        "https://maps1.example.com/maptile/2.1/maptile/newest/satellite.day/12/2200/1343/256/png?apiKey=test-key"
    );
    assert_eq!(
        requests[1],
        "https://maps2.example.com/maptile/2.1/traffictile/newest/normal.day/8/137/83/256/png?apiKey=test-key"
    );
}

#[tokio::test(start_paused = true)]
async fn test_upstream_error_propagates_verbatim() {
    let client = Arc::new(MockUpstreamClient::failing_with_status(500));
    let service = tile_service(Arc::clone(&client), 100);

    let result = service.fetch_tile(tile(12, 2200, 1343)).await;
    match result {
        Err(FetchError::Upstream(UpstreamError::Status { host, status })) => {
            assert_eq!(status, 500);
            assert_eq!(host, "maps1.example.com");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }

    // Failed calls count neither against the quota nor into the cache.
    let status = service.status().await;
    assert_eq!(status.throttle.daily_count, 0);
    assert_eq!(status.cache.entries, 0);
}

#[tokio::test(start_paused = true)]
async fn test_quota_exhaustion_rejects_but_cache_still_serves() {
    let client = Arc::new(MockUpstreamClient::new(&b"tile"[..], "image/png"));
    let service = tile_service(Arc::clone(&client), 1);

    service.fetch_tile(tile(10, 0, 0)).await.unwrap();

    let rejected = service.fetch_tile(tile(10, 1, 0)).await;
    assert!(matches!(
        rejected,
        Err(FetchError::RateLimitExceeded { quota: 1 })
    ));
    assert_eq!(client.request_count(), 1);

    // Cached tiles keep being served after the quota is gone.
    let hit = service.fetch_tile(tile(10, 0, 0)).await.unwrap();
    assert_eq!(hit.source, PayloadSource::Cache);
}

#[tokio::test(start_paused = true)]
async fn test_geocode_cache_and_encoding() {
    let client = Arc::new(MockUpstreamClient::new(
        &br#"{"results":[]}"#[..],
        "application/json",
    ));
    let service = geocode_service(Arc::clone(&client), 100);

    let first = service.geocode("Berlin Mitte").await.unwrap();
    assert_eq!(first.source, PayloadSource::Upstream);
    assert_eq!(first.content_type, "application/json");

    // Same query modulo case/whitespace hits the cache.
    let second = service.geocode("  berlin mitte ").await.unwrap();
    assert_eq!(second.source, PayloadSource::Cache);
    assert_eq!(client.request_count(), 1);

    let requests = client.requests().await;
    assert_eq!(
        requests[0],
        "https://geocoder.example.com/6.2/geocode.json?searchtext=Berlin%20Mitte&apiKey=test-key"
    );
}

#[tokio::test(start_paused = true)]
async fn test_geocode_empty_query_rejected() {
    let client = Arc::new(MockUpstreamClient::new(&b"{}"[..], "application/json"));
    let service = geocode_service(Arc::clone(&client), 100);

    assert!(matches!(
        service.geocode("").await,
        Err(FetchError::EmptyQuery)
    ));
    assert!(matches!(
        service.geocode("   ").await,
        Err(FetchError::EmptyQuery)
    ));
    assert_eq!(client.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_services_have_independent_quotas() {
    let tile_client = Arc::new(MockUpstreamClient::new(&b"tile"[..], "image/png"));
    let geocode_client = Arc::new(MockUpstreamClient::new(&b"{}"[..], "application/json"));

    let tiles = tile_service(Arc::clone(&tile_client), 1);
    let geocode = geocode_service(Arc::clone(&geocode_client), 10);

    // Exhaust the tile quota.
    tiles.fetch_tile(tile(10, 0, 0)).await.unwrap();
    assert!(matches!(
        tiles.fetch_tile(tile(10, 1, 0)).await,
        Err(FetchError::RateLimitExceeded { .. })
    ));

    // Geocoding keeps its own budget.
    let result = geocode.geocode("Hamburg").await.unwrap();
    assert_eq!(result.source, PayloadSource::Upstream);
    assert_eq!(geocode.status().await.throttle.daily_count, 1);
}
