//! End-to-end throttling behavior through the tile service.

use std::sync::Arc;

use tilegate::error::FetchError;
use tilegate::fetch::{TileLayer, TileRequest};

use super::test_utils::{tile_service, MockUpstreamClient};

fn tile(x: u32) -> TileRequest {
    TileRequest::new(TileLayer::Base, "satellite.day", 10, x, 0, "png")
}

#[tokio::test(start_paused = true)]
async fn test_queued_fetches_execute_in_submission_order() {
    let client = Arc::new(MockUpstreamClient::new(&b"tile"[..], "image/png"));
    let service = Arc::new(tile_service(Arc::clone(&client), 100));

    let mut handles = Vec::new();
    for x in 0..5 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(
            async move { service.fetch_tile(tile(x)).await },
        ));
        // Yield so each fetch lands in the queue before the next.
        tokio::task::yield_now().await;
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let requests = client.requests().await;
    assert_eq!(requests.len(), 5);
    for (i, url) in requests.iter().enumerate() {
        assert!(
            url.contains(&format!("/10/{i}/0/")),
            "request {i} out of order: {url}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_fetches_beyond_quota() {
    let client = Arc::new(MockUpstreamClient::new(&b"tile"[..], "image/png"));
    let service = Arc::new(tile_service(Arc::clone(&client), 3));

    let mut handles = Vec::new();
    for x in 0..6 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(
            async move { service.fetch_tile(tile(x)).await },
        ));
        tokio::task::yield_now().await;
    }

    let mut ok = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(FetchError::RateLimitExceeded { quota: 3 }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    // The ceiling is hard: exactly quota calls went upstream.
    assert_eq!(ok, 3);
    assert_eq!(rejected, 3);
    assert_eq!(client.request_count(), 3);
    assert_eq!(service.status().await.throttle.daily_count, 3);
}

#[tokio::test(start_paused = true)]
async fn test_status_reflects_progress() {
    let client = Arc::new(MockUpstreamClient::new(&b"tile"[..], "image/png"));
    let service = tile_service(Arc::clone(&client), 100);

    let before = service.status().await;
    assert_eq!(before.throttle.daily_count, 0);
    assert_eq!(before.throttle.remaining, 100);
    assert!(!before.throttle.is_processing);
    assert!(before.throttle.window.currently_open);

    service.fetch_tile(tile(0)).await.unwrap();
    service.fetch_tile(tile(1)).await.unwrap();

    let after = service.status().await;
    assert_eq!(after.throttle.daily_count, 2);
    assert_eq!(after.throttle.remaining, 98);
    assert_eq!(after.throttle.queue_length, 0);
    assert_eq!(after.cache.entries, 2);
}
