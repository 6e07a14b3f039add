//! tilegate - A quota-aware caching proxy for metered map providers.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tilegate::{
    cache::TileCacheStore,
    config::Config,
    fetch::{GeocodeService, TileFetchService},
    server::{create_router, RouterConfig},
    throttle::Throttler,
    upstream::{HttpUpstreamClient, TileServerPool},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    // validate() guarantees the window parses.
    let window = match config.window() {
        Ok(window) => window,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let ttls = config.ttls();

    info!("Configuration:");
    info!("  Tile hosts: {}", config.tile_hosts.join(", "));
    info!("  Geocoding host: {}", config.geocode_host);
    info!(
        "  Quotas: {} tiles/day, {} geocodes/day",
        config.tile_quota, config.geocode_quota
    );
    info!(
        "  Operating window: {} ({}h/day)",
        window.formatted(),
        window.operating_hours()
    );
    info!(
        "  Cache: {} entries/service, TTLs {}s base / {}s traffic / {}s geocode",
        config.cache_entries, config.ttl_base, config.ttl_traffic, config.ttl_geocode
    );

    // Create the shared upstream HTTP client
    let client = match HttpUpstreamClient::new() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create upstream HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Each upstream service gets its own throttler and cache; they never
    // share queues or counters.
    let tiles = TileFetchService::new(
        Arc::clone(&client),
        TileServerPool::new(config.tile_hosts.clone()),
        Throttler::new("tiles", config.tile_quota, window),
        TileCacheStore::new(config.cache_entries, ttls),
        config.api_key.clone(),
    );

    let geocode = GeocodeService::new(
        client,
        config.geocode_host.clone(),
        Throttler::new("geocode", config.geocode_quota, window),
        TileCacheStore::new(config.cache_entries, ttls),
        config.api_key.clone(),
    );

    // Build the router
    let router_config = build_router_config(&config);
    let router = create_router(tiles, geocode, router_config);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/status", addr);
    info!("    curl http://{}/tiles/base/satellite.day/12/2200/1343.png", addr);
    info!("    curl http://{}/geocode?q=Berlin", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tilegate=debug,tower_http=debug"
    } else {
        "tilegate=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new().with_cache_max_age(config.cache_max_age);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}
