//! Axum-based HTTP server and routes.
//!
//! This layer is a thin consumer of the fetch services: handlers translate
//! HTTP parameters into service calls and service errors into JSON error
//! responses. All admission, pacing, and caching decisions live below it.

mod handlers;
mod routes;

pub use handlers::{
    clear_cache_handler, geocode_handler, health_handler, status_handler, tile_handler, AppState,
    ClearCacheResponse, ErrorResponse, GeocodeQueryParams, HealthResponse, StatusResponse,
    TilePathParams,
};
pub use routes::{create_router, RouterConfig};
