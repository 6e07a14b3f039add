//! Configuration management for tilegate.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `TILEGATE_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Environment Variables
//!
//! All configuration options can be set via environment variables with the
//! `TILEGATE_` prefix:
//!
//! - `TILEGATE_HOST` - Server bind address (default: 0.0.0.0)
//! - `TILEGATE_PORT` - Server port (default: 3100)
//! - `TILEGATE_TILE_HOSTS` - Comma-separated upstream tile hosts (required)
//! - `TILEGATE_GEOCODE_HOST` - Upstream geocoding host (required)
//! - `TILEGATE_API_KEY` - Provider credential (required)
//! - `TILEGATE_TILE_QUOTA` - Daily tile request ceiling (default: 50000)
//! - `TILEGATE_GEOCODE_QUOTA` - Daily geocoding ceiling (default: 10000)
//! - `TILEGATE_WINDOW_START` / `TILEGATE_WINDOW_END` - Operating window,
//!   "HH:MM" local time; the end may cross midnight (default: 06:00-00:15)
//! - `TILEGATE_CACHE_ENTRIES` - Max cached payloads per service (default: 10000)
//! - `TILEGATE_TTL_BASE` / `TILEGATE_TTL_TRAFFIC` / `TILEGATE_TTL_GEOCODE` -
//!   Cache TTLs in seconds

use std::time::Duration;

use clap::Parser;

use crate::cache::{
    CacheTtls, DEFAULT_BASE_TTL_SECS, DEFAULT_CACHE_CAPACITY, DEFAULT_GEOCODE_TTL_SECS,
    DEFAULT_TRAFFIC_TTL_SECS,
};
use crate::throttle::BusinessHoursWindow;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3100;

/// Default daily quota for tile requests.
pub const DEFAULT_TILE_QUOTA: u32 = 50_000;

/// Default daily quota for geocoding requests.
pub const DEFAULT_GEOCODE_QUOTA: u32 = 10_000;

/// Default operating window start, local time.
pub const DEFAULT_WINDOW_START: &str = "06:00";

/// Default operating window end, local time (crosses midnight).
pub const DEFAULT_WINDOW_END: &str = "00:15";

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// CLI Arguments
// =============================================================================

/// tilegate - A quota-aware caching proxy for metered map providers.
///
/// Fronts rate-limited tile and geocoding providers with a hard daily quota,
/// a configurable operating window, request pacing, and a bounded TTL cache.
#[derive(Parser, Debug, Clone)]
#[command(name = "tilegate")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TILEGATE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TILEGATE_PORT")]
    pub port: u16,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// Upstream tile hosts, comma-separated, rotated round-robin.
    #[arg(long, env = "TILEGATE_TILE_HOSTS", value_delimiter = ',')]
    pub tile_hosts: Vec<String>,

    /// Upstream geocoding host.
    #[arg(long, env = "TILEGATE_GEOCODE_HOST")]
    pub geocode_host: String,

    /// Provider API key, appended to every upstream request.
    #[arg(long, env = "TILEGATE_API_KEY")]
    pub api_key: String,

    // =========================================================================
    // Quota and Window Configuration
    // =========================================================================
    /// Daily ceiling on upstream tile requests.
    #[arg(long, default_value_t = DEFAULT_TILE_QUOTA, env = "TILEGATE_TILE_QUOTA")]
    pub tile_quota: u32,

    /// Daily ceiling on upstream geocoding requests.
    #[arg(long, default_value_t = DEFAULT_GEOCODE_QUOTA, env = "TILEGATE_GEOCODE_QUOTA")]
    pub geocode_quota: u32,

    /// Operating window start, "HH:MM" local time.
    #[arg(long, default_value = DEFAULT_WINDOW_START, env = "TILEGATE_WINDOW_START")]
    pub window_start: String,

    /// Operating window end, "HH:MM" local time. May be numerically before
    /// the start to denote a window crossing midnight.
    #[arg(long, default_value = DEFAULT_WINDOW_END, env = "TILEGATE_WINDOW_END")]
    pub window_end: String,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Maximum number of cached payloads per service.
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY, env = "TILEGATE_CACHE_ENTRIES")]
    pub cache_entries: usize,

    /// TTL for cached base imagery, in seconds.
    #[arg(long, default_value_t = DEFAULT_BASE_TTL_SECS, env = "TILEGATE_TTL_BASE")]
    pub ttl_base: u64,

    /// TTL for cached traffic overlays, in seconds.
    #[arg(long, default_value_t = DEFAULT_TRAFFIC_TTL_SECS, env = "TILEGATE_TTL_TRAFFIC")]
    pub ttl_traffic: u64,

    /// TTL for cached geocoding results, in seconds.
    #[arg(long, default_value_t = DEFAULT_GEOCODE_TTL_SECS, env = "TILEGATE_TTL_GEOCODE")]
    pub ttl_geocode: u64,

    /// HTTP Cache-Control max-age in seconds for served tiles.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "TILEGATE_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "TILEGATE_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err("API key is required. Set --api-key or TILEGATE_API_KEY".to_string());
        }

        if self.tile_hosts.is_empty() || self.tile_hosts.iter().any(|h| h.is_empty()) {
            return Err(
                "At least one tile host is required. Set --tile-hosts or TILEGATE_TILE_HOSTS"
                    .to_string(),
            );
        }

        if self.geocode_host.is_empty() {
            return Err(
                "Geocoding host is required. Set --geocode-host or TILEGATE_GEOCODE_HOST"
                    .to_string(),
            );
        }

        if self.tile_quota == 0 {
            return Err("tile_quota must be greater than 0".to_string());
        }
        if self.geocode_quota == 0 {
            return Err("geocode_quota must be greater than 0".to_string());
        }
        if self.cache_entries == 0 {
            return Err("cache_entries must be greater than 0".to_string());
        }

        let window = self.window()?;
        if window.operating_hours() <= 0.0 {
            return Err("operating window must have a non-zero length".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the operating window from the configured start/end times.
    pub fn window(&self) -> Result<BusinessHoursWindow, String> {
        let (start_hour, start_minute) = parse_time_of_day(&self.window_start)
            .map_err(|e| format!("invalid window_start: {e}"))?;
        let (end_hour, end_minute) =
            parse_time_of_day(&self.window_end).map_err(|e| format!("invalid window_end: {e}"))?;
        Ok(BusinessHoursWindow::new(
            start_hour,
            start_minute,
            end_hour,
            end_minute,
        ))
    }

    /// Build the per-kind cache TTLs.
    pub fn ttls(&self) -> CacheTtls {
        CacheTtls {
            base: Duration::from_secs(self.ttl_base),
            traffic: Duration::from_secs(self.ttl_traffic),
            geocode: Duration::from_secs(self.ttl_geocode),
        }
    }
}

/// Parse "HH:MM" into (hour, minute).
fn parse_time_of_day(s: &str) -> Result<(u8, u8), String> {
    let (hour_str, minute_str) = s
        .split_once(':')
        .ok_or_else(|| format!("expected HH:MM, got \"{s}\""))?;

    let hour: u8 = hour_str
        .parse()
        .map_err(|_| format!("invalid hour in \"{s}\""))?;
    let minute: u8 = minute_str
        .parse()
        .map_err(|_| format!("invalid minute in \"{s}\""))?;

    if hour > 23 {
        return Err(format!("hour out of range in \"{s}\""));
    }
    if minute > 59 {
        return Err(format!("minute out of range in \"{s}\""));
    }

    Ok((hour, minute))
}

// =============================================================================
// Tests
// =============================================================================
