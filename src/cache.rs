//! Bounded, TTL-aware payload cache.
//!
//! This module provides the read-through cache consulted before every
//! upstream fetch, so repeat requests rarely touch the daily quota at all.
//!
//! # Cache Key
//!
//! Keys are deterministic composites of the logical request parameters
//! (layer, style, zoom, x, y, format for tiles; the normalized query text
//! for geocoding), built by the fetch services. Identical logical requests
//! always map to the same key.
//!
//! # Expiry and Eviction
//!
//! Every entry carries a [`CacheKind`] with its own time-to-live: short for
//! volatile data (live traffic overlays), long for static base imagery.
//! Expired entries are removed opportunistically when a lookup touches them.
//!
//! The store holds at most `capacity` entries; inserting beyond capacity
//! evicts the least-recently-used entry.

use std::num::NonZeroUsize;

use bytes::Bytes;
use lru::LruCache;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Default maximum number of cached entries.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Default TTL for static base imagery (24 hours).
pub const DEFAULT_BASE_TTL_SECS: u64 = 24 * 60 * 60;

/// Default TTL for live traffic overlays (5 minutes).
pub const DEFAULT_TRAFFIC_TTL_SECS: u64 = 5 * 60;

/// Default TTL for geocoding results (1 hour).
pub const DEFAULT_GEOCODE_TTL_SECS: u64 = 60 * 60;

// =============================================================================
// Kinds and TTLs
// =============================================================================

/// What kind of payload an entry holds, selecting its TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    /// Static base map imagery
    Base,

    /// Live traffic overlay imagery
    Traffic,

    /// Geocoding results
    Geocode,
}

/// Per-kind time-to-live configuration.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub base: Duration,
    pub traffic: Duration,
    pub geocode: Duration,
}

impl CacheTtls {
    fn for_kind(&self, kind: CacheKind) -> Duration {
        match kind {
            CacheKind::Base => self.base,
            CacheKind::Traffic => self.traffic,
            CacheKind::Geocode => self.geocode,
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(DEFAULT_BASE_TTL_SECS),
            traffic: Duration::from_secs(DEFAULT_TRAFFIC_TTL_SECS),
            geocode: Duration::from_secs(DEFAULT_GEOCODE_TTL_SECS),
        }
    }
}

// =============================================================================
// Entries
// =============================================================================

struct CacheEntry {
    payload: Bytes,
    content_type: String,
    kind: CacheKind,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttls: &CacheTtls) -> bool {
        self.inserted_at.elapsed() >= ttls.for_kind(self.kind)
    }
}

/// A cache hit: the stored payload and its content type.
#[derive(Debug, Clone)]
pub struct CachedPayload {
    pub payload: Bytes,
    pub content_type: String,
}

/// Cache statistics for status display.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Entries currently stored (including any not yet noticed as expired)
    pub entries: usize,

    /// Maximum number of entries
    pub capacity: usize,
}

// =============================================================================
// Store
// =============================================================================

/// Bounded LRU store of upstream payloads with per-kind expiry.
///
/// # Thread Safety
///
/// The store is thread-safe and can be shared across async tasks via `Arc`.
///
/// # Example
///
/// ```
/// use tilegate::cache::{CacheKind, CacheTtls, TileCacheStore};
/// use bytes::Bytes;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = TileCacheStore::new(1_000, CacheTtls::default());
///
///     let key = "tile/base/satellite.day/12/2200/1343.png";
///     cache
///         .put(key.to_string(), Bytes::from_static(b"\x89PNG"), "image/png", CacheKind::Base)
///         .await;
///
///     let hit = cache.get(key).await.unwrap();
///     assert_eq!(hit.content_type, "image/png");
/// }
/// ```
pub struct TileCacheStore {
    entries: RwLock<LruCache<String, CacheEntry>>,
    ttls: CacheTtls,
    capacity: usize,
}

impl TileCacheStore {
    /// Create a store holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; [`crate::config::Config::validate`]
    /// rejects a zero capacity before services are constructed.
    pub fn new(capacity: usize, ttls: CacheTtls) -> Self {
        let capacity_nz = NonZeroUsize::new(capacity).expect("cache capacity must be non-zero");
        Self {
            entries: RwLock::new(LruCache::new(capacity_nz)),
            ttls,
            capacity,
        }
    }

    /// Look up a payload.
    ///
    /// Returns `Some` only if the key is present and not expired for its
    /// kind. An expired entry is deleted as a side effect of the lookup.
    /// A hit marks the entry as recently used.
    pub async fn get(&self, key: &str) -> Option<CachedPayload> {
        let mut entries = self.entries.write().await;

        let expired = entries.peek(key)?.is_expired(&self.ttls);
        if expired {
            entries.pop(key);
            return None;
        }

        entries.get(key).map(|entry| CachedPayload {
            payload: entry.payload.clone(),
            content_type: entry.content_type.clone(),
        })
    }

    /// Store a payload under `key`.
    ///
    /// If the store is at capacity, the least-recently-used entry is evicted
    /// first. Re-inserting an existing key overwrites it.
    pub async fn put(
        &self,
        key: String,
        payload: Bytes,
        content_type: impl Into<String>,
        kind: CacheKind,
    ) {
        let mut entries = self.entries.write().await;
        entries.put(
            key,
            CacheEntry {
                payload,
                content_type: content_type.into(),
                kind,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Remove every expired entry, returning how many were cleared.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(&self.ttls))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    /// Remove every entry, returning how many were cleared.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        count
    }

    /// Current number of stored entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        let entries = self.entries.read().await;
        entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot for status display.
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len().await,
            capacity: self.capacity,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
