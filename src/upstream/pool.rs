//! Round-robin rotation over equivalent upstream hosts.
//!
//! Tile providers commonly expose several interchangeable hostnames
//! (e.g. `maps1.` through `maps4.`) so clients can spread load. The pool
//! cycles through the configured list in order; under sequential access no
//! host is ever skipped.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed list of equivalent upstream hosts with a rotation cursor.
///
/// Stateless apart from the cursor; calling [`TileServerPool::next`] has no
/// side effect beyond advancing the rotation.
///
/// # Example
///
/// ```
/// use tilegate::upstream::TileServerPool;
///
/// let pool = TileServerPool::new(vec![
///     "maps1.example.com".to_string(),
///     "maps2.example.com".to_string(),
/// ]);
///
/// assert_eq!(pool.next(), "maps1.example.com");
/// assert_eq!(pool.next(), "maps2.example.com");
/// assert_eq!(pool.next(), "maps1.example.com");
/// ```
pub struct TileServerPool {
    hosts: Vec<String>,
    cursor: AtomicUsize,
}

impl TileServerPool {
    /// Create a pool over the given hosts.
    ///
    /// # Panics
    ///
    /// Panics if `hosts` is empty; [`crate::config::Config::validate`]
    /// rejects an empty host list before services are constructed.
    pub fn new(hosts: Vec<String>) -> Self {
        assert!(!hosts.is_empty(), "host pool must not be empty");
        Self {
            hosts,
            cursor: AtomicUsize::new(0),
        }
    }

    /// The next host in rotation.
    pub fn next(&self) -> &str {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.hosts.len();
        &self.hosts[index]
    }

    /// Number of hosts in the pool.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Whether the pool is empty (never true for a constructed pool).
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// The configured hosts, in rotation order.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }
}

// =============================================================================
// Tests
// =============================================================================
