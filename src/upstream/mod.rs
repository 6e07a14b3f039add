//! Upstream provider plumbing.
//!
//! # Components
//!
//! - [`UpstreamClient`]: async HTTP GET seam, mockable in tests
//! - [`HttpUpstreamClient`]: reqwest-backed production client
//! - [`TileServerPool`]: round-robin rotation over equivalent hosts

mod client;
mod pool;

pub use client::{HttpUpstreamClient, UpstreamClient, UpstreamResponse};
pub use pool::TileServerPool;
