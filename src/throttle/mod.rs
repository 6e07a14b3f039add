//! Admission control for metered upstream services.
//!
//! This module keeps outbound requests inside a hard daily quota and a
//! configurable operating window, and spreads them evenly across that window
//! so the quota lasts the whole day.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Throttler                       │
//! │  submit() ──► RequestQueue ──► worker loop           │
//! │                                  │                   │
//! │                  BusinessHoursWindow gate            │
//! │                  daily-quota gate                    │
//! │                  pacing-interval gate                │
//! │                                  │                   │
//! │                                  ▼                   │
//! │                           upstream call              │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`Throttler`]: per-service admission controller with a single worker loop
//! - [`BusinessHoursWindow`]: pure time-of-day predicate, midnight-crossing aware
//! - [`ThrottleStatus`] / [`WindowStatus`]: snapshots for monitoring display

mod queue;
mod throttler;
mod window;

pub use throttler::{ThrottleStatus, Throttler, WindowStatus};
pub use window::BusinessHoursWindow;
