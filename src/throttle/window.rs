//! Business-hours window calculations.
//!
//! The operating window is the daily time-of-day interval during which
//! upstream calls are permitted. The window is configured in local wall-clock
//! time and may cross midnight (e.g. 06:00-00:15), in which case the end is
//! numerically "before" the start.
//!
//! All predicates take the current time as an explicit argument so tests can
//! inject arbitrary times; only [`now_local`] touches the system clock.

use std::time::Duration;

use chrono::{Local, NaiveTime, Timelike};

const MINUTES_PER_DAY: u32 = 24 * 60;
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Current local wall-clock time of day.
pub(crate) fn now_local() -> NaiveTime {
    Local::now().time()
}

/// A daily operating window in local wall-clock time.
///
/// Immutable after construction. An end time numerically before the start
/// denotes a window that crosses midnight.
///
/// # Example
///
/// ```
/// use tilegate::throttle::BusinessHoursWindow;
/// use chrono::NaiveTime;
///
/// // Open from 06:00 until 00:15 the next day.
/// let window = BusinessHoursWindow::new(6, 0, 0, 15);
/// assert_eq!(window.operating_hours(), 18.25);
///
/// let late = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
/// assert!(window.is_open(late));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHoursWindow {
    start_hour: u8,
    start_minute: u8,
    end_hour: u8,
    end_minute: u8,
}

impl BusinessHoursWindow {
    /// Create a new window from local wall-clock start and end times.
    ///
    /// Hours must be 0-23 and minutes 0-59; [`crate::config::Config`]
    /// validates its window fields before constructing one.
    pub fn new(start_hour: u8, start_minute: u8, end_hour: u8, end_minute: u8) -> Self {
        Self {
            start_hour,
            start_minute,
            end_hour,
            end_minute,
        }
    }

    fn start_minutes(&self) -> u32 {
        self.start_hour as u32 * 60 + self.start_minute as u32
    }

    fn end_minutes(&self) -> u32 {
        self.end_hour as u32 * 60 + self.end_minute as u32
    }

    /// Whether the window crosses midnight.
    pub fn crosses_midnight(&self) -> bool {
        self.end_minutes() < self.start_minutes()
    }

    /// Length of the window in hours.
    ///
    /// When the window crosses midnight, 24h are added to the end before
    /// subtracting, so the result is always positive.
    pub fn operating_hours(&self) -> f64 {
        let start = self.start_minutes() as f64;
        let mut end = self.end_minutes() as f64;
        if end < start {
            end += MINUTES_PER_DAY as f64;
        }
        (end - start) / 60.0
    }

    /// Whether `now` falls inside the window.
    pub fn is_open(&self, now: NaiveTime) -> bool {
        let current = now.hour() * 60 + now.minute();
        let start = self.start_minutes();
        let end = self.end_minutes();
        if self.crosses_midnight() {
            current >= start || current <= end
        } else {
            (start..=end).contains(&current)
        }
    }

    /// Time remaining until the next start instant.
    ///
    /// Chooses tomorrow's start when today's has already passed. The result
    /// is meaningful regardless of whether the window is currently open.
    pub fn until_open(&self, now: NaiveTime) -> Duration {
        let current = now.num_seconds_from_midnight() as u64;
        let start = self.start_minutes() as u64 * 60;
        let secs = if current < start {
            start - current
        } else {
            SECONDS_PER_DAY - current + start
        };
        Duration::from_secs(secs)
    }

    /// Display string in "HH:MM-HH:MM" form.
    pub fn formatted(&self) -> String {
        format!(
            "{:02}:{:02}-{:02}:{:02}",
            self.start_hour, self.start_minute, self.end_hour, self.end_minute
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
