//! Wall-clock sources.
//!
//! Quota windows line up with the local clock (the next top of the minute
//! or hour), and reset headers are absolute epochs, so the waiters read the
//! calendar time through a [`Clock`] rather than calling `chrono` directly.
//! Tests swap in a [`ManualClock`] pinned to a known instant.

use chrono::{DateTime, Duration, FixedOffset, Local, TimeZone, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Source of the current calendar time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time with its UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Clock backed by the system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same instant, so a test can keep a handle and adjust
/// the time a waiter observes.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Timelike, Utc};
/// use pacekeeper_rate_limit::{Clock, ManualClock};
///
/// let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 30).unwrap());
/// assert_eq!(clock.now().second(), 30);
///
/// clock.advance(chrono::Duration::seconds(30));
/// assert_eq!(clock.now().minute(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<FixedOffset>>>,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    pub fn new<Tz: TimeZone>(now: DateTime<Tz>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now.fixed_offset())),
        }
    }

    /// Create a clock frozen at a Unix timestamp in milliseconds (UTC).
    ///
    /// Out-of-range timestamps fall back to the Unix epoch.
    pub fn from_timestamp_millis(millis: i64) -> Self {
        let now = DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Self::new(now)
    }

    /// Move the clock to `now`.
    pub fn set<Tz: TimeZone>(&self, now: DateTime<Tz>) {
        *self.now.lock() = now.fixed_offset();
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock()
    }
}
