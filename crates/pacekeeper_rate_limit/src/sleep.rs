//! Suspension primitives shared by the waiters.
//!
//! Tick convention: a tick is reported after each elapsed second, with
//! `seconds_waited` counting 1, 2, ..., `seconds` and `seconds_remaining`
//! counting down to 0. A wait of `n` seconds therefore reports exactly `n`
//! ticks, and a zero-second wait returns immediately without ticking.

use crate::{WaitObserver, WaitTick};
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Upper bound on any single wait while a waiter is in test mode.
pub const TEST_MODE_MAX_WAIT: Duration = Duration::from_secs(2);

/// Suspend for `seconds`, reporting a tick to `observer` after each one.
///
/// Every call owns its interval timer; it is dropped (and thereby
/// cancelled) exactly once, when this future completes or is dropped.
///
/// # Example
///
/// ```
/// use pacekeeper_rate_limit::{sleep_with_ticks, FnObserver};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let observer = FnObserver::new().on_tick(|tick| println!("{} left", tick.seconds_remaining));
/// sleep_with_ticks(0, &observer).await; // returns immediately
/// # }
/// ```
pub async fn sleep_with_ticks(seconds: u64, observer: &dyn WaitObserver) {
    if seconds == 0 {
        return;
    }

    let period = Duration::from_secs(1);
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for waited in 1..=seconds {
        interval.tick().await;
        observer.on_tick(&WaitTick {
            seconds_remaining: seconds - waited,
            seconds_waited: waited,
        });
    }
}

/// Suspend for `duration` without reporting ticks.
///
/// Used for fixed inter-call delays, which are usually well under a second.
pub async fn sleep_millis(duration: Duration) {
    if !duration.is_zero() {
        time::sleep(duration).await;
    }
}

/// Cap a wait in seconds at [`TEST_MODE_MAX_WAIT`] when `test_mode` is set.
pub(crate) fn clamp_seconds(seconds: u64, test_mode: bool) -> u64 {
    if test_mode {
        seconds.min(TEST_MODE_MAX_WAIT.as_secs())
    } else {
        seconds
    }
}

/// Cap a delay at [`TEST_MODE_MAX_WAIT`] when `test_mode` is set.
pub(crate) fn clamp_duration(duration: Duration, test_mode: bool) -> Duration {
    if test_mode {
        duration.min(TEST_MODE_MAX_WAIT)
    } else {
        duration
    }
}
