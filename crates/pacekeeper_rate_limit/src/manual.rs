//! Waiter for quotas declared up front.
//!
//! The [`ManualWaiter`] counts calls itself. Quota windows follow the wall
//! clock: the minute window ends at the top of the next minute and the hour
//! window at the top of the next hour, independent of when the first call
//! in the window was made.

use crate::sleep::{clamp_duration, clamp_seconds};
use crate::{
    Clock, ManualLimitConfig, NoopObserver, QuotaLimit, SystemClock, WaitEnded, WaitObserver,
    WaitStarted, delay_from_raw, sleep_millis, sleep_with_ticks,
};
use chrono::Timelike;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Usage counters reported after each admitted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct CallCounts {
    /// Calls admitted in the current minute window
    pub calls_in_minute: u64,
    /// Calls admitted in the current hour window
    pub calls_in_hour: u64,
    /// Calls admitted since the waiter was created
    pub total_calls: u64,
}

/// Reports how many calls are queued behind the one being admitted.
pub(crate) type DepthProbe<'a> = &'a (dyn Fn() -> usize + Send + Sync);

/// Paces calls against fixed per-minute and per-hour quotas.
///
/// Call [`check`](Self::check) immediately before each outbound call. It
/// returns at once while both quotas have room. Once a quota is used up it
/// suspends until the window rolls over, reporting progress to the
/// observer, then resets the exhausted counters. When both quotas are used
/// up at the same time the hour wait wins, being the longer of the two.
///
/// Concurrent `check` calls on one waiter are admitted one at a time, in
/// the order they arrived.
///
/// # Example
///
/// ```rust,no_run
/// use pacekeeper_rate_limit::{ManualLimitConfig, ManualWaiter, TracingObserver};
///
/// # #[tokio::main]
/// # async fn main() {
/// let waiter = ManualWaiter::new(
///     ManualLimitConfig::builder()
///         .minutely_limit(5)
///         .hourly_limit(10)
///         .build(),
/// )
/// .with_observer(TracingObserver);
///
/// for _ in 0..6 {
///     let counts = waiter.check().await;
///     println!("calls this minute: {}", counts.calls_in_minute);
///     // make the API call here
/// }
/// # }
/// ```
pub struct ManualWaiter {
    minutely_limit: QuotaLimit,
    hourly_limit: QuotaLimit,
    delay: Duration,
    test_mode: bool,
    observer: Arc<dyn WaitObserver>,
    clock: Arc<dyn Clock>,
    counters: Mutex<CallCounts>,
    // Held for the whole of an admission, waits included.
    admission: tokio::sync::Mutex<()>,
}

impl ManualWaiter {
    /// Create a waiter from configuration.
    ///
    /// Limits that are absent or not positive are treated as unbounded, and
    /// such delays as disabled. This never fails.
    #[instrument(skip(config), fields(
        minutely_limit = ?config.minutely_limit(),
        hourly_limit = ?config.hourly_limit(),
    ))]
    pub fn new(config: ManualLimitConfig) -> Self {
        let minutely_limit = QuotaLimit::from_raw(*config.minutely_limit());
        let hourly_limit = QuotaLimit::from_raw(*config.hourly_limit());
        let delay = delay_from_raw(*config.delay_ms());
        debug!(
            %minutely_limit,
            %hourly_limit,
            delay_ms = delay.as_millis() as u64,
            test_mode = config.test_mode(),
            "Creating manual-limit waiter"
        );

        Self {
            minutely_limit,
            hourly_limit,
            delay,
            test_mode: config.test_mode(),
            observer: Arc::new(NoopObserver),
            clock: Arc::new(SystemClock),
            counters: Mutex::new(CallCounts::default()),
            admission: tokio::sync::Mutex::new(()),
        }
    }

    /// Replace the observer that receives wait events.
    pub fn with_observer(mut self, observer: impl WaitObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Replace the clock used to find window boundaries.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Normalized per-minute limit.
    pub fn minutely_limit(&self) -> QuotaLimit {
        self.minutely_limit
    }

    /// Normalized per-hour limit.
    pub fn hourly_limit(&self) -> QuotaLimit {
        self.hourly_limit
    }

    /// Normalized inter-call delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Current counters, without admitting a call.
    pub fn counts(&self) -> CallCounts {
        *self.counters.lock()
    }

    /// Wait until a call is allowed, then count it.
    ///
    /// Returns the counters including the call just admitted. Never fails.
    #[instrument(skip(self))]
    pub async fn check(&self) -> CallCounts {
        self.admit(None).await
    }

    pub(crate) async fn admit(&self, depth: Option<DepthProbe<'_>>) -> CallCounts {
        let _turn = self.admission.lock().await;
        let counts = self.counts();

        if self.hourly_limit.is_reached(counts.calls_in_hour) {
            let seconds = clamp_seconds(
                seconds_until_next_hour(self.clock.as_ref()),
                self.test_mode,
            );
            self.observer.on_start(&WaitStarted::HourQuota {
                calls_in_hour: counts.calls_in_hour,
                hourly_limit: self.hourly_limit.get().unwrap_or_default(),
                seconds_to_wait: seconds,
            });
            sleep_with_ticks(seconds, self.observer.as_ref()).await;
            {
                let mut counters = self.counters.lock();
                counters.calls_in_minute = 0;
                counters.calls_in_hour = 0;
            }
            debug!(seconds, "Hour window rolled over");
            self.observer
                .on_end(&self.wait_ended(Duration::from_secs(seconds), depth));
        } else if self.minutely_limit.is_reached(counts.calls_in_minute) {
            let seconds = clamp_seconds(
                seconds_until_next_minute(self.clock.as_ref()),
                self.test_mode,
            );
            self.observer.on_start(&WaitStarted::MinuteQuota {
                calls_in_minute: counts.calls_in_minute,
                minutely_limit: self.minutely_limit.get().unwrap_or_default(),
                seconds_to_wait: seconds,
            });
            sleep_with_ticks(seconds, self.observer.as_ref()).await;
            self.counters.lock().calls_in_minute = 0;
            debug!(seconds, "Minute window rolled over");
            self.observer
                .on_end(&self.wait_ended(Duration::from_secs(seconds), depth));
        } else if !self.delay.is_zero() {
            let delay = clamp_duration(self.delay, self.test_mode);
            self.observer
                .on_start(&WaitStarted::InterCallDelay { delay });
            sleep_millis(delay).await;
            self.observer.on_end(&self.wait_ended(delay, depth));
        }

        let mut counters = self.counters.lock();
        counters.calls_in_minute += 1;
        counters.calls_in_hour += 1;
        counters.total_calls += 1;
        debug!(
            calls_in_minute = counters.calls_in_minute,
            calls_in_hour = counters.calls_in_hour,
            total_calls = counters.total_calls,
            "Call admitted"
        );
        *counters
    }

    fn wait_ended(&self, waited: Duration, depth: Option<DepthProbe<'_>>) -> WaitEnded {
        match depth {
            Some(probe) => WaitEnded {
                waited,
                queue_depth: Some(probe()),
                total_calls: Some(self.counts().total_calls),
            },
            None => WaitEnded {
                waited,
                queue_depth: None,
                total_calls: None,
            },
        }
    }
}

impl fmt::Debug for ManualWaiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualWaiter")
            .field("minutely_limit", &self.minutely_limit)
            .field("hourly_limit", &self.hourly_limit)
            .field("delay", &self.delay)
            .field("test_mode", &self.test_mode)
            .field("clock", &self.clock)
            .field("counters", &self.counts())
            .finish_non_exhaustive()
    }
}

/// Seconds from now until the top of the next clock hour, in whole minutes.
fn seconds_until_next_hour(clock: &dyn Clock) -> u64 {
    u64::from(60 - clock.now().minute()) * 60
}

/// Seconds from now until the top of the next clock minute.
fn seconds_until_next_minute(clock: &dyn Clock) -> u64 {
    u64::from(60 - clock.now().second())
}
