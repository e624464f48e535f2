//! Wait lifecycle hooks.
//!
//! Every wait a waiter performs is reported to its [`WaitObserver`]: once
//! when it starts, once per elapsed second, and once when it ends. Hooks
//! are informational; they cannot shorten or cancel a wait.

use crate::RateLimitSnapshot;
use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Why a waiter is about to suspend.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitStarted {
    /// The hourly quota is used up; waiting for the top of the next hour.
    HourQuota {
        /// Calls counted in the current hour
        calls_in_hour: u64,
        /// Configured hourly limit
        hourly_limit: u64,
        /// Seconds that will be waited
        seconds_to_wait: u64,
    },
    /// The minutely quota is used up; waiting for the top of the next minute.
    MinuteQuota {
        /// Calls counted in the current minute
        calls_in_minute: u64,
        /// Configured minutely limit
        minutely_limit: u64,
        /// Seconds that will be waited
        seconds_to_wait: u64,
    },
    /// Fixed pause between calls.
    InterCallDelay {
        /// Length of the pause
        delay: Duration,
    },
    /// The last response reported no calls remaining.
    HeaderReset {
        /// Values parsed from the last response
        snapshot: RateLimitSnapshot,
        /// Time the wait was computed
        now: DateTime<FixedOffset>,
        /// Instant the provider's window reopens
        reset_at: Option<DateTime<FixedOffset>>,
        /// Seconds that will be waited
        seconds_to_wait: u64,
    },
}

/// Progress through a wait, reported once per elapsed second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTick {
    /// Seconds still to go
    pub seconds_remaining: u64,
    /// Seconds elapsed so far, starting at 1
    pub seconds_waited: u64,
}

/// Summary of a finished wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitEnded {
    /// How long the waiter was suspended
    pub waited: Duration,
    /// Calls still queued behind this one (queued calls only)
    pub queue_depth: Option<usize>,
    /// Calls admitted over the waiter's lifetime (queued calls only)
    pub total_calls: Option<u64>,
}

impl WaitEnded {
    /// Whole seconds waited.
    pub fn seconds_waited(&self) -> u64 {
        self.waited.as_secs()
    }
}

/// Receives wait lifecycle events.
///
/// All methods default to doing nothing, so implementors only override
/// the events they care about.
pub trait WaitObserver: Send + Sync {
    /// Called before a wait begins.
    fn on_start(&self, _event: &WaitStarted) {}

    /// Called after each elapsed second of a quota or reset wait.
    fn on_tick(&self, _tick: &WaitTick) {}

    /// Called after a wait completes.
    fn on_end(&self, _event: &WaitEnded) {}
}

/// Observer that ignores every event. The waiters' default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl WaitObserver for NoopObserver {}

/// Observer that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl WaitObserver for TracingObserver {
    fn on_start(&self, event: &WaitStarted) {
        match event {
            WaitStarted::HourQuota {
                calls_in_hour,
                hourly_limit,
                seconds_to_wait,
            } => info!(
                calls_in_hour,
                hourly_limit, seconds_to_wait, "Hourly quota exhausted, waiting for next hour"
            ),
            WaitStarted::MinuteQuota {
                calls_in_minute,
                minutely_limit,
                seconds_to_wait,
            } => info!(
                calls_in_minute,
                minutely_limit, seconds_to_wait, "Minutely quota exhausted, waiting for next minute"
            ),
            WaitStarted::InterCallDelay { delay } => {
                debug!(delay_ms = delay.as_millis() as u64, "Pausing between calls")
            }
            WaitStarted::HeaderReset {
                snapshot,
                reset_at,
                seconds_to_wait,
                ..
            } => info!(
                limit = ?snapshot.limit,
                reset = ?snapshot.reset,
                reset_at = ?reset_at,
                seconds_to_wait,
                "No calls remaining, waiting for reset"
            ),
        }
    }

    fn on_tick(&self, tick: &WaitTick) {
        debug!(
            seconds_remaining = tick.seconds_remaining,
            seconds_waited = tick.seconds_waited,
            "Waiting"
        );
    }

    fn on_end(&self, event: &WaitEnded) {
        info!(
            waited_ms = event.waited.as_millis() as u64,
            queue_depth = ?event.queue_depth,
            total_calls = ?event.total_calls,
            "Finished waiting"
        );
    }
}

type StartHook = Box<dyn Fn(&WaitStarted) + Send + Sync>;
type TickHook = Box<dyn Fn(&WaitTick) + Send + Sync>;
type EndHook = Box<dyn Fn(&WaitEnded) + Send + Sync>;

/// Observer assembled from closures.
///
/// # Example
///
/// ```
/// use pacekeeper_rate_limit::FnObserver;
///
/// let observer = FnObserver::new()
///     .on_start(|event| println!("start waiting: {:?}", event))
///     .on_end(|event| println!("end waiting after {}s", event.seconds_waited()));
/// ```
#[derive(Default)]
pub struct FnObserver {
    start: Option<StartHook>,
    tick: Option<TickHook>,
    end: Option<EndHook>,
}

impl FnObserver {
    /// Create an observer with no hooks set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start-waiting hook.
    pub fn on_start(mut self, hook: impl Fn(&WaitStarted) + Send + Sync + 'static) -> Self {
        self.start = Some(Box::new(hook));
        self
    }

    /// Set the per-second tick hook.
    pub fn on_tick(mut self, hook: impl Fn(&WaitTick) + Send + Sync + 'static) -> Self {
        self.tick = Some(Box::new(hook));
        self
    }

    /// Set the end-waiting hook.
    pub fn on_end(mut self, hook: impl Fn(&WaitEnded) + Send + Sync + 'static) -> Self {
        self.end = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for FnObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnObserver")
            .field("start", &self.start.is_some())
            .field("tick", &self.tick.is_some())
            .field("end", &self.end.is_some())
            .finish()
    }
}

impl WaitObserver for FnObserver {
    fn on_start(&self, event: &WaitStarted) {
        if let Some(hook) = &self.start {
            hook(event);
        }
    }

    fn on_tick(&self, tick: &WaitTick) {
        if let Some(hook) = &self.tick {
            hook(tick);
        }
    }

    fn on_end(&self, event: &WaitEnded) {
        if let Some(hook) = &self.end {
            hook(event);
        }
    }
}
