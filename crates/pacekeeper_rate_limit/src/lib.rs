//! Client-side call pacing.
//!
//! This crate keeps a caller within an API's rate limits by suspending
//! calls until the limits allow them. It never performs the calls itself.
//!
//! ## Waiters
//!
//! - [`ManualWaiter`] - quotas declared up front (calls per minute and/or
//!   per hour, plus an optional fixed delay between calls). Counts calls
//!   itself and waits for the next clock minute or hour when a quota is
//!   used up.
//! - [`HeaderWaiter`] - limits reported by the provider in response
//!   headers (`x-ratelimit-limit`, `x-ratelimit-remaining`,
//!   `x-ratelimit-reset`). Waits for the reported reset when nothing is
//!   left.
//! - [`CallQueue`] - runs calls strictly in FIFO order, one at a time,
//!   pacing each through a [`ManualWaiter`].
//!
//! Waits are reported to a [`WaitObserver`] (start, one tick per second,
//! end). [`TracingObserver`] logs them; [`FnObserver`] forwards them to
//! closures.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod config;
mod header;
mod limits;
mod manual;
mod observer;
mod queue;
mod reset;
mod sleep;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    DEFAULT_LIMIT_HEADER, DEFAULT_REMAINING_HEADER, DEFAULT_RESET_HEADER, HeaderLimitConfig,
    HeaderLimitConfigBuilder, ManualLimitConfig, ManualLimitConfigBuilder, PacerConfig,
};
pub use header::{HeaderWaiter, MAX_SAFE_INTEGER, RateLimitSnapshot};
pub use limits::{QuotaLimit, delay_from_raw};
pub use manual::{CallCounts, ManualWaiter};
pub use observer::{FnObserver, NoopObserver, TracingObserver, WaitEnded, WaitObserver, WaitStarted, WaitTick};
pub use queue::{CallQueue, DrainState, QueuedCall};
pub use reset::ResetUnit;
pub use sleep::{TEST_MODE_MAX_WAIT, sleep_millis, sleep_with_ticks};
