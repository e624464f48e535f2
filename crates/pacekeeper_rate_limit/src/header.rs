//! Waiter driven by rate limit response headers.
//!
//! Providers commonly report their limits on every response:
//! - `x-ratelimit-limit`: Requests allowed in current window
//! - `x-ratelimit-remaining`: Requests remaining
//! - `x-ratelimit-reset`: When the window reopens (see [`ResetUnit`])
//!
//! The [`HeaderWaiter`] keeps the values from the most recent response and,
//! when they say nothing is left, suspends the next call until the reset.

use crate::sleep::clamp_seconds;
use crate::{
    Clock, HeaderLimitConfig, NoopObserver, ResetUnit, SystemClock, WaitEnded, WaitObserver,
    WaitStarted, sleep_with_ticks,
};
use chrono::{DateTime, FixedOffset, TimeDelta};
use pacekeeper_error::{HeaderError, HeaderErrorKind};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Largest integer a reset/limit value may hold (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Values parsed from the most recent response.
///
/// A field is `None` when its header was absent or did not hold a safe
/// integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct RateLimitSnapshot {
    /// Calls allowed in the current window
    pub limit: Option<i64>,
    /// Calls left in the current window
    pub remaining: Option<i64>,
    /// Reset value, read according to the configured [`ResetUnit`]
    pub reset: Option<i64>,
}

impl RateLimitSnapshot {
    /// Whether all three values are present.
    pub fn is_complete(&self) -> bool {
        self.limit.is_some() && self.remaining.is_some() && self.reset.is_some()
    }
}

#[derive(Debug, Default)]
struct HeaderState {
    snapshot: RateLimitSnapshot,
    raw_headers: Option<BTreeMap<String, String>>,
    checked: bool,
}

/// Paces calls using the limits a provider reports in its responses.
///
/// Feed each response's headers to [`update`](Self::update) and call
/// [`check`](Self::check) before the next request. The very first check
/// always passes, since no response has been seen yet.
///
/// # Example
///
/// ```rust,no_run
/// use pacekeeper_rate_limit::{HeaderLimitConfig, HeaderWaiter, ResetUnit};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let waiter = HeaderWaiter::new(
///     HeaderLimitConfig::builder()
///         .reset_unit(ResetUnit::EpochSeconds)
///         .build(),
/// );
///
/// loop {
///     waiter.check().await?;
///     // let response = client.get(url).send().await?;
///     // waiter.update_from_header_map(response.headers());
/// #   break;
/// }
/// # Ok(())
/// # }
/// ```
pub struct HeaderWaiter {
    config: HeaderLimitConfig,
    observer: Arc<dyn WaitObserver>,
    clock: Arc<dyn Clock>,
    state: Mutex<HeaderState>,
}

impl HeaderWaiter {
    /// Create a waiter from configuration.
    ///
    /// Blank header names fall back to the conventional `x-ratelimit-*`
    /// names.
    #[instrument(skip(config), fields(reset_unit = %config.reset_unit()))]
    pub fn new(config: HeaderLimitConfig) -> Self {
        let config = config.normalized();
        debug!(
            limit_header = %config.limit_header(),
            remaining_header = %config.remaining_header(),
            reset_header = %config.reset_header(),
            "Creating header-driven waiter"
        );
        Self {
            config,
            observer: Arc::new(NoopObserver),
            clock: Arc::new(SystemClock),
            state: Mutex::new(HeaderState::default()),
        }
    }

    /// Replace the observer that receives wait events.
    pub fn with_observer(mut self, observer: impl WaitObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Replace the clock used to measure the time until reset.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Configuration in effect.
    pub fn config(&self) -> &HeaderLimitConfig {
        &self.config
    }

    /// Values from the most recent update.
    pub fn snapshot(&self) -> RateLimitSnapshot {
        self.state.lock().snapshot
    }

    /// Raw headers from the most recent update.
    pub fn raw_headers(&self) -> Option<BTreeMap<String, String>> {
        self.state.lock().raw_headers.clone()
    }

    /// Replace the stored limits with those in `headers`.
    ///
    /// Header names are matched case-insensitively. Values that are missing
    /// or unparsable are stored as `None` and reported by the next
    /// [`check`](Self::check); this method never fails.
    ///
    /// # Example
    ///
    /// ```
    /// use pacekeeper_rate_limit::{HeaderLimitConfig, HeaderWaiter};
    ///
    /// let waiter = HeaderWaiter::new(HeaderLimitConfig::default());
    /// waiter.update([
    ///     ("X-RateLimit-Limit", "60"),
    ///     ("X-RateLimit-Remaining", "59"),
    ///     ("X-RateLimit-Reset", "1714564800"),
    /// ]);
    /// assert_eq!(waiter.snapshot().remaining, Some(59));
    /// ```
    #[instrument(skip_all)]
    pub fn update<I, K, V>(&self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let raw: BTreeMap<String, String> = headers
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_string(), value.as_ref().to_string()))
            .collect();

        let snapshot = RateLimitSnapshot {
            limit: header_integer(&raw, self.config.limit_header()),
            remaining: header_integer(&raw, self.config.remaining_header()),
            reset: header_integer(&raw, self.config.reset_header()),
        };
        debug!(?snapshot, "Updated rate limit snapshot");
        if !snapshot.is_complete() {
            warn!(header_count = raw.len(), "Rate limit headers missing or unparsable");
        }

        let mut state = self.state.lock();
        state.snapshot = snapshot;
        state.raw_headers = Some(raw);
    }

    /// Replace the stored limits with those in a reqwest header map.
    ///
    /// Values that are not visible ASCII are skipped.
    #[cfg(feature = "reqwest")]
    pub fn update_from_header_map(&self, headers: &reqwest::header::HeaderMap) {
        self.update(
            headers
                .iter()
                .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v))),
        );
    }

    /// Wait until the provider's window allows another call.
    ///
    /// The first check passes immediately. After that, a snapshot with no
    /// calls remaining suspends until the reset instant; otherwise the check
    /// passes immediately. Returns the snapshot the decision was based on.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderErrorKind::CorruptHeaders`] if the limit, remaining
    /// or reset value is missing or unparsable (and this is not the first
    /// check). The error carries the configured header names and the raw
    /// headers; a later update can clear it.
    #[instrument(skip(self))]
    pub async fn check(&self) -> Result<RateLimitSnapshot, HeaderError> {
        let (snapshot, first) = {
            let mut state = self.state.lock();
            let first = !state.checked;
            state.checked = true;
            (state.snapshot, first)
        };

        if first {
            debug!("First check, no response seen yet");
            return Ok(snapshot);
        }

        let (Some(_), Some(remaining), Some(reset)) =
            (snapshot.limit, snapshot.remaining, snapshot.reset)
        else {
            return Err(self.corrupt_headers());
        };

        if remaining != 0 {
            debug!(remaining, "Calls remaining, proceeding");
            return Ok(snapshot);
        }

        let now = self.clock.now();
        let (seconds, reset_at) = seconds_until_reset(self.config.reset_unit(), reset, &now);
        let seconds = clamp_seconds(seconds, self.config.test_mode());

        self.observer.on_start(&WaitStarted::HeaderReset {
            snapshot,
            now,
            reset_at,
            seconds_to_wait: seconds,
        });
        sleep_with_ticks(seconds, self.observer.as_ref()).await;
        self.observer.on_end(&WaitEnded {
            waited: Duration::from_secs(seconds),
            queue_depth: None,
            total_calls: None,
        });

        Ok(snapshot)
    }

    #[track_caller]
    fn corrupt_headers(&self) -> HeaderError {
        let headers = self.raw_headers();
        warn!(?headers, "Refusing to pace with corrupt rate limit headers");
        HeaderError::new(HeaderErrorKind::CorruptHeaders {
            limit_header: self.config.limit_header().clone(),
            remaining_header: self.config.remaining_header().clone(),
            reset_header: self.config.reset_header().clone(),
            reset_unit: self.config.reset_unit().to_string(),
            headers,
        })
    }
}

impl fmt::Debug for HeaderWaiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderWaiter")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

/// Seconds to wait for `reset`, never negative, plus the reset instant.
fn seconds_until_reset(
    unit: &ResetUnit,
    reset: i64,
    now: &DateTime<FixedOffset>,
) -> (u64, Option<DateTime<FixedOffset>>) {
    let now_ms = now.timestamp_millis();
    let (seconds, reset_at) = match unit.multiplier() {
        None => {
            let reset_ms = match unit {
                ResetUnit::EpochMillis => reset,
                _ => reset.saturating_mul(1000),
            };
            let seconds = ((reset_ms.saturating_sub(now_ms)) as f64 / 1000.0).ceil();
            let reset_at = DateTime::from_timestamp_millis(reset_ms)
                .map(|at| at.with_timezone(&now.timezone()));
            (seconds, reset_at)
        }
        Some(multiplier) => {
            let seconds = (multiplier * reset as f64).ceil();
            let reset_at = TimeDelta::try_milliseconds((seconds.max(0.0) * 1000.0) as i64)
                .and_then(|delta| now.checked_add_signed(delta));
            (seconds, reset_at)
        }
    };
    (seconds.max(0.0) as u64, reset_at)
}

/// Find `name` (ignoring ASCII case) and parse its value.
fn header_integer(headers: &BTreeMap<String, String>, name: &str) -> Option<i64> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, value)| parse_leading_integer(value))
}

/// Parse a leading base-10 integer, ignoring anything after the digits.
///
/// Accepts leading whitespace and an optional sign, so `" 42"`, `"+7"`
/// and `"60;w=60"` all parse. Values outside ±[`MAX_SAFE_INTEGER`] are
/// rejected.
pub(crate) fn parse_leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude: i64 = digits[..end].parse().ok()?;
    let value = if negative { -magnitude } else { magnitude };
    (value.abs() <= MAX_SAFE_INTEGER).then_some(value)
}
