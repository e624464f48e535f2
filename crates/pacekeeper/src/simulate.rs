//! Simulated call sequences.
//!
//! These drive the waiters with stand-in API calls so their pacing can be
//! watched from the command line without touching a real service.

use chrono::{DateTime, FixedOffset};
use pacekeeper_error::QueueError;
use pacekeeper_rate_limit::{
    CallCounts, CallQueue, Clock, HeaderWaiter, ManualWaiter, RateLimitSnapshot, ResetUnit,
};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, instrument};

/// Outcome of one simulated call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "waiter", rename_all = "snake_case")]
pub enum CallReport {
    /// A call admitted by a manual-limit waiter
    Manual {
        /// 1-based call number
        call: usize,
        /// Counters after admission
        counts: CallCounts,
    },
    /// A call run through a call queue
    Queued {
        /// 1-based enqueue position
        call: usize,
        /// Position in which it actually ran
        completed: usize,
    },
    /// A call paced by a header-driven waiter
    Header {
        /// 1-based call number
        call: usize,
        /// Snapshot the check resolved with, if it passed
        snapshot: Option<RateLimitSnapshot>,
        /// Rejection message, if the check failed
        error: Option<String>,
    },
}

/// Run `calls` sequential checks through `waiter`.
#[instrument(skip(waiter))]
pub async fn run_manual(waiter: &ManualWaiter, calls: usize) -> Vec<CallReport> {
    let mut reports = Vec::with_capacity(calls);
    for call in 1..=calls {
        let counts = waiter.check().await;
        debug!(call, "Continuing with simulated API call");
        reports.push(CallReport::Manual { call, counts });
    }
    reports
}

/// Enqueue `calls` stand-in calls at once and report the order they ran in.
///
/// Each call takes `call_duration` to complete.
///
/// # Errors
///
/// Returns an error if a queued call is dropped before completing.
#[instrument(skip(queue))]
pub async fn run_queued(
    queue: &CallQueue,
    calls: usize,
    call_duration: Duration,
) -> Result<Vec<CallReport>, QueueError> {
    let completed = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (1..=calls)
        .map(|call| {
            let completed = Arc::clone(&completed);
            queue.enqueue(move || async move {
                tokio::time::sleep(call_duration).await;
                let position = completed.fetch_add(1, Ordering::SeqCst) + 1;
                CallReport::Queued {
                    call,
                    completed: position,
                }
            })
        })
        .collect();

    let mut reports = Vec::with_capacity(calls);
    for handle in handles {
        reports.push(handle.await?);
    }
    Ok(reports)
}

/// Drive `waiter` with responses from a fake API allowing `window` calls
/// that resets `reset_after` from the time of each response.
///
/// Mirrors the usual loop: check, make the call, feed the response headers
/// back. The first check passes without headers; once `window` calls have
/// been made the reported remaining count hits zero and the next check
/// waits for the reset.
#[instrument(skip(waiter, clock))]
pub async fn run_headers(
    waiter: &HeaderWaiter,
    clock: &dyn Clock,
    calls: usize,
    window: i64,
    reset_after: Duration,
) -> Vec<CallReport> {
    let config = waiter.config().clone();
    let mut used = 0_i64;
    let mut reports = Vec::with_capacity(calls);

    for call in 1..=calls {
        let report = match waiter.check().await {
            Ok(snapshot) => {
                if snapshot.remaining == Some(0) {
                    used = 0;
                }
                CallReport::Header {
                    call,
                    snapshot: Some(snapshot),
                    error: None,
                }
            }
            Err(e) => CallReport::Header {
                call,
                snapshot: None,
                error: Some(e.to_string()),
            },
        };
        reports.push(report);

        used += 1;
        let remaining = (window - used).max(0);
        let reset = reset_value(config.reset_unit(), clock.now(), reset_after);
        waiter.update([
            (config.limit_header().as_str(), window.to_string()),
            (config.remaining_header().as_str(), remaining.to_string()),
            (config.reset_header().as_str(), reset.to_string()),
        ]);
    }

    reports
}

/// Reset header value meaning "`after` from `now`" in `unit`.
pub fn reset_value(unit: &ResetUnit, now: DateTime<FixedOffset>, after: Duration) -> i64 {
    let millis = after.as_millis() as i64;
    match unit {
        ResetUnit::EpochMillis => now.timestamp_millis() + millis,
        ResetUnit::EpochSeconds => (now.timestamp_millis() + millis + 999) / 1000,
        ResetUnit::Milliseconds => millis,
        ResetUnit::Seconds => (millis + 999) / 1000,
        ResetUnit::Minutes => (millis + 59_999) / 60_000,
        ResetUnit::Hours => (millis + 3_599_999) / 3_600_000,
    }
}

/// First rejection message in a header simulation, if any.
pub fn first_rejection(reports: &[CallReport]) -> Option<&str> {
    reports.iter().find_map(|report| match report {
        CallReport::Header {
            error: Some(error), ..
        } => Some(error.as_str()),
        _ => None,
    })
}
