//! Tests for the simulated call sequences behind the CLI.

use chrono::{TimeZone, Utc};
use pacekeeper::simulate::{
    CallReport, first_rejection, reset_value, run_headers, run_manual, run_queued,
};
use pacekeeper::{
    CallQueue, HeaderLimitConfig, HeaderWaiter, ManualClock, ManualLimitConfig, ManualWaiter,
    ResetUnit,
};
use std::time::Duration;
use tokio::time::Instant;

const NOW_SECS: i64 = 1_714_564_800;

#[tokio::test(start_paused = true)]
async fn test_run_manual_reports_counts_per_call() {
    let waiter = ManualWaiter::new(ManualLimitConfig::builder().minutely_limit(2).build())
        .with_clock(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 55).unwrap(),
        ));
    let started = Instant::now();

    let reports = run_manual(&waiter, 3).await;

    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert_eq!(reports.len(), 3);
    match &reports[2] {
        CallReport::Manual { call, counts } => {
            assert_eq!(*call, 3);
            assert_eq!(counts.calls_in_minute, 1);
            assert_eq!(counts.total_calls, 3);
        }
        other => panic!("Expected a manual report, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_queued_completes_in_enqueue_order() {
    let queue = CallQueue::new(ManualWaiter::new(ManualLimitConfig::default()));

    let reports = run_queued(&queue, 4, Duration::from_millis(10))
        .await
        .unwrap();

    let order: Vec<_> = reports
        .iter()
        .map(|report| match report {
            CallReport::Queued { call, completed } => (*call, *completed),
            other => panic!("Expected a queued report, got {:?}", other),
        })
        .collect();
    assert_eq!(order, vec![(1, 1), (2, 2), (3, 3), (4, 4)]);
}

#[tokio::test(start_paused = true)]
async fn test_run_headers_waits_once_window_is_spent() {
    let clock = ManualClock::new(Utc.timestamp_opt(NOW_SECS, 0).unwrap());
    let waiter = HeaderWaiter::new(HeaderLimitConfig::default()).with_clock(clock.clone());
    let started = Instant::now();

    let reports = run_headers(&waiter, &clock, 4, 2, Duration::from_secs(3)).await;

    assert_eq!(started.elapsed(), Duration::from_secs(3));
    assert_eq!(first_rejection(&reports), None);

    let remaining: Vec<_> = reports
        .iter()
        .map(|report| match report {
            CallReport::Header {
                snapshot: Some(snapshot),
                ..
            } => snapshot.remaining,
            other => panic!("Expected a passing header report, got {:?}", other),
        })
        .collect();
    // First check runs before any headers; the third waits out the reset.
    assert_eq!(remaining, vec![None, Some(1), Some(0), Some(1)]);
}

#[test]
fn test_reset_value_per_unit() {
    let now = Utc.timestamp_opt(NOW_SECS, 500_000_000).unwrap().fixed_offset();
    let after = Duration::from_secs(90);

    assert_eq!(
        reset_value(&ResetUnit::EpochMillis, now, after),
        NOW_SECS * 1000 + 500 + 90_000
    );
    // Rounded up so the reset is never reported early.
    assert_eq!(
        reset_value(&ResetUnit::EpochSeconds, now, after),
        NOW_SECS + 91
    );
    assert_eq!(reset_value(&ResetUnit::Milliseconds, now, after), 90_000);
    assert_eq!(reset_value(&ResetUnit::Seconds, now, after), 90);
    assert_eq!(reset_value(&ResetUnit::Minutes, now, after), 2);
    assert_eq!(reset_value(&ResetUnit::Hours, now, after), 1);
}

#[test]
fn test_first_rejection_finds_header_errors() {
    let reports = vec![
        CallReport::Header {
            call: 1,
            snapshot: None,
            error: None,
        },
        CallReport::Header {
            call: 2,
            snapshot: None,
            error: Some("corrupt headers".to_string()),
        },
    ];

    assert_eq!(first_rejection(&reports), Some("corrupt headers"));
    assert_eq!(first_rejection(&reports[..1]), None);
}

#[test]
fn test_reports_serialize_with_waiter_tag() {
    let report = CallReport::Queued {
        call: 2,
        completed: 2,
    };

    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["waiter"], "queued");
    assert_eq!(json["call"], 2);
}
