//! Tests for the header-driven waiter.

mod common;

use chrono::{TimeZone, Utc};
use common::Recorder;
use pacekeeper_error::HeaderErrorKind;
use pacekeeper_rate_limit::{
    HeaderLimitConfig, HeaderWaiter, ManualClock, RateLimitSnapshot, ResetUnit, WaitStarted,
};
use std::time::Duration;
use tokio::time::Instant;

const NOW_SECS: i64 = 1_714_564_800;

fn frozen_clock() -> ManualClock {
    ManualClock::new(Utc.timestamp_opt(NOW_SECS, 0).unwrap())
}

fn headers(limit: &str, remaining: &str, reset: &str) -> Vec<(&'static str, String)> {
    vec![
        ("x-ratelimit-limit", limit.to_string()),
        ("x-ratelimit-remaining", remaining.to_string()),
        ("x-ratelimit-reset", reset.to_string()),
    ]
}

/// A waiter whose first (free) check has already been spent.
async fn primed(config: HeaderLimitConfig, recorder: &Recorder) -> HeaderWaiter {
    let waiter = HeaderWaiter::new(config)
        .with_clock(frozen_clock())
        .with_observer(recorder.clone());
    waiter.check().await.expect("First check always passes");
    waiter
}

#[tokio::test(start_paused = true)]
async fn test_first_check_passes_without_headers() {
    let waiter = HeaderWaiter::new(HeaderLimitConfig::default());
    let snapshot = waiter.check().await.unwrap();
    assert_eq!(snapshot, RateLimitSnapshot::default());
}

#[tokio::test(start_paused = true)]
async fn test_first_check_never_waits_even_when_exhausted() {
    let recorder = Recorder::default();
    let waiter = HeaderWaiter::new(HeaderLimitConfig::default())
        .with_clock(frozen_clock())
        .with_observer(recorder.clone());
    waiter.update(headers("5", "0", &(NOW_SECS + 30).to_string()));
    let started = Instant::now();

    let snapshot = waiter.check().await.unwrap();

    assert_eq!(snapshot.remaining, Some(0));
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(recorder.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_update_then_check_round_trips_values() {
    let recorder = Recorder::default();
    let waiter = primed(HeaderLimitConfig::default(), &recorder).await;
    waiter.update(headers("60", "12", "1714564860"));

    let snapshot = waiter.check().await.unwrap();

    assert_eq!(
        snapshot,
        RateLimitSnapshot {
            limit: Some(60),
            remaining: Some(12),
            reset: Some(1_714_564_860),
        }
    );
    assert!(recorder.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_epoch_seconds_waits_until_reset() {
    let recorder = Recorder::default();
    let waiter = primed(HeaderLimitConfig::default(), &recorder).await;
    waiter.update(headers("5", "0", &(NOW_SECS + 3).to_string()));
    let started = Instant::now();

    let snapshot = waiter.check().await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(3));
    assert_eq!(snapshot.reset, Some(NOW_SECS + 3));
    assert_eq!(recorder.ticks().len(), 3);
    assert_eq!(recorder.ends()[0].seconds_waited(), 3);
    match &recorder.starts()[0] {
        WaitStarted::HeaderReset {
            seconds_to_wait,
            reset_at,
            ..
        } => {
            assert_eq!(*seconds_to_wait, 3);
            assert_eq!(reset_at.map(|at| at.timestamp()), Some(NOW_SECS + 3));
        }
        other => panic!("Expected a header reset wait, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_epoch_millis_rounds_up() {
    let recorder = Recorder::default();
    let config = HeaderLimitConfig::builder()
        .reset_unit(ResetUnit::EpochMillis)
        .build();
    let waiter = primed(config, &recorder).await;
    waiter.update(headers("5", "0", &(NOW_SECS * 1000 + 1_200).to_string()));
    let started = Instant::now();

    waiter.check().await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_relative_reset_uses_multiplier() {
    let recorder = Recorder::default();
    let config = HeaderLimitConfig::builder()
        .reset_unit(ResetUnit::Minutes)
        .build();
    let waiter = primed(config, &recorder).await;
    waiter.update(headers("5", "0", "2"));
    let started = Instant::now();

    waiter.check().await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(120));
    assert_eq!(recorder.ticks().len(), 120);
}

#[tokio::test(start_paused = true)]
async fn test_reset_in_the_past_does_not_wait() {
    let recorder = Recorder::default();
    let waiter = primed(HeaderLimitConfig::default(), &recorder).await;
    waiter.update(headers("5", "0", &(NOW_SECS - 10).to_string()));
    let started = Instant::now();

    waiter.check().await.unwrap();

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(recorder.ticks().is_empty());
    assert_eq!(recorder.ends()[0].seconds_waited(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unparsable_headers_reject_with_diagnostics() {
    let recorder = Recorder::default();
    let waiter = primed(HeaderLimitConfig::default(), &recorder).await;
    waiter.update(headers("5", "lots", "1714564860"));

    let err = waiter.check().await.unwrap_err();

    match err.kind() {
        HeaderErrorKind::CorruptHeaders {
            remaining_header,
            reset_unit,
            headers,
            ..
        } => {
            assert_eq!(remaining_header, "x-ratelimit-remaining");
            assert_eq!(reset_unit, "unix-s");
            let headers = headers.as_ref().expect("Raw headers are attached");
            assert_eq!(headers["x-ratelimit-remaining"], "lots");
        }
    }
    assert!(recorder.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_headers_reject_until_fresh_update() {
    let recorder = Recorder::default();
    let waiter = primed(HeaderLimitConfig::default(), &recorder).await;

    // Never updated: nothing to pace with.
    assert!(waiter.check().await.is_err());

    waiter.update([("content-type", "application/json")]);
    assert!(waiter.check().await.is_err());

    waiter.update(headers("5", "4", "1714564860"));
    assert_eq!(waiter.check().await.unwrap().remaining, Some(4));
}

#[tokio::test(start_paused = true)]
async fn test_custom_header_names_and_case_insensitive_lookup() {
    let recorder = Recorder::default();
    let config = HeaderLimitConfig::builder()
        .limit_header("RateLimit-Limit")
        .remaining_header("RateLimit-Remaining")
        .reset_header("RateLimit-Reset")
        .reset_unit(ResetUnit::Seconds)
        .build();
    let waiter = primed(config, &recorder).await;
    waiter.update([
        ("ratelimit-limit", "100"),
        ("RATELIMIT-REMAINING", "0"),
        ("ratelimit-reset", "4"),
    ]);
    let started = Instant::now();

    let snapshot = waiter.check().await.unwrap();

    assert_eq!(snapshot.limit, Some(100));
    assert_eq!(started.elapsed(), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_blank_header_names_fall_back_to_defaults() {
    let config = HeaderLimitConfig::builder().limit_header("  ").build();
    let waiter = HeaderWaiter::new(config);
    assert_eq!(waiter.config().limit_header(), "x-ratelimit-limit");
}

#[tokio::test(start_paused = true)]
async fn test_test_mode_caps_reset_wait() {
    let recorder = Recorder::default();
    let config = HeaderLimitConfig::builder().test_mode(true).build();
    let waiter = primed(config, &recorder).await;
    waiter.update(headers("5", "0", &(NOW_SECS + 600).to_string()));
    let started = Instant::now();

    waiter.check().await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_system_clock_reset_three_seconds_out() {
    let waiter = HeaderWaiter::new(HeaderLimitConfig::default());
    waiter.check().await.unwrap();
    let reset = Utc::now().timestamp() + 3;
    waiter.update(headers("5", "0", &reset.to_string()));
    let started = Instant::now();

    let snapshot = waiter.check().await.unwrap();

    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(2) && waited <= Duration::from_secs(3));
    assert_eq!(snapshot.reset, Some(reset));
}
