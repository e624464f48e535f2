//! Tests for the FIFO call queue.

mod common;

use chrono::{TimeZone, Utc};
use common::Recorder;
use pacekeeper_error::QueueErrorKind;
use pacekeeper_rate_limit::{
    CallQueue, DrainState, ManualClock, ManualLimitConfig, ManualWaiter, WaitStarted,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

fn unbounded_queue() -> CallQueue {
    CallQueue::new(ManualWaiter::new(ManualLimitConfig::default()))
}

#[tokio::test(start_paused = true)]
async fn test_calls_run_in_enqueue_order() {
    let queue = unbounded_queue();
    let log = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (1..=5)
        .map(|n| {
            let log = Arc::clone(&log);
            queue.enqueue(move || async move {
                // Later calls finish faster; order must still hold.
                tokio::time::sleep(Duration::from_millis(100 - n * 10)).await;
                log.lock().push(n);
                n
            })
        })
        .collect();

    for (expected, handle) in (1..=5).zip(handles) {
        assert_eq!(handle.await.unwrap(), expected);
    }
    assert_eq!(*log.lock(), vec![1, 2, 3, 4, 5]);
}

#[tokio::test(start_paused = true)]
async fn test_calls_enqueued_mid_drain_join_the_same_loop() {
    let queue = unbounded_queue();
    let log = Arc::new(Mutex::new(Vec::new()));

    let push = |n: u32| {
        let log = Arc::clone(&log);
        move || async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            log.lock().push(n);
        }
    };

    let first = queue.enqueue(push(1));
    let second = queue.enqueue(push(2));
    assert!(queue.is_draining());

    // Let the first call start, then add more behind it.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(queue.state(), DrainState::Draining);
    let third = queue.enqueue(push(3));
    let fourth = queue.enqueue(push(4));

    first.await.unwrap();
    second.await.unwrap();
    third.await.unwrap();
    fourth.await.unwrap();

    assert_eq!(*log.lock(), vec![1, 2, 3, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_queue_returns_to_idle_and_restarts() {
    let queue = unbounded_queue();

    assert_eq!(queue.state(), DrainState::Idle);
    assert_eq!(queue.run(|| async { 1 }).await.unwrap(), 1);

    // The drain loop exits after delivering the last result.
    tokio::task::yield_now().await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(queue.state(), DrainState::Idle);
    assert_eq!(queue.pending(), 0);

    assert_eq!(queue.run(|| async { 2 }).await.unwrap(), 2);
    assert_eq!(queue.counts().total_calls, 2);
}

#[tokio::test(start_paused = true)]
async fn test_queue_paces_through_waiter() {
    let recorder = Recorder::default();
    let waiter = ManualWaiter::new(ManualLimitConfig::builder().minutely_limit(2).build())
        .with_clock(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 55).unwrap(),
        ))
        .with_observer(recorder.clone());
    let queue = CallQueue::new(waiter);
    let started = tokio::time::Instant::now();

    let handles: Vec<_> = (0..4).map(|n| queue.enqueue(move || async move { n })).collect();
    for handle in handles {
        handle.await.unwrap();
    }

    // Third call waits out the minute (5s); the fourth fits the new window.
    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert_eq!(recorder.starts().len(), 1);
    assert!(matches!(
        recorder.starts()[0],
        WaitStarted::MinuteQuota {
            seconds_to_wait: 5,
            ..
        }
    ));

    let end = recorder.ends()[0];
    assert_eq!(end.queue_depth, Some(1), "The fourth call is still queued");
    assert_eq!(end.total_calls, Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_panicking_call_does_not_stall_the_queue() {
    let queue = unbounded_queue();

    let doomed = queue.enqueue(|| async {
        panic!("call blew up");
    });
    let survivor = queue.enqueue(|| async { "still runs" });

    let err = doomed.await.map(|_: ()| ()).unwrap_err();
    assert_eq!(err.kind(), &QueueErrorKind::Dropped);
    assert_eq!(survivor.await.unwrap(), "still runs");
}
