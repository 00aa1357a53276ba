// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use parking_lot::Mutex;
use spillway_core::{
    CancelledSubscription, SpillwayError, StageConfig, StageCore, Subscription,
};
use spillway_runtime::SyncDispatcher;
use spillway_test_utils::TestSubscriber;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct RecordingSubscription {
    requests: Mutex<Vec<u64>>,
    cancelled: AtomicBool,
}

impl Subscription for RecordingSubscription {
    fn request(&self, n: u64) {
        self.requests.lock().push(n);
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

fn core_with(config: StageConfig) -> StageCore<i32> {
    StageCore::new("core", Arc::new(SyncDispatcher::new("test")), &config)
}

fn attached(core: &StageCore<i32>) -> Arc<TestSubscriber<i32>> {
    let subscriber = TestSubscriber::new();
    core.attach(subscriber.clone(), CancelledSubscription::shared());
    subscriber
}

#[test]
fn test_elements_wait_for_credit_in_order() {
    // Arrange
    let core = core_with(StageConfig::new());
    let subscriber = attached(&core);

    // Act
    for i in 1..=3 {
        core.broadcast_next(i).expect("no backlog limit");
    }
    core.add_credit(2);

    // Assert
    assert_eq!(subscriber.values(), vec![1, 2]);
    assert_eq!(core.backlog_len(), 1);
    assert_eq!(core.credit(), 0);
}

#[test]
fn test_elements_broadcast_before_attach_are_delivered() {
    // Arrange
    let core = core_with(StageConfig::new());
    core.broadcast_next(10).expect("no backlog limit");
    core.broadcast_next(20).expect("no backlog limit");

    // Act
    let subscriber = attached(&core);
    core.add_credit(5);
    core.broadcast_next(30).expect("no backlog limit");

    // Assert
    assert_eq!(subscriber.values(), vec![10, 20, 30]);
    assert_eq!(core.credit(), 2);
}

#[test]
fn test_completion_waits_for_backlog_to_drain() {
    // Arrange
    let core = core_with(StageConfig::new());
    let subscriber = attached(&core);
    core.broadcast_next(1).expect("no backlog limit");

    // Act
    core.broadcast_complete();

    // Assert
    assert!(!subscriber.is_completed());
    core.add_credit(1);
    assert_eq!(subscriber.values(), vec![1]);
    assert_eq!(subscriber.completions(), 1);
    assert!(core.is_terminated());
}

#[test]
fn test_error_discards_backlog_and_is_delivered_once() {
    // Arrange
    let core = core_with(StageConfig::new());
    let subscriber = attached(&core);
    core.broadcast_next(1).expect("no backlog limit");

    // Act
    core.broadcast_error(SpillwayError::stream_error("first"));
    core.broadcast_error(SpillwayError::stream_error("second"));
    core.add_credit(1);

    // Assert
    assert!(subscriber.values().is_empty());
    assert_eq!(subscriber.errors().len(), 1);
    assert_eq!(core.backlog_len(), 0);
}

#[test]
fn test_values_after_completion_are_dropped() {
    // Arrange
    let core = core_with(StageConfig::new());
    let subscriber = attached(&core);
    core.add_credit(10);
    core.broadcast_complete();

    // Act
    let result = core.broadcast_next(99);

    // Assert
    assert!(result.is_ok());
    assert!(subscriber.values().is_empty());
    assert_eq!(subscriber.completions(), 1);
}

#[test]
fn test_backlog_limit_overflows() {
    // Arrange
    let core = core_with(StageConfig::new().with_backlog_limit(2));
    let _subscriber = attached(&core);
    core.broadcast_next(1).expect("below limit");
    core.broadcast_next(2).expect("at limit");

    // Act
    let result = core.broadcast_next(3);

    // Assert
    assert!(matches!(
        result,
        Err(SpillwayError::BacklogOverflow { limit: 2 })
    ));
    assert_eq!(core.backlog_len(), 2);
}

#[test]
fn test_unbounded_credit_is_never_consumed() {
    // Arrange
    let core = core_with(StageConfig::new());
    let subscriber = attached(&core);
    core.add_credit(u64::MAX);

    // Act
    for i in 0..100 {
        core.broadcast_next(i).expect("credit available");
    }
    core.add_credit(5);

    // Assert
    assert_eq!(subscriber.values().len(), 100);
    assert_eq!(core.credit(), u64::MAX);
}

#[test]
fn test_second_subscriber_is_rejected() {
    // Arrange
    let core = core_with(StageConfig::new());
    let first = attached(&core);

    // Act
    let second = attached(&core);

    // Assert
    assert_eq!(first.subscriptions(), 1);
    assert!(first.errors().is_empty());
    assert_eq!(second.subscriptions(), 1);
    assert!(matches!(
        second.errors().as_slice(),
        [SpillwayError::AlreadySubscribed]
    ));
}

#[test]
fn test_late_subscriber_receives_terminal_signal() {
    // Arrange
    let core = core_with(StageConfig::new());
    core.broadcast_complete();

    // Act
    let subscriber = attached(&core);

    // Assert
    assert_eq!(subscriber.subscriptions(), 1);
    assert!(subscriber.is_completed());
}

#[test]
fn test_cancel_is_idempotent_and_stops_emission() {
    // Arrange
    let core = core_with(StageConfig::new());
    let subscriber = attached(&core);
    core.add_credit(10);

    // Act
    let first = core.cancel();
    let second = core.cancel();
    core.broadcast_next(1).expect("dropped silently");

    // Assert
    assert!(first);
    assert!(!second);
    assert!(core.is_cancelled());
    assert!(subscriber.values().is_empty());
}

#[test]
fn test_demand_before_subscription_is_deferred() {
    // Arrange
    let core = core_with(StageConfig::new());
    let upstream = Arc::new(RecordingSubscription::default());

    // Act
    core.request_upstream(3);
    core.request_upstream(4);
    let accepted = core.on_subscribe(upstream.clone());
    core.request_upstream(1);

    // Assert
    assert!(accepted);
    assert_eq!(*upstream.requests.lock(), vec![7, 1]);
}

#[test]
fn test_second_upstream_subscription_is_cancelled() {
    // Arrange
    let core = core_with(StageConfig::new());
    let first = Arc::new(RecordingSubscription::default());
    let second = Arc::new(RecordingSubscription::default());
    core.on_subscribe(first.clone());

    // Act
    let accepted = core.on_subscribe(second.clone());

    // Assert
    assert!(!accepted);
    assert!(second.cancelled.load(Ordering::SeqCst));
    assert!(!first.cancelled.load(Ordering::SeqCst));
}

#[test]
fn test_prefetch_is_requested_on_demand() {
    // Arrange
    let core = core_with(StageConfig::new());
    let upstream = Arc::new(RecordingSubscription::default());
    core.on_subscribe(upstream.clone());
    core.prefetch(16);

    // Act
    core.request_prefetch();

    // Assert
    assert_eq!(core.capacity(), Some(16));
    assert_eq!(*upstream.requests.lock(), vec![16]);
}

#[test]
fn test_fail_cancels_upstream_then_errors_downstream() {
    // Arrange
    let core = core_with(StageConfig::new());
    let upstream = Arc::new(RecordingSubscription::default());
    core.on_subscribe(upstream.clone());
    let subscriber = attached(&core);

    // Act
    core.fail(SpillwayError::stream_error("broken"));
    core.request_upstream(1);

    // Assert
    assert!(upstream.cancelled.load(Ordering::SeqCst));
    assert!(upstream.requests.lock().is_empty());
    assert!(core.subscription().is_none());
    assert_eq!(subscriber.errors().len(), 1);
}

#[test]
fn test_schedule_skips_dropped_stage() {
    // Arrange
    let core = core_with(StageConfig::new());
    let stage = Arc::new(AtomicBool::new(false));
    let weak = Arc::downgrade(&stage);
    let ran = Arc::new(AtomicBool::new(false));

    // Act
    drop(stage);
    let ran_in_task = ran.clone();
    core.schedule(&weak, move |_stage: &AtomicBool| {
        ran_in_task.store(true, Ordering::SeqCst);
    });

    // Assert
    assert!(!ran.load(Ordering::SeqCst));
}
