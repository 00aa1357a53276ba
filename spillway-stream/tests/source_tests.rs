// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use spillway_core::{Publisher, SpillwayError, StageConfig};
use spillway_runtime::SyncDispatcher;
use spillway_stream::IterSource;
use spillway_test_utils::TestSubscriber;
use std::sync::Arc;

#[test]
fn test_emits_no_more_than_requested() {
    // Arrange
    let source = IterSource::new(Arc::new(SyncDispatcher::new("source")), 1..=5);
    let subscriber = TestSubscriber::with_initial_request(2);

    // Act
    source.subscribe(subscriber.clone());

    // Assert
    assert_eq!(subscriber.values(), vec![1, 2]);
    assert!(!subscriber.is_completed());

    // Act
    subscriber.request(10);

    // Assert
    assert_eq!(subscriber.values(), vec![1, 2, 3, 4, 5]);
    assert_eq!(subscriber.completions(), 1);
}

#[test]
fn test_empty_source_completes_on_subscribe() {
    // Arrange
    let source = IterSource::new(Arc::new(SyncDispatcher::new("source")), Vec::<i32>::new());
    let subscriber = TestSubscriber::new();

    // Act
    source.subscribe(subscriber.clone());

    // Assert
    assert_eq!(subscriber.subscriptions(), 1);
    assert!(subscriber.values().is_empty());
    assert!(subscriber.is_completed());
}

#[test]
fn test_completes_as_soon_as_exhausted() {
    // Arrange
    let source = IterSource::new(Arc::new(SyncDispatcher::new("source")), vec!["a", "b", "c"]);
    let subscriber = TestSubscriber::with_initial_request(3);

    // Act
    source.subscribe(subscriber.clone());

    // Assert
    assert_eq!(subscriber.values(), vec!["a", "b", "c"]);
    assert!(subscriber.is_completed());
}

#[test]
fn test_infinite_source_honours_credit() {
    // Arrange
    let source = IterSource::new(Arc::new(SyncDispatcher::new("source")), 0u64..);
    let subscriber = TestSubscriber::with_initial_request(4);

    // Act
    source.subscribe(subscriber.clone());
    subscriber.request(1);

    // Assert
    assert_eq!(subscriber.values(), vec![0, 1, 2, 3, 4]);
    assert!(!subscriber.is_terminated());
}

#[test]
fn test_zero_request_fails_the_subscriber() {
    // Arrange
    let source = IterSource::new(Arc::new(SyncDispatcher::new("source")), 1..=3);
    let subscriber = TestSubscriber::new();
    source.subscribe(subscriber.clone());

    // Act
    subscriber.request(0);

    // Assert
    assert!(matches!(
        subscriber.errors().as_slice(),
        [SpillwayError::InvalidDemand { requested: 0 }]
    ));
    assert!(subscriber.values().is_empty());
}

#[test]
fn test_second_subscriber_is_rejected() {
    // Arrange
    let source = IterSource::with_config(
        Arc::new(SyncDispatcher::new("source")),
        &StageConfig::new().with_name("numbers"),
        1..=3,
    );
    let first = TestSubscriber::new();
    let second = TestSubscriber::unbounded();
    source.subscribe(first.clone());

    // Act
    source.subscribe(second.clone());

    // Assert
    assert!(matches!(
        second.errors().as_slice(),
        [SpillwayError::AlreadySubscribed]
    ));
    assert!(second.values().is_empty());
    assert_eq!(source.to_string(), "numbers");
}
