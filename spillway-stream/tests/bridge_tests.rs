// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::StreamExt;
use spillway_core::{SpillwayError, StreamItem};
use spillway_runtime::TokioDispatcher;
use spillway_stream::{into_stream, IterSource};
use spillway_test_utils::{assert_no_event, unwrap_event, TestPublisher};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn test_stream_yields_every_value_then_ends() -> anyhow::Result<()> {
    // Arrange
    let source = IterSource::new(Arc::new(TokioDispatcher::new("source")?), 1..=10);

    // Act
    let items: Vec<_> = timeout(
        Duration::from_secs(1),
        into_stream(&*source, 2).collect::<Vec<_>>(),
    )
    .await?;

    // Assert
    let values: Vec<i32> = items.into_iter().filter_map(StreamItem::ok).collect();
    assert_eq!(values, (1..=10).collect::<Vec<_>>());
    Ok(())
}

#[tokio::test]
async fn test_error_is_the_last_item() -> anyhow::Result<()> {
    // Arrange
    let upstream = TestPublisher::<i32>::new();
    let mut stream = into_stream(&*upstream, 4);

    // Act
    upstream.next(7);
    upstream.error(SpillwayError::stream_error("boom"));

    // Assert
    assert_eq!(unwrap_event(&mut stream, 500).await, StreamItem::Value(7));
    assert!(unwrap_event(&mut stream, 500).await.is_error());
    assert!(stream.next().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_each_yielded_value_requests_one_more() -> anyhow::Result<()> {
    // Arrange
    let upstream = TestPublisher::<&str>::new();
    let mut stream = into_stream(&*upstream, 4);
    upstream.next("a");
    upstream.next("b");

    // Act
    let first = unwrap_event(&mut stream, 500).await;
    let second = unwrap_event(&mut stream, 500).await;

    // Assert
    assert_eq!(first, StreamItem::Value("a"));
    assert_eq!(second, StreamItem::Value("b"));
    assert_eq!(upstream.requests(), vec![4, 1, 1]);
    assert_no_event(&mut stream, 50).await;
    Ok(())
}

#[tokio::test]
async fn test_dropping_the_stream_cancels() -> anyhow::Result<()> {
    // Arrange
    let upstream = TestPublisher::<i32>::new();
    let stream = into_stream(&*upstream, 1);

    // Act
    drop(stream);

    // Assert
    assert!(upstream.is_cancelled());
    assert!(!upstream.has_subscriber());
    Ok(())
}
