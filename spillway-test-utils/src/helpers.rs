// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::test_subscriber::Event;
use futures::stream::StreamExt;
use futures::Stream;
use std::fmt::Debug;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Next item of `stream`, waiting at most `timeout_ms`.
///
/// # Panics
///
/// Panics if the stream ends or nothing arrives in time.
pub async fn unwrap_event<S>(stream: &mut S, timeout_ms: u64) -> S::Item
where
    S: Stream + Unpin,
{
    match timeout(Duration::from_millis(timeout_ms), stream.next()).await {
        Ok(Some(item)) => item,
        Ok(None) => panic!("stream ended while an item was expected"),
        Err(_) => panic!("no item within {timeout_ms}ms"),
    }
}

/// Next `Event::Next` value of an event stream.
///
/// # Panics
///
/// Panics if the next event is a terminal signal or nothing arrives in time.
pub async fn unwrap_value<S, T>(stream: &mut S, timeout_ms: u64) -> T
where
    S: Stream<Item = Event<T>> + Unpin,
    T: Debug,
{
    match unwrap_event(stream, timeout_ms).await {
        Event::Next(value) => value,
        other => panic!("expected a value, got {other:?}"),
    }
}

pub async fn assert_no_event<S>(stream: &mut S, timeout_ms: u64)
where
    S: Stream + Unpin,
    S::Item: Debug,
{
    tokio::select! {
        item = stream.next() => {
            if let Some(item) = item {
                panic!("Unexpected item emitted, expected no output: {item:?}");
            }
        }
        _ = sleep(Duration::from_millis(timeout_ms)) => {
        }
    }
}
