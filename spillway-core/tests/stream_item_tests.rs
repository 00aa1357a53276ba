// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use spillway_core::{SpillwayError, StreamItem};

#[test]
fn test_stream_item_value_accessors() {
    let item: StreamItem<i32> = StreamItem::Value(42);
    assert!(item.is_value());
    assert!(!item.is_error());
    assert_eq!(item.ok(), Some(42));
}

#[test]
fn test_stream_item_error_accessors() {
    let item: StreamItem<i32> = StreamItem::Error(SpillwayError::stream_error("test error"));
    assert!(item.is_error());
    assert!(!item.is_value());
    assert_eq!(item.ok(), None);
}

#[test]
fn test_stream_item_errors_never_equal() {
    let a: StreamItem<i32> = StreamItem::Error(SpillwayError::NotSubscribed);
    let b: StreamItem<i32> = StreamItem::Error(SpillwayError::NotSubscribed);
    assert_ne!(a, b);
    assert_eq!(StreamItem::Value(1), StreamItem::Value(1));
}

#[test]
fn test_stream_item_result_conversions() {
    let item: StreamItem<i32> = Ok(7).into();
    assert_eq!(item, StreamItem::Value(7));

    let result: Result<i32, SpillwayError> = StreamItem::Error(SpillwayError::NotSubscribed).into();
    assert!(matches!(result, Err(SpillwayError::NotSubscribed)));
}
