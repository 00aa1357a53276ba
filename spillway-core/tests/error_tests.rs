// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use spillway_core::SpillwayError;
use spillway_test_utils::TestError;
use std::error::Error;

#[test]
fn test_invalid_configuration_display() {
    let error = SpillwayError::invalid_configuration("pool size must be positive");
    assert_eq!(
        error.to_string(),
        "Invalid configuration: pool size must be positive"
    );
}

#[test]
fn test_routing_failure_keeps_index_and_source() {
    let error = SpillwayError::routing_failure(2, SpillwayError::BacklogOverflow { limit: 4 });

    assert!(error.is_routing_failure());
    assert!(matches!(error, SpillwayError::RoutingFailure { index: 2, .. }));
    let source = error.source().map(ToString::to_string);
    assert_eq!(
        source.as_deref(),
        Some("Backlog overflow: more than 4 elements pending without demand")
    );
}

#[test]
fn test_aggregation_failure_wraps_not_subscribed() {
    let error = SpillwayError::aggregation_failure(SpillwayError::NotSubscribed);

    assert!(!error.is_routing_failure());
    assert_eq!(
        error.to_string(),
        "Demand aggregation failed: Stage has no upstream subscription"
    );
}

#[test]
fn test_fold_failure_exposes_user_error_as_source() {
    let error = SpillwayError::fold_failure(TestError::new("overflow"));

    let source = error.source().map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("injected failure: overflow"));
}

#[test]
fn test_clone_shares_user_error() {
    let error = SpillwayError::user_error(TestError::new("boom"));
    let cloned = error.clone();

    assert_eq!(error.to_string(), cloned.to_string());
}

#[test]
fn test_protocol_violations() {
    assert!(SpillwayError::InvalidDemand { requested: 0 }.is_protocol_violation());
    assert!(SpillwayError::AlreadySubscribed.is_protocol_violation());
    assert!(SpillwayError::NotSubscribed.is_protocol_violation());
    assert!(!SpillwayError::stream_error("x").is_protocol_violation());
    assert!(!SpillwayError::dispatch_rejected("sync-1").is_protocol_violation());
}
