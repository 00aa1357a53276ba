// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and fixtures for the Spillway pipeline library.
//!
//! Designed for use in development and testing only, not for production code.
//!
//! # Key Types
//!
//! ## `TestPublisher<T>`
//!
//! A publisher driven by hand: the test pushes `next` / `error` / `complete`
//! signals and inspects the demand and cancellation it received.
//!
//! ## `TestSubscriber<T>`
//!
//! A subscriber recording every signal it receives. It can request credit up
//! front (directly or through `Prefetch`) and exposes its signals as an
//! `UnboundedReceiverStream` for runtime-backed tests:
//!
//! ```rust
//! use spillway_core::{Publisher, Subscriber};
//! use spillway_test_utils::{TestPublisher, TestSubscriber};
//!
//! let publisher = TestPublisher::<i32>::new();
//! let subscriber = TestSubscriber::<i32>::with_initial_request(2);
//!
//! publisher.subscribe(subscriber.clone());
//! assert_eq!(publisher.requests(), vec![2]);
//!
//! publisher.next(1);
//! publisher.next(2);
//! publisher.complete();
//!
//! assert_eq!(subscriber.values(), vec![1, 2]);
//! assert!(subscriber.is_completed());
//! ```
//!
//! ## Test Fixtures
//!
//! - `Person` - a person with a name and an age
//! - `test_data` - pre-defined people (`person_alice()`, ...)
//! - `TestError` - a user error to inject into folds and sources

pub mod helpers;
pub mod person;
pub mod test_data;
pub mod test_error;
pub mod test_publisher;
pub mod test_subscriber;

pub use self::helpers::{assert_no_event, unwrap_event, unwrap_value};
pub use self::person::Person;
pub use self::test_error::TestError;
pub use self::test_publisher::TestPublisher;
pub use self::test_subscriber::{Event, TestSubscriber};
