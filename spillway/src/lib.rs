// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # Spillway
//!
//! Push-based stream pipelines with credit backpressure.
//!
//! Every stage is a [`Publisher`] to its downstream and a [`Subscriber`] to
//! its upstream. Elements only flow against credit granted with
//! `Subscription::request`, and each stage runs its signals on its own
//! [`Dispatcher`], one task at a time.
//!
//! - [`ParallelStage`] routes elements round-robin to a fixed pool of
//!   [`ParallelWorker`]s, each on its own dispatcher, and folds their demand
//!   into upstream requests.
//! - [`ScanStage`] emits a running accumulator per input element.
//! - [`IterSource`], [`CallbackSink`] and [`into_stream`] connect pipelines to
//!   iterators, callbacks and `futures::Stream` consumers.
//!
//! ## Quick Start
//!
//! ```rust
//! use spillway::prelude::*;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! let main: Arc<dyn Dispatcher> = Arc::new(SyncDispatcher::new("main"));
//! let source = IterSource::new(main.clone(), 1..=6u64);
//! let parallel = source.parallel(main, &SyncDispatcher::factory(), 2).unwrap();
//!
//! let total = Arc::new(AtomicU64::new(0));
//! for worker in parallel.workers() {
//!     let total = total.clone();
//!     worker.for_each(u64::MAX, move |x| {
//!         total.fetch_add(x, Ordering::SeqCst);
//!     });
//! }
//!
//! assert_eq!(total.load(Ordering::SeqCst), 21);
//! ```

mod publisher_ext;

pub use self::publisher_ext::PublisherExt;

pub use spillway_core::{
    Dispatcher, DispatcherExt, DispatcherFactory, Prefetch, Publisher, Result, SpillwayError,
    StageConfig, StreamItem, Subscriber, Subscription,
};
pub use spillway_runtime::SyncDispatcher;
#[cfg(feature = "runtime-tokio")]
pub use spillway_runtime::TokioDispatcher;
pub use spillway_stream::{
    into_stream, CallbackSink, DemandAggregator, IterSource, ParallelStage, ParallelWorker,
    ScanStage, SubscriberStream,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::PublisherExt;
    pub use spillway_core::{
        Dispatcher, DispatcherFactory, Prefetch, Publisher, SpillwayError, StageConfig,
        StreamItem, Subscriber, Subscription,
    };
    pub use spillway_runtime::SyncDispatcher;
    #[cfg(feature = "runtime-tokio")]
    pub use spillway_runtime::TokioDispatcher;
    pub use spillway_stream::{
        CallbackSink, IterSource, ParallelStage, ParallelWorker, ScanStage, SubscriberStream,
    };
}
