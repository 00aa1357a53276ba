// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Fluent wiring of stages onto any publisher.

use spillway_core::{Dispatcher, DispatcherFactory, Publisher, Result};
use spillway_stream::{CallbackSink, ParallelStage, ScanStage, SubscriberStream};
use std::error::Error;
use std::sync::Arc;

/// Extension trait subscribing new stages to `self` and returning them, so
/// pipelines read left to right.
///
/// # Examples
///
/// ```rust
/// use spillway::prelude::*;
/// use std::convert::Infallible;
/// use std::sync::Arc;
///
/// let main: Arc<dyn Dispatcher> = Arc::new(SyncDispatcher::new("main"));
/// let sums = IterSource::new(main.clone(), 1..=4).scan(
///     main,
///     || Ok::<_, Infallible>(0),
///     |x: i32, acc: Option<i32>| Ok::<_, Infallible>(acc.unwrap_or_default() + x),
/// );
///
/// let sink = sums.for_each(u64::MAX, |sum| println!("{sum}"));
/// assert_eq!(sink.consumed(), 4);
/// ```
pub trait PublisherExt<T: Send + 'static>: Publisher<T> {
    /// Folds every element into a seeded accumulator on `dispatcher`.
    fn scan<A, S, F, E>(
        &self,
        dispatcher: Arc<dyn Dispatcher>,
        seed: S,
        fold: F,
    ) -> Arc<ScanStage<T, A>>
    where
        A: Clone + Send + 'static,
        S: FnMut() -> std::result::Result<A, E> + Send + 'static,
        F: FnMut(T, Option<A>) -> std::result::Result<A, E> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        let stage = ScanStage::with_seed(dispatcher, seed, fold);
        self.subscribe(stage.clone());
        stage
    }

    /// Fans out into `pool_size` workers, each on a dispatcher from `workers`.
    ///
    /// # Errors
    ///
    /// Fails like [`ParallelStage::new`] when `pool_size` is zero.
    fn parallel<W>(
        &self,
        dispatcher: Arc<dyn Dispatcher>,
        workers: &W,
        pool_size: usize,
    ) -> Result<Arc<ParallelStage<T>>>
    where
        W: DispatcherFactory + ?Sized,
    {
        let stage = ParallelStage::new(dispatcher, workers, pool_size)?;
        self.subscribe(stage.clone());
        Ok(stage)
    }

    /// Consumes the elements with `on_next`, requesting `batch` at a time.
    fn for_each<F>(&self, batch: u64, on_next: F) -> Arc<CallbackSink<T>>
    where
        F: FnMut(T) + Send + 'static,
    {
        let sink = Arc::new(CallbackSink::new(batch, on_next));
        self.subscribe(sink.clone());
        sink
    }

    fn into_stream(&self, batch: u64) -> SubscriberStream<T> {
        SubscriberStream::new(self, batch)
    }
}

impl<T: Send + 'static, P: Publisher<T> + ?Sized> PublisherExt<T> for P {}
