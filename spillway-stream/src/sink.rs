// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use parking_lot::Mutex;
use spillway_core::{warn, Prefetch, SpillwayError, Subscriber, Subscription};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type ErrorFn = Box<dyn FnOnce(SpillwayError) + Send>;
type CompleteFn = Box<dyn FnOnce() + Send>;

/// Terminal subscriber invoking callbacks.
///
/// Requests `batch` on subscription (or the prefetch, when one was set) and
/// requests `batch` more each time `batch` elements were consumed. A batch of
/// `u64::MAX` requests everything once; a batch of zero is treated as one.
///
/// ```rust
/// use spillway_core::Publisher;
/// use spillway_runtime::SyncDispatcher;
/// use spillway_stream::{CallbackSink, IterSource};
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let log = seen.clone();
/// let sink = Arc::new(CallbackSink::new(2, move |x: i32| log.lock().unwrap().push(x)));
///
/// IterSource::new(Arc::new(SyncDispatcher::new("main")), 1..=5).subscribe(sink);
///
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
/// ```
pub struct CallbackSink<T> {
    batch: u64,
    prefetch: AtomicU64,
    consumed: AtomicU64,
    subscription: Mutex<Option<Arc<dyn Subscription>>>,
    on_next: Mutex<NextFn<T>>,
    on_error: Mutex<Option<ErrorFn>>,
    on_complete: Mutex<Option<CompleteFn>>,
}

impl<T> CallbackSink<T> {
    pub fn new<F>(batch: u64, on_next: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        Self {
            batch: batch.max(1),
            prefetch: AtomicU64::new(0),
            consumed: AtomicU64::new(0),
            subscription: Mutex::new(None),
            on_next: Mutex::new(Box::new(on_next)),
            on_error: Mutex::new(None),
            on_complete: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn on_error<F>(self, on_error: F) -> Self
    where
        F: FnOnce(SpillwayError) + Send + 'static,
    {
        *self.on_error.lock() = Some(Box::new(on_error));
        self
    }

    #[must_use]
    pub fn on_complete<F>(self, on_complete: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        *self.on_complete.lock() = Some(Box::new(on_complete));
        self
    }

    /// Number of elements received so far.
    pub fn consumed(&self) -> u64 {
        self.consumed.load(Ordering::SeqCst)
    }

    pub fn request(&self, n: u64) {
        let subscription = self.subscription.lock().clone();
        if let Some(subscription) = subscription {
            subscription.request(n);
        }
    }

    pub fn cancel(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.cancel();
        }
    }
}

impl<T: Send> Subscriber<T> for CallbackSink<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        {
            let mut current = self.subscription.lock();
            if current.is_some() {
                drop(current);
                warn!("callback sink: rejecting additional subscription");
                subscription.cancel();
                return;
            }
            *current = Some(Arc::clone(&subscription));
        }

        let initial = match self.prefetch.load(Ordering::SeqCst) {
            0 => self.batch,
            prefetch => prefetch,
        };
        subscription.request(initial);
    }

    fn on_next(&self, value: T) {
        (self.on_next.lock())(value);
        let consumed = self.consumed.fetch_add(1, Ordering::SeqCst) + 1;
        if self.batch != u64::MAX && consumed % self.batch == 0 {
            self.request(self.batch);
        }
    }

    fn on_error(&self, error: SpillwayError) {
        self.subscription.lock().take();
        match self.on_error.lock().take() {
            Some(callback) => callback(error),
            None => warn!("callback sink: unhandled error: {}", error),
        }
    }

    fn on_complete(&self) {
        self.subscription.lock().take();
        if let Some(callback) = self.on_complete.lock().take() {
            callback();
        }
    }
}

impl<T> Prefetch for CallbackSink<T> {
    fn prefetch(&self, elements: u64) {
        self.prefetch.store(elements, Ordering::SeqCst);
    }
}
