// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use parking_lot::Mutex;
use spillway_core::{
    CancelledSubscription, CreditSubscription, Publisher, RequestHandler, SpillwayError,
    Subscriber,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Publisher driven by the test.
///
/// Signals are pushed synchronously to the subscriber regardless of credit, so
/// tests can exercise what a stage does with them; the demand the subscriber
/// issues is recorded for inspection.
pub struct TestPublisher<T> {
    this: Weak<Self>,
    subscriber: Mutex<Option<Arc<dyn Subscriber<T>>>>,
    requests: Mutex<Vec<u64>>,
    cancelled: AtomicBool,
}

impl<T: Send + 'static> TestPublisher<T> {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            subscriber: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            cancelled: AtomicBool::new(false),
        })
    }

    fn current(&self) -> Option<Arc<dyn Subscriber<T>>> {
        self.subscriber.lock().clone()
    }

    pub fn next(&self, value: T) {
        if let Some(subscriber) = self.current() {
            subscriber.on_next(value);
        }
    }

    pub fn error(&self, error: SpillwayError) {
        if let Some(subscriber) = self.subscriber.lock().take() {
            subscriber.on_error(error);
        }
    }

    pub fn complete(&self) {
        if let Some(subscriber) = self.subscriber.lock().take() {
            subscriber.on_complete();
        }
    }

    /// Every `request(n)` received, in order.
    pub fn requests(&self) -> Vec<u64> {
        self.requests.lock().clone()
    }

    pub fn total_requested(&self) -> u64 {
        self.requests
            .lock()
            .iter()
            .fold(0u64, |total, n| total.saturating_add(*n))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn has_subscriber(&self) -> bool {
        self.subscriber.lock().is_some()
    }
}

impl<T: Send + 'static> Publisher<T> for TestPublisher<T> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        let accepted = {
            let mut current = self.subscriber.lock();
            if current.is_some() {
                false
            } else {
                *current = Some(Arc::clone(&subscriber));
                true
            }
        };

        if accepted {
            let target: Weak<dyn RequestHandler> = self.this.clone();
            subscriber.on_subscribe(CreditSubscription::shared(target));
        } else {
            subscriber.on_subscribe(CancelledSubscription::shared());
            subscriber.on_error(SpillwayError::AlreadySubscribed);
        }
    }
}

impl<T: Send + 'static> RequestHandler for TestPublisher<T> {
    fn on_downstream_request(&self, n: u64) {
        self.requests.lock().push(n);
    }

    fn on_downstream_cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.subscriber.lock().take();
    }
}
