// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use parking_lot::Mutex;
use spillway_core::{Prefetch, SpillwayError, Subscriber, Subscription};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;

/// A signal observed by a [`TestSubscriber`].
#[derive(Debug, Clone)]
pub enum Event<T> {
    Next(T),
    Error(SpillwayError),
    Complete,
}

impl<T> Event<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            Event::Next(value) => Some(value),
            _ => None,
        }
    }
}

struct Record<T> {
    values: Vec<T>,
    errors: Vec<SpillwayError>,
    completions: usize,
    subscriptions: usize,
}

/// Subscriber that records every signal and forwards it to an event stream.
pub struct TestSubscriber<T> {
    initial_request: AtomicU64,
    subscription: Mutex<Option<Arc<dyn Subscription>>>,
    record: Mutex<Record<T>>,
    sender: UnboundedSender<Event<T>>,
    receiver: Mutex<Option<UnboundedReceiver<Event<T>>>>,
}

impl<T: Clone + Send + 'static> TestSubscriber<T> {
    /// A subscriber that requests nothing until told to.
    pub fn new() -> Arc<Self> {
        Self::with_initial_request(0)
    }

    /// A subscriber that requests `n` as soon as it is subscribed.
    pub fn with_initial_request(n: u64) -> Arc<Self> {
        let (sender, receiver) = unbounded_channel();
        Arc::new(Self {
            initial_request: AtomicU64::new(n),
            subscription: Mutex::new(None),
            record: Mutex::new(Record {
                values: Vec::new(),
                errors: Vec::new(),
                completions: 0,
                subscriptions: 0,
            }),
            sender,
            receiver: Mutex::new(Some(receiver)),
        })
    }

    /// A subscriber granting unbounded credit.
    pub fn unbounded() -> Arc<Self> {
        Self::with_initial_request(u64::MAX)
    }

    pub fn request(&self, n: u64) {
        let subscription = self.subscription.lock().clone();
        if let Some(subscription) = subscription {
            subscription.request(n);
        }
    }

    pub fn cancel(&self) {
        let subscription = self.subscription.lock().clone();
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
    }

    /// Signals received so far as a stream. Can be taken once.
    ///
    /// # Panics
    ///
    /// Panics when called a second time.
    pub fn events(&self) -> UnboundedReceiverStream<Event<T>> {
        let receiver = self
            .receiver
            .lock()
            .take()
            .expect("events() can only be taken once");
        UnboundedReceiverStream::new(receiver)
    }

    pub fn values(&self) -> Vec<T> {
        self.record.lock().values.clone()
    }

    pub fn errors(&self) -> Vec<SpillwayError> {
        self.record.lock().errors.clone()
    }

    pub fn is_completed(&self) -> bool {
        self.record.lock().completions > 0
    }

    pub fn completions(&self) -> usize {
        self.record.lock().completions
    }

    pub fn subscriptions(&self) -> usize {
        self.record.lock().subscriptions
    }

    pub fn is_terminated(&self) -> bool {
        let record = self.record.lock();
        record.completions > 0 || !record.errors.is_empty()
    }
}

impl<T: Clone + Send + 'static> Subscriber<T> for TestSubscriber<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        *self.subscription.lock() = Some(Arc::clone(&subscription));
        self.record.lock().subscriptions += 1;
        let initial = self.initial_request.load(Ordering::SeqCst);
        if initial > 0 {
            subscription.request(initial);
        }
    }

    fn on_next(&self, value: T) {
        self.record.lock().values.push(value.clone());
        let _ = self.sender.send(Event::Next(value));
    }

    fn on_error(&self, error: SpillwayError) {
        self.record.lock().errors.push(error.clone());
        let _ = self.sender.send(Event::Error(error));
    }

    fn on_complete(&self) {
        self.record.lock().completions += 1;
        let _ = self.sender.send(Event::Complete);
    }
}

impl<T> Prefetch for TestSubscriber<T> {
    fn prefetch(&self, elements: u64) {
        self.initial_request.store(elements, Ordering::SeqCst);
    }
}
