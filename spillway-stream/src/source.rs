// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use parking_lot::Mutex;
use spillway_core::{
    CreditSubscription, Dispatcher, Publisher, RequestHandler, StageConfig, StageCore, Subscriber,
};
use std::fmt::{self, Display};
use std::iter::Peekable;
use std::sync::{Arc, Weak};

/// Publisher emitting the items of an iterator under credit.
///
/// Items are pulled on the source's dispatcher, never more than requested. The
/// source completes as soon as the iterator is exhausted, including right after
/// subscription when it is empty. Subscription itself is synchronous: the
/// subscriber's `on_subscribe` runs before `subscribe` returns.
pub struct IterSource<I: Iterator> {
    this: Weak<Self>,
    core: StageCore<I::Item>,
    items: Mutex<Peekable<I>>,
}

impl<I> IterSource<I>
where
    I: Iterator + Send + 'static,
    I::Item: Send + 'static,
{
    pub fn new<C>(dispatcher: Arc<dyn Dispatcher>, items: C) -> Arc<Self>
    where
        C: IntoIterator<IntoIter = I>,
    {
        Self::with_config(dispatcher, &StageConfig::new(), items)
    }

    pub fn with_config<C>(dispatcher: Arc<dyn Dispatcher>, config: &StageConfig, items: C) -> Arc<Self>
    where
        C: IntoIterator<IntoIter = I>,
    {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            core: StageCore::new("source", dispatcher, config),
            items: Mutex::new(items.into_iter().peekable()),
        })
    }

    fn is_exhausted(&self) -> bool {
        self.items.lock().peek().is_none()
    }

    fn emit(&self, n: u64) {
        self.core.add_credit(n);
        while self.core.has_credit() && !self.core.is_terminated() {
            let Some(item) = self.items.lock().next() else {
                break;
            };
            if let Err(error) = self.core.broadcast_next(item) {
                self.core.broadcast_error(error);
                return;
            }
        }
        if self.is_exhausted() {
            self.core.broadcast_complete();
        }
    }
}

impl<I> Publisher<I::Item> for IterSource<I>
where
    I: Iterator + Send + 'static,
    I::Item: Send + 'static,
{
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<I::Item>>) {
        let target: Weak<dyn RequestHandler> = self.this.clone();
        self.core
            .attach(subscriber, CreditSubscription::shared(target));
        if self.is_exhausted() {
            self.core.broadcast_complete();
        }
    }
}

impl<I> RequestHandler for IterSource<I>
where
    I: Iterator + Send + 'static,
    I::Item: Send + 'static,
{
    fn on_downstream_request(&self, n: u64) {
        self.core.schedule(&self.this, move |source| {
            if source.core.accept_demand(n) {
                source.emit(n);
            }
        });
    }

    fn on_downstream_cancel(&self) {
        self.core.cancel();
    }
}

impl<I: Iterator> Display for IterSource<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.core.name())
    }
}
