// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::parallel::ParallelStage;
use spillway_core::{
    debug, CreditSubscription, Dispatcher, Publisher, RequestHandler, SpillwayError, StageConfig,
    StageCore, Subscriber,
};
use std::fmt::{self, Display};
use std::sync::{Arc, Weak};

/// One branch of a [`ParallelStage`].
///
/// Elements routed to the worker are emitted on the worker's own dispatcher,
/// which is what runs the branches in parallel. Bind downstream stages to
/// [`dispatcher()`](Self::dispatcher) to keep a branch on one context.
///
/// Requests made on the worker's subscription are credited to the worker and
/// reported to the owner for aggregation. Canceling the subscription clears the
/// worker's slot: elements routed to it afterwards are dropped, and later
/// requests are no longer reported.
pub struct ParallelWorker<T> {
    this: Weak<Self>,
    core: StageCore<T>,
    owner: Weak<ParallelStage<T>>,
    index: usize,
    pool_size: usize,
}

impl<T: Send + 'static> ParallelWorker<T> {
    pub(crate) fn new(
        owner: Weak<ParallelStage<T>>,
        dispatcher: Arc<dyn Dispatcher>,
        config: &StageConfig,
        index: usize,
        pool_size: usize,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            core: StageCore::new("parallel", dispatcher, config),
            owner,
            index,
            pool_size,
        })
    }

    /// Slot of this worker in its owner's pool.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        self.core.dispatcher()
    }

    /// Per-worker share of the owner's prefetch, if one was set.
    pub fn capacity(&self) -> Option<u64> {
        self.core.capacity()
    }

    /// Whether this worker's subscriber canceled.
    pub fn is_cancelled(&self) -> bool {
        self.core.is_cancelled()
    }

    /// Elements held until the worker's subscriber grants credit.
    pub fn backlog_len(&self) -> usize {
        self.core.backlog_len()
    }

    pub(crate) fn prefetch(&self, elements: u64) {
        self.core.prefetch(elements);
    }

    /// Emit `value` on this worker's dispatcher. A broadcast failure fails this
    /// worker only.
    pub(crate) fn route(&self, value: T) {
        self.core.schedule(&self.this, move |worker| {
            if let Err(error) = worker.core.broadcast_next(value) {
                debug!("{}: routing failed: {}", worker, error);
                worker
                    .core
                    .broadcast_error(SpillwayError::routing_failure(worker.index, error));
            }
        });
    }

    pub(crate) fn route_error(&self, error: SpillwayError) {
        self.core
            .schedule(&self.this, move |worker| worker.core.broadcast_error(error));
    }

    pub(crate) fn route_complete(&self) {
        self.core
            .schedule(&self.this, |worker| worker.core.broadcast_complete());
    }
}

impl<T: Send + 'static> Publisher<T> for ParallelWorker<T> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        let target: Weak<dyn RequestHandler> = self.this.clone();
        self.core.schedule(&self.this, move |worker| {
            worker
                .core
                .attach(subscriber, CreditSubscription::shared(target));
        });
    }
}

impl<T: Send + 'static> RequestHandler for ParallelWorker<T> {
    fn on_downstream_request(&self, n: u64) {
        if self.core.is_cancelled() {
            debug!("{}: request({}) after cancel ignored", self, n);
            return;
        }
        if n == 0 {
            self.core
                .schedule(&self.this, |worker| {
                    worker.core.accept_demand(0);
                });
            return;
        }

        self.core
            .schedule(&self.this, move |worker| worker.core.add_credit(n));
        if let Some(owner) = self.owner.upgrade() {
            owner.on_request(n);
        }
    }

    fn on_downstream_cancel(&self) {
        if self.core.cancel() {
            debug!("{}: canceled, clearing slot", self);
            if let Some(owner) = self.owner.upgrade() {
                owner.clear_slot(self.index);
            }
        }
    }
}

impl<T> Display for ParallelWorker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", self.core.name(), self.index + 1, self.pool_size)
    }
}
