// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Shared machinery behind every stage.
//!
//! A [`StageCore`] owns the two ends of a single-input, single-output stage:
//!
//! - **Upstream**: the subscription received in `on_subscribe`, the optional
//!   prefetch size, and demand issued before the subscription arrived.
//! - **Downstream**: the one attached subscriber, its outstanding credit, a FIFO
//!   backlog of elements broadcast without credit, and the terminal state.
//!
//! Stages compose a core and decide what their signals mean; the core provides
//! the default request bookkeeping (`add_credit`), the default upstream demand
//! (`request_upstream`) and the `broadcast_*` family.
//!
//! ## Threading
//!
//! `broadcast_*`, `add_credit` and `attach` are meant to run on the stage's own
//! dispatcher (see [`StageCore::schedule`]); that is what keeps emissions to the
//! subscriber ordered. Subscriber callbacks are always invoked with no lock held,
//! so a subscriber may call back into the stage synchronously.
//!
//! ## Example
//!
//! ```
//! use spillway_core::{StageConfig, StageCore, Dispatcher, Result, Task};
//! use std::sync::Arc;
//!
//! struct Inline;
//! impl Dispatcher for Inline {
//!     fn dispatch(&self, task: Task) -> Result<()> {
//!         task();
//!         Ok(())
//!     }
//!     fn shutdown(&self) {}
//!     fn name(&self) -> &str {
//!         "inline"
//!     }
//! }
//!
//! let core = StageCore::<i32>::new("demo", Arc::new(Inline), &StageConfig::new());
//!
//! // No subscriber yet: elements wait in the backlog.
//! core.broadcast_next(1).unwrap();
//! core.broadcast_next(2).unwrap();
//! assert_eq!(core.backlog_len(), 2);
//! ```

mod downstream;
mod upstream;

use crate::stage_core::downstream::{Downstream, Phase, Terminal};
use crate::stage_core::upstream::Upstream;
use crate::{
    CancelledSubscription, Dispatcher, Result, SpillwayError, StageConfig, Subscriber,
    Subscription,
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

enum Attach {
    Accepted,
    Rejected,
    Replay(Terminal),
}

/// Upstream/downstream bookkeeping of a single stage.
pub struct StageCore<O> {
    name: String,
    dispatcher: Arc<dyn Dispatcher>,
    backlog_limit: Option<usize>,
    capacity: Mutex<Option<u64>>,
    upstream: Mutex<Upstream>,
    downstream: Mutex<Downstream<O>>,
}

impl<O> StageCore<O> {
    /// Creates a core named after `config`, falling back to `default_name`.
    pub fn new(default_name: &str, dispatcher: Arc<dyn Dispatcher>, config: &StageConfig) -> Self {
        Self {
            name: config.name_or(default_name),
            dispatcher,
            backlog_limit: config.backlog_limit(),
            capacity: Mutex::new(None),
            upstream: Mutex::new(Upstream::default()),
            downstream: Mutex::new(Downstream::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }
}

impl<O: Send + 'static> StageCore<O> {
    /// Submit `task` to this stage's dispatcher, logging a rejection.
    pub fn dispatch(&self, task: impl FnOnce() + Send + 'static) {
        if let Err(error) = self.dispatcher.dispatch(Box::new(task)) {
            warn!("{}: task dropped: {}", self.name, error);
        }
    }

    /// Run `f` against the stage behind `this` on this stage's dispatcher.
    ///
    /// Does nothing if the stage has been dropped by the time the task runs.
    pub fn schedule<S, F>(&self, this: &Weak<S>, f: F)
    where
        S: Send + Sync + 'static,
        F: FnOnce(&S) + Send + 'static,
    {
        let this = Weak::clone(this);
        self.dispatch(move || {
            if let Some(stage) = this.upgrade() {
                f(&stage);
            }
        });
    }

    // ---------------------------------------------------------------- upstream

    /// Record the prefetch size. Requested upstream by [`request_prefetch`](Self::request_prefetch).
    pub fn prefetch(&self, elements: u64) {
        *self.capacity.lock() = Some(elements);
    }

    pub fn capacity(&self) -> Option<u64> {
        *self.capacity.lock()
    }

    /// Store the upstream subscription and flush demand deferred so far.
    ///
    /// Returns `false` (and cancels `subscription`) when the stage already has
    /// an upstream or has canceled it.
    pub fn on_subscribe(&self, subscription: Arc<dyn Subscription>) -> bool {
        let deferred = {
            let mut upstream = self.upstream.lock();
            if upstream.subscription.is_some() || upstream.cancelled {
                None
            } else {
                upstream.subscription = Some(Arc::clone(&subscription));
                Some(std::mem::take(&mut upstream.deferred))
            }
        };

        match deferred {
            None => {
                warn!("{}: rejecting additional upstream subscription", self.name);
                subscription.cancel();
                false
            }
            Some(0) => true,
            Some(n) => {
                subscription.request(n);
                true
            }
        }
    }

    /// The upstream subscription, if one has been received and not canceled.
    pub fn subscription(&self) -> Option<Arc<dyn Subscription>> {
        self.upstream.lock().subscription.clone()
    }

    /// Default `on_request`: forward `n` upstream, or defer it until subscribed.
    pub fn request_upstream(&self, n: u64) {
        let subscription = {
            let mut upstream = self.upstream.lock();
            if upstream.cancelled {
                return;
            }
            match &upstream.subscription {
                Some(subscription) => Arc::clone(subscription),
                None => {
                    upstream.deferred = upstream.deferred.saturating_add(n);
                    return;
                }
            }
        };
        subscription.request(n);
    }

    /// Request the prefetch size upstream, if one was set.
    pub fn request_prefetch(&self) {
        if let Some(capacity) = self.capacity().filter(|c| *c > 0) {
            self.request_upstream(capacity);
        }
    }

    pub fn cancel_upstream(&self) {
        let subscription = {
            let mut upstream = self.upstream.lock();
            upstream.cancelled = true;
            upstream.deferred = 0;
            upstream.subscription.take()
        };
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
    }

    // -------------------------------------------------------------- downstream

    /// Attach the single downstream subscriber.
    ///
    /// A second subscriber is refused with [`SpillwayError::AlreadySubscribed`];
    /// a subscriber arriving after termination receives the terminal signal.
    pub fn attach(&self, subscriber: Arc<dyn Subscriber<O>>, subscription: Arc<dyn Subscription>) {
        let outcome = {
            let mut downstream = self.downstream.lock();
            if downstream.attached {
                Attach::Rejected
            } else {
                downstream.attached = true;
                match (&downstream.phase, &downstream.terminal) {
                    (Phase::Terminated, Some(terminal)) => Attach::Replay(terminal.clone()),
                    _ => {
                        downstream.subscriber = Some(Arc::clone(&subscriber));
                        Attach::Accepted
                    }
                }
            }
        };

        match outcome {
            Attach::Accepted => subscriber.on_subscribe(subscription),
            Attach::Rejected => {
                warn!("{}: rejecting additional subscriber", self.name);
                subscriber.on_subscribe(CancelledSubscription::shared());
                subscriber.on_error(SpillwayError::AlreadySubscribed);
            }
            Attach::Replay(terminal) => {
                subscriber.on_subscribe(CancelledSubscription::shared());
                match terminal {
                    Terminal::Complete => subscriber.on_complete(),
                    Terminal::Error(error) => subscriber.on_error(error),
                }
            }
        }
    }

    /// Check a downstream `request(n)`. Zero demand fails the stage with
    /// [`SpillwayError::InvalidDemand`] and returns `false`.
    pub fn accept_demand(&self, n: u64) -> bool {
        if n == 0 {
            warn!("{}: rejecting request(0)", self.name);
            self.fail(SpillwayError::InvalidDemand { requested: n });
            return false;
        }
        true
    }

    /// Default request bookkeeping: grant `n` credit and drain the backlog.
    pub fn add_credit(&self, n: u64) {
        self.downstream.lock().grant(n);
        self.drain();
    }

    /// Emit as much of the backlog as credit allows, then a deferred completion.
    pub fn drain(&self) {
        loop {
            let mut downstream = self.downstream.lock();
            let Some(subscriber) = downstream.subscriber.clone() else {
                return;
            };

            if downstream.credit > 0 {
                if let Some(value) = downstream.backlog.pop_front() {
                    downstream.take_credit();
                    drop(downstream);
                    subscriber.on_next(value);
                    continue;
                }
            }

            if downstream.backlog.is_empty() && downstream.phase == Phase::Completing {
                downstream.terminate(Terminal::Complete);
                drop(downstream);
                subscriber.on_complete();
            }
            return;
        }
    }

    /// Emit `value` downstream, or hold it until credit arrives.
    ///
    /// Values broadcast after termination are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SpillwayError::BacklogOverflow`] when the value would have to
    /// be held and the backlog is already at its configured limit.
    pub fn broadcast_next(&self, value: O) -> Result<()> {
        let mut downstream = self.downstream.lock();
        if downstream.phase != Phase::Active {
            drop(downstream);
            trace!("{}: dropping element after termination", self.name);
            return Ok(());
        }

        match downstream.ready_subscriber() {
            Some(subscriber) => {
                downstream.take_credit();
                drop(downstream);
                subscriber.on_next(value);
                Ok(())
            }
            None => {
                if let Some(limit) = self.backlog_limit {
                    if downstream.backlog.len() >= limit {
                        return Err(SpillwayError::BacklogOverflow { limit });
                    }
                }
                downstream.backlog.push_back(value);
                Ok(())
            }
        }
    }

    /// Deliver `error` downstream immediately, discarding the backlog.
    pub fn broadcast_error(&self, error: SpillwayError) {
        let subscriber = {
            let mut downstream = self.downstream.lock();
            if downstream.phase == Phase::Terminated {
                drop(downstream);
                debug!("{}: ignoring error after termination: {}", self.name, error);
                return;
            }
            downstream.terminate(Terminal::Error(error.clone()))
        };
        if let Some(subscriber) = subscriber {
            subscriber.on_error(error);
        }
    }

    /// Complete downstream once the backlog has drained.
    pub fn broadcast_complete(&self) {
        let subscriber = {
            let mut downstream = self.downstream.lock();
            if downstream.phase != Phase::Active {
                return;
            }
            if downstream.backlog.is_empty() {
                downstream.terminate(Terminal::Complete)
            } else {
                downstream.phase = Phase::Completing;
                None
            }
        };
        if let Some(subscriber) = subscriber {
            subscriber.on_complete();
        }
    }

    /// The stage's own error path: cancel upstream, then fail downstream.
    pub fn fail(&self, error: SpillwayError) {
        self.cancel_upstream();
        self.broadcast_error(error);
    }

    /// Detach the downstream subscriber. Returns `false` if already canceled.
    pub fn cancel(&self) -> bool {
        let mut downstream = self.downstream.lock();
        if downstream.cancelled {
            return false;
        }
        downstream.cancelled = true;
        downstream.phase = Phase::Terminated;
        downstream.backlog.clear();
        downstream.subscriber = None;
        true
    }

    // ----------------------------------------------------------------- queries

    pub fn is_terminated(&self) -> bool {
        self.downstream.lock().phase == Phase::Terminated
    }

    pub fn is_cancelled(&self) -> bool {
        self.downstream.lock().cancelled
    }

    pub fn has_credit(&self) -> bool {
        self.downstream.lock().credit > 0
    }

    pub fn credit(&self) -> u64 {
        self.downstream.lock().credit
    }

    pub fn backlog_len(&self) -> usize {
        self.downstream.lock().backlog.len()
    }
}
