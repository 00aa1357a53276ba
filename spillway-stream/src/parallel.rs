// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Round-robin fan-out into independently flow-controlled workers.
//!
//! A [`ParallelStage`] subscribes to one upstream and owns a fixed pool of
//! [`ParallelWorker`]s, each bound to its own dispatcher. Upstream elements are
//! routed to the workers in turn; the demand of all workers is folded into
//! upstream requests by a [`DemandAggregator`].
//!
//! The stage itself publishes the worker handles: a subscriber requesting `k`
//! receives the next `k` workers and a completion once all of them were handed
//! out. [`ParallelStage::connect`] does that request on the subscriber's behalf.
//!
//! ## Failure scopes
//!
//! | failure | delivered to |
//! |---|---|
//! | a worker cannot emit a routed element | that worker, as `RoutingFailure` |
//! | aggregated demand cannot be requested | the handle subscriber and every live worker, as `AggregationFailure` |
//! | zero request on the handle stream | the handle subscriber and every live worker, as `InvalidDemand` |
//! | upstream error | every live worker |
//!
//! Upstream completion and errors end the workers' streams but not the handle
//! stream, which completes once every worker was handed out. An element routed
//! to a canceled worker's slot is dropped.

mod demand;
mod router;
mod worker;

pub use self::demand::DemandAggregator;
pub use self::worker::ParallelWorker;

use crate::parallel::router::Router;
use parking_lot::Mutex;
use spillway_core::{
    debug, trace, warn, CreditSubscription, Dispatcher, DispatcherFactory, Prefetch, Publisher,
    RequestHandler, Result, SpillwayError, StageConfig, StageCore, Subscriber, Subscription,
};
use std::fmt::{self, Display};
use std::sync::{Arc, Weak};

type Slot<T> = Mutex<Option<Arc<ParallelWorker<T>>>>;

/// Fan-out stage routing elements round-robin to a pool of workers.
///
/// # Examples
///
/// ```rust
/// use spillway_core::Publisher;
/// use spillway_runtime::SyncDispatcher;
/// use spillway_stream::{IterSource, ParallelStage};
/// use spillway_test_utils::TestSubscriber;
/// use std::sync::Arc;
///
/// let dispatcher = Arc::new(SyncDispatcher::new("main"));
/// let parallel =
///     ParallelStage::<&str>::new(dispatcher.clone(), &SyncDispatcher::factory(), 2).unwrap();
/// let source = IterSource::new(dispatcher, vec!["a", "b", "c"]);
/// source.subscribe(parallel.clone());
///
/// let first = TestSubscriber::unbounded();
/// let second = TestSubscriber::unbounded();
/// parallel.worker(0).unwrap().subscribe(first.clone());
/// parallel.worker(1).unwrap().subscribe(second.clone());
///
/// assert_eq!(first.values(), vec!["a", "c"]);
/// assert_eq!(second.values(), vec!["b"]);
/// ```
pub struct ParallelStage<T> {
    this: Weak<Self>,
    core: StageCore<Arc<ParallelWorker<T>>>,
    pool: Box<[Slot<T>]>,
    router: Mutex<Router>,
    demand: Mutex<DemandAggregator>,
    cursor: Mutex<usize>,
}

impl<T: Send + 'static> ParallelStage<T> {
    /// Creates a stage with `pool_size` workers, one dispatcher from `workers`
    /// each.
    ///
    /// # Errors
    ///
    /// Returns [`SpillwayError::InvalidConfiguration`] when `pool_size` is zero.
    pub fn new<F>(dispatcher: Arc<dyn Dispatcher>, workers: &F, pool_size: usize) -> Result<Arc<Self>>
    where
        F: DispatcherFactory + ?Sized,
    {
        Self::with_config(dispatcher, workers, pool_size, &StageConfig::new())
    }

    /// Like [`new`](Self::new). The configured name prefixes worker names and
    /// the backlog limit applies to every worker.
    ///
    /// # Errors
    ///
    /// Returns [`SpillwayError::InvalidConfiguration`] when `pool_size` is zero.
    pub fn with_config<F>(
        dispatcher: Arc<dyn Dispatcher>,
        workers: &F,
        pool_size: usize,
        config: &StageConfig,
    ) -> Result<Arc<Self>>
    where
        F: DispatcherFactory + ?Sized,
    {
        if pool_size == 0 {
            return Err(SpillwayError::invalid_configuration(
                "pool size must be strictly positive",
            ));
        }

        let core = StageCore::new("parallel", dispatcher, config);
        let mut worker_config = StageConfig::new().with_name(core.name());
        if let Some(limit) = config.backlog_limit() {
            worker_config = worker_config.with_backlog_limit(limit);
        }

        Ok(Arc::new_cyclic(|this: &Weak<Self>| {
            let pool = (0..pool_size)
                .map(|index| {
                    let worker = ParallelWorker::new(
                        this.clone(),
                        workers.create(),
                        &worker_config,
                        index,
                        pool_size,
                    );
                    Mutex::new(Some(worker))
                })
                .collect();

            Self {
                this: this.clone(),
                core,
                pool,
                router: Mutex::new(Router::default()),
                demand: Mutex::new(DemandAggregator::new()),
                cursor: Mutex::new(0),
            }
        }))
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// The worker in slot `index`, unless that slot was cleared.
    pub fn worker(&self, index: usize) -> Option<Arc<ParallelWorker<T>>> {
        self.pool.get(index).and_then(|slot| slot.lock().clone())
    }

    /// Every worker whose slot is still live, in slot order.
    pub fn workers(&self) -> Vec<Arc<ParallelWorker<T>>> {
        self.pool
            .iter()
            .filter_map(|slot| slot.lock().clone())
            .collect()
    }

    /// Upstream batch size set by [`prefetch`](Self::prefetch).
    pub fn batch_size(&self) -> Option<u64> {
        self.core.capacity()
    }

    /// Total demand received from all workers so far.
    pub fn pending_request(&self) -> u64 {
        self.demand.lock().pending()
    }

    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        self.core.dispatcher()
    }

    /// Sets the upstream batch size and gives every live worker an equal share.
    pub fn prefetch(&self, elements: u64) {
        self.core.prefetch(elements);
        let share = elements / self.pool.len() as u64;
        for worker in self.workers() {
            worker.prefetch(share);
        }
    }

    /// Subscribes `consumer` to the worker handles after telling it to prefetch
    /// the whole pool, so it receives every handle without requesting.
    pub fn connect<C>(&self, consumer: Arc<C>) -> Arc<C>
    where
        C: Subscriber<Arc<ParallelWorker<T>>> + Prefetch + 'static,
    {
        consumer.prefetch(self.pool.len() as u64);
        self.subscribe(consumer.clone());
        consumer
    }

    /// Demand reported by a worker. Aggregated on this stage's dispatcher.
    pub(crate) fn on_request(&self, n: u64) {
        self.core.schedule(&self.this, move |stage| stage.aggregate(n));
    }

    pub(crate) fn clear_slot(&self, index: usize) {
        if let Some(slot) = self.pool.get(index) {
            slot.lock().take();
        }
    }

    fn aggregate(&self, n: u64) {
        let batch_size = self.core.capacity().unwrap_or(u64::MAX);
        let Some(amount) = self.demand.lock().aggregate(n, batch_size) else {
            trace!("{}: request({}) absorbed by pending demand", self, n);
            return;
        };

        match self.core.subscription() {
            Some(subscription) => {
                trace!("{}: requesting {} upstream", self, amount);
                subscription.request(amount);
            }
            None => self.fail(SpillwayError::aggregation_failure(
                SpillwayError::NotSubscribed,
            )),
        }
    }

    fn fail(&self, error: SpillwayError) {
        self.core.fail(error.clone());
        for worker in self.workers() {
            worker.route_error(error.clone());
        }
    }

    fn do_next(&self, value: T) {
        let index = self.router.lock().next_slot(self.pool.len());
        match self.worker(index) {
            Some(worker) => worker.route(value),
            None => debug!("{}: slot {} is empty, dropping element", self, index),
        }
    }

    // Upstream terminal signals end the workers' data streams only. The handle
    // stream describes the pool and completes on its own in `hand_out`.
    fn do_error(&self, error: SpillwayError) {
        for worker in self.workers() {
            worker.route_error(error.clone());
        }
    }

    fn do_complete(&self) {
        for worker in self.workers() {
            worker.route_complete();
        }
    }

    /// Hand the next `k` worker handles to the handle subscriber.
    ///
    /// Each request resumes at the cursor left by the previous one, so a handle
    /// is delivered at most once. Slots cleared before their turn are skipped.
    fn hand_out(&self, k: u64) {
        let pool_size = self.pool.len();
        let (handles, exhausted) = {
            let mut cursor = self.cursor.lock();
            let start = *cursor;
            let end = usize::try_from(k)
                .map_or(pool_size, |k| start.saturating_add(k))
                .min(pool_size);
            *cursor = end;
            let handles: Vec<_> = self.pool[start..end]
                .iter()
                .filter_map(|slot| slot.lock().clone())
                .collect();
            (handles, end == pool_size)
        };

        self.core.add_credit(k);
        for handle in handles {
            if let Err(error) = self.core.broadcast_next(handle) {
                self.core.broadcast_error(error);
                return;
            }
        }
        if exhausted {
            self.core.broadcast_complete();
        }
    }
}

impl<T: Send + 'static> Subscriber<T> for ParallelStage<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.core.on_subscribe(subscription);
    }

    fn on_next(&self, value: T) {
        self.core.schedule(&self.this, move |stage| stage.do_next(value));
    }

    fn on_error(&self, error: SpillwayError) {
        self.core
            .schedule(&self.this, move |stage| stage.do_error(error));
    }

    fn on_complete(&self) {
        self.core.schedule(&self.this, |stage| stage.do_complete());
    }
}

impl<T: Send + 'static> Publisher<Arc<ParallelWorker<T>>> for ParallelStage<T> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<Arc<ParallelWorker<T>>>>) {
        let target: Weak<dyn RequestHandler> = self.this.clone();
        self.core.schedule(&self.this, move |stage| {
            stage
                .core
                .attach(subscriber, CreditSubscription::shared(target));
        });
    }
}

impl<T: Send + 'static> RequestHandler for ParallelStage<T> {
    fn on_downstream_request(&self, k: u64) {
        self.core.schedule(&self.this, move |stage| {
            if k == 0 {
                warn!("{}: rejecting request(0) on the handle stream", stage);
                stage.fail(SpillwayError::InvalidDemand { requested: 0 });
            } else {
                stage.hand_out(k);
            }
        });
    }

    fn on_downstream_cancel(&self) {
        self.core.cancel();
    }
}

impl<T> Display for ParallelStage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.core.name(), self.pool.len())
    }
}
