// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Scan stage for stateful accumulation.

use parking_lot::Mutex;
use spillway_core::{
    debug, CreditSubscription, Dispatcher, Publisher, RequestHandler, Result, SpillwayError,
    StageConfig, StageCore, Subscriber, Subscription,
};
use std::error::Error;
use std::fmt::{self, Display};
use std::sync::{Arc, Weak};

type SeedFn<A> = Box<dyn FnMut() -> Result<A> + Send>;
type FoldFn<T, A> = Box<dyn FnMut(T, Option<A>) -> Result<A> + Send>;

struct ScanState<T, A> {
    accumulator: Option<A>,
    seed: Option<SeedFn<A>>,
    fold: FoldFn<T, A>,
}

impl<T, A: Clone> ScanState<T, A> {
    /// `None` means the accumulator was never set: the seed runs only then, so
    /// a fold returning an "empty" accumulator does not cause a re-seed.
    fn step(&mut self, value: T) -> Result<A> {
        if self.accumulator.is_none() {
            if let Some(seed) = self.seed.as_mut() {
                self.accumulator = Some(seed()?);
            }
        }
        let next = (self.fold)(value, self.accumulator.take())?;
        self.accumulator = Some(next.clone());
        Ok(next)
    }
}

/// Folds every input into a running accumulator and emits the accumulator
/// after each update.
///
/// The accumulator starts unset. When a seed factory is given it is called
/// once, before the first fold; otherwise the first fold receives `None`.
/// Exactly one value is emitted per input element. A failing seed or fold
/// cancels the upstream and terminates the stage with
/// [`SpillwayError::FoldFailure`].
///
/// Downstream demand is forwarded upstream one to one.
///
/// # Examples
///
/// ```rust
/// use spillway_core::{Publisher, Subscriber};
/// use spillway_runtime::SyncDispatcher;
/// use spillway_stream::{IterSource, ScanStage};
/// use spillway_test_utils::TestSubscriber;
/// use std::convert::Infallible;
/// use std::sync::Arc;
///
/// let dispatcher = Arc::new(SyncDispatcher::new("main"));
/// let source = IterSource::new(dispatcher.clone(), vec![1, 2, 3]);
/// let sums = ScanStage::with_seed(
///     dispatcher,
///     || Ok::<_, Infallible>(0),
///     |x: i32, acc: Option<i32>| Ok::<_, Infallible>(acc.unwrap_or_default() + x),
/// );
/// let sink = TestSubscriber::unbounded();
///
/// source.subscribe(sums.clone());
/// sums.subscribe(sink.clone());
///
/// assert_eq!(sink.values(), vec![1, 3, 6]);
/// assert!(sink.is_completed());
/// ```
pub struct ScanStage<T, A> {
    this: Weak<Self>,
    core: StageCore<A>,
    state: Mutex<ScanState<T, A>>,
}

impl<T, A> ScanStage<T, A>
where
    T: Send + 'static,
    A: Clone + Send + 'static,
{
    /// A scan without a seed factory: the first fold receives `None`.
    pub fn new<F, E>(dispatcher: Arc<dyn Dispatcher>, fold: F) -> Arc<Self>
    where
        F: FnMut(T, Option<A>) -> std::result::Result<A, E> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        Self::build(dispatcher, &StageConfig::new(), None, wrap_fold(fold))
    }

    /// A scan whose accumulator is seeded once by `seed` before the first fold.
    pub fn with_seed<S, F, E>(dispatcher: Arc<dyn Dispatcher>, seed: S, fold: F) -> Arc<Self>
    where
        S: FnMut() -> std::result::Result<A, E> + Send + 'static,
        F: FnMut(T, Option<A>) -> std::result::Result<A, E> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        Self::build(
            dispatcher,
            &StageConfig::new(),
            Some(wrap_seed(seed)),
            wrap_fold(fold),
        )
    }

    pub fn with_config<F, E>(dispatcher: Arc<dyn Dispatcher>, config: &StageConfig, fold: F) -> Arc<Self>
    where
        F: FnMut(T, Option<A>) -> std::result::Result<A, E> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        Self::build(dispatcher, config, None, wrap_fold(fold))
    }

    pub fn with_seed_and_config<S, F, E>(
        dispatcher: Arc<dyn Dispatcher>,
        config: &StageConfig,
        seed: S,
        fold: F,
    ) -> Arc<Self>
    where
        S: FnMut() -> std::result::Result<A, E> + Send + 'static,
        F: FnMut(T, Option<A>) -> std::result::Result<A, E> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        Self::build(dispatcher, config, Some(wrap_seed(seed)), wrap_fold(fold))
    }

    fn build(
        dispatcher: Arc<dyn Dispatcher>,
        config: &StageConfig,
        seed: Option<SeedFn<A>>,
        fold: FoldFn<T, A>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            core: StageCore::new("scan", dispatcher, config),
            state: Mutex::new(ScanState {
                accumulator: None,
                seed,
                fold,
            }),
        })
    }

    /// Set how much to request upstream as soon as this stage is subscribed.
    pub fn prefetch(&self, elements: u64) {
        self.core.prefetch(elements);
    }

    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        self.core.dispatcher()
    }

    /// The current accumulator, unset before the first element.
    pub fn accumulator(&self) -> Option<A> {
        self.state.lock().accumulator.clone()
    }

    fn do_next(&self, value: T) {
        if self.core.is_terminated() {
            debug!("{}: dropping element after termination", self.core.name());
            return;
        }

        let folded = self.state.lock().step(value);
        let result = folded.and_then(|accumulator| self.core.broadcast_next(accumulator));
        if let Err(error) = result {
            self.core.fail(error);
        }
    }
}

fn wrap_seed<A, S, E>(mut seed: S) -> SeedFn<A>
where
    S: FnMut() -> std::result::Result<A, E> + Send + 'static,
    E: Error + Send + Sync + 'static,
{
    Box::new(move || seed().map_err(SpillwayError::fold_failure))
}

fn wrap_fold<T, A, F, E>(mut fold: F) -> FoldFn<T, A>
where
    F: FnMut(T, Option<A>) -> std::result::Result<A, E> + Send + 'static,
    E: Error + Send + Sync + 'static,
{
    Box::new(move |value, accumulator| fold(value, accumulator).map_err(SpillwayError::fold_failure))
}

impl<T, A> Subscriber<T> for ScanStage<T, A>
where
    T: Send + 'static,
    A: Clone + Send + 'static,
{
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        if self.core.on_subscribe(subscription) {
            self.core.request_prefetch();
        }
    }

    fn on_next(&self, value: T) {
        self.core.schedule(&self.this, move |stage| stage.do_next(value));
    }

    fn on_error(&self, error: SpillwayError) {
        self.core
            .schedule(&self.this, move |stage| stage.core.broadcast_error(error));
    }

    fn on_complete(&self) {
        self.core
            .schedule(&self.this, |stage| stage.core.broadcast_complete());
    }
}

impl<T, A> Publisher<A> for ScanStage<T, A>
where
    T: Send + 'static,
    A: Clone + Send + 'static,
{
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<A>>) {
        let target: Weak<dyn RequestHandler> = self.this.clone();
        self.core.schedule(&self.this, move |stage| {
            stage
                .core
                .attach(subscriber, CreditSubscription::shared(target));
        });
    }
}

impl<T, A> RequestHandler for ScanStage<T, A>
where
    T: Send + 'static,
    A: Clone + Send + 'static,
{
    fn on_downstream_request(&self, n: u64) {
        self.core.schedule(&self.this, move |stage| {
            if stage.core.accept_demand(n) {
                stage.core.add_credit(n);
                stage.core.request_upstream(n);
            }
        });
    }

    fn on_downstream_cancel(&self) {
        if self.core.cancel() {
            self.core.cancel_upstream();
        }
    }
}

impl<T, A> Display for ScanStage<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.core.name())
    }
}
