// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Execution contexts for stages.
//!
//! Every stage is pinned to one [`Dispatcher`]. A dispatcher runs submitted
//! tasks in submission order and never two of them at once, so state touched
//! only from tasks on a stage's own dispatcher needs no further coordination.
//! Different dispatchers run independently of each other; that is where
//! parallelism comes from.
//!
//! Implementations live in `spillway-runtime`.

use crate::Result;
use std::sync::Arc;

/// A unit of work submitted to a dispatcher.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// FIFO, non-reentrant execution context.
pub trait Dispatcher: Send + Sync + 'static {
    /// Submit `task` for execution after every previously submitted task.
    ///
    /// # Errors
    ///
    /// Returns [`SpillwayError::DispatchRejected`](crate::SpillwayError::DispatchRejected)
    /// when the dispatcher has been shut down.
    fn dispatch(&self, task: Task) -> Result<()>;

    /// Stop accepting tasks. Tasks already queued may still run.
    fn shutdown(&self);

    /// Human-readable name used in logs.
    fn name(&self) -> &str;
}

/// Extension methods for submitting typed work.
pub trait DispatcherExt: Dispatcher {
    /// Submit `handler` to be run against `value`.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    fn submit<V, F>(&self, value: V, handler: F) -> Result<()>
    where
        V: Send + 'static,
        F: FnOnce(V) + Send + 'static,
    {
        self.dispatch(Box::new(move || handler(value)))
    }
}

impl<D: Dispatcher + ?Sized> DispatcherExt for D {}

/// Yields one fresh dispatcher per call.
///
/// Used by fan-out stages to give every worker its own context.
pub trait DispatcherFactory: Send + Sync {
    fn create(&self) -> Arc<dyn Dispatcher>;
}

impl<F> DispatcherFactory for F
where
    F: Fn() -> Arc<dyn Dispatcher> + Send + Sync,
{
    fn create(&self) -> Arc<dyn Dispatcher> {
        self()
    }
}
