// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::impls::common::{rejected, NameSequence};
use parking_lot::Mutex;
use spillway_core::{Dispatcher, DispatcherFactory, Result, Task};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Default)]
struct State {
    queue: VecDeque<Task>,
    draining: bool,
    closed: bool,
}

/// Trampolining dispatcher that runs tasks on the submitting thread.
///
/// The first `dispatch` call becomes the drainer and runs queued tasks until
/// the queue is empty. Tasks submitted meanwhile, from inside a running task or
/// from another thread, are appended and run by that drainer; the submitting
/// call returns immediately. Tasks therefore never nest and never overlap.
///
/// ```
/// use spillway_core::Dispatcher;
/// use spillway_runtime::SyncDispatcher;
/// use std::sync::{Arc, Mutex};
///
/// let dispatcher = Arc::new(SyncDispatcher::new("inline"));
/// let log = Arc::new(Mutex::new(Vec::new()));
///
/// let (inner, outer_log) = (dispatcher.clone(), log.clone());
/// dispatcher
///     .dispatch(Box::new(move || {
///         let inner_log = outer_log.clone();
///         inner
///             .dispatch(Box::new(move || inner_log.lock().unwrap().push("inner")))
///             .unwrap();
///         outer_log.lock().unwrap().push("outer");
///     }))
///     .unwrap();
///
/// assert_eq!(*log.lock().unwrap(), vec!["outer", "inner"]);
/// ```
pub struct SyncDispatcher {
    name: String,
    state: Mutex<State>,
}

impl SyncDispatcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Factory creating a fresh `SyncDispatcher` per call, named `sync-<n>`.
    pub fn factory() -> impl DispatcherFactory {
        let names = NameSequence::new("sync");
        move || Arc::new(SyncDispatcher::new(names.next_name())) as Arc<dyn Dispatcher>
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    fn next_task(&self) -> Option<Task> {
        let mut state = self.state.lock();
        let task = state.queue.pop_front();
        if task.is_none() {
            state.draining = false;
        }
        task
    }
}

/// Releases the drainer role if a task panics.
struct DrainGuard<'a>(&'a SyncDispatcher);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.state.lock().draining = false;
        }
    }
}

impl Dispatcher for SyncDispatcher {
    fn dispatch(&self, task: Task) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(rejected(&self.name));
            }
            state.queue.push_back(task);
            if state.draining {
                return Ok(());
            }
            state.draining = true;
        }

        let _guard = DrainGuard(self);
        while let Some(task) = self.next_task() {
            task();
        }
        Ok(())
    }

    fn shutdown(&self) {
        self.state.lock().closed = true;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SyncDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncDispatcher")
            .field("name", &self.name)
            .field("pending", &self.pending())
            .finish()
    }
}
