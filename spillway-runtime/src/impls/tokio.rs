// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::impls::common::{rejected, NameSequence};
use parking_lot::Mutex;
use spillway_core::{Dispatcher, DispatcherFactory, Result, SpillwayError, Task};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

/// Dispatcher backed by a single spawned tokio task.
///
/// Tasks are queued on an unbounded channel and run one after another by the
/// spawned drain loop, so two dispatchers run concurrently on a multi-threaded
/// runtime while each stays FIFO and non-reentrant.
pub struct TokioDispatcher {
    name: String,
    sender: Mutex<Option<UnboundedSender<Task>>>,
}

impl TokioDispatcher {
    /// Spawns the drain loop on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SpillwayError::InvalidConfiguration`] when called outside a
    /// tokio runtime.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let handle = current_handle()?;
        Ok(Self::with_handle(name, &handle))
    }

    /// Spawns the drain loop on `handle`.
    pub fn with_handle(name: impl Into<String>, handle: &Handle) -> Self {
        let (sender, mut receiver) = unbounded_channel::<Task>();
        handle.spawn(async move {
            while let Some(task) = receiver.recv().await {
                task();
            }
        });

        Self {
            name: name.into(),
            sender: Mutex::new(Some(sender)),
        }
    }

    /// Factory creating one dispatcher per call on the current runtime,
    /// named `tokio-<n>`.
    ///
    /// # Errors
    ///
    /// Returns [`SpillwayError::InvalidConfiguration`] when called outside a
    /// tokio runtime.
    pub fn factory() -> Result<impl DispatcherFactory> {
        let handle = current_handle()?;
        let names = NameSequence::new("tokio");
        Ok(move || {
            Arc::new(TokioDispatcher::with_handle(names.next_name(), &handle)) as Arc<dyn Dispatcher>
        })
    }
}

fn current_handle() -> Result<Handle> {
    Handle::try_current().map_err(|e| {
        SpillwayError::invalid_configuration(format!("no tokio runtime available: {e}"))
    })
}

impl Dispatcher for TokioDispatcher {
    fn dispatch(&self, task: Task) -> Result<()> {
        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(sender) => sender.send(task).map_err(|_| rejected(&self.name)),
            None => Err(rejected(&self.name)),
        }
    }

    fn shutdown(&self) {
        // Dropping the sender ends the drain loop once the queue is empty.
        self.sender.lock().take();
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TokioDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for TokioDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioDispatcher")
            .field("name", &self.name)
            .field("open", &self.sender.lock().is_some())
            .finish()
    }
}
