// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{SpillwayError, Subscriber};
use std::collections::VecDeque;
use std::sync::Arc;

/// Credit value treated as "unbounded": it is never decremented.
pub(crate) const UNBOUNDED: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Active,
    /// Completion was signalled while elements were still waiting for credit.
    Completing,
    Terminated,
}

#[derive(Debug, Clone)]
pub(crate) enum Terminal {
    Complete,
    Error(SpillwayError),
}

pub(crate) struct Downstream<O> {
    pub(crate) subscriber: Option<Arc<dyn Subscriber<O>>>,
    pub(crate) attached: bool,
    pub(crate) credit: u64,
    pub(crate) backlog: VecDeque<O>,
    pub(crate) phase: Phase,
    pub(crate) terminal: Option<Terminal>,
    pub(crate) cancelled: bool,
}

impl<O> Downstream<O> {
    pub(crate) fn new() -> Self {
        Self {
            subscriber: None,
            attached: false,
            credit: 0,
            backlog: VecDeque::new(),
            phase: Phase::Active,
            terminal: None,
            cancelled: false,
        }
    }

    pub(crate) fn grant(&mut self, n: u64) {
        self.credit = self.credit.saturating_add(n);
    }

    pub(crate) fn take_credit(&mut self) {
        if self.credit != UNBOUNDED {
            self.credit -= 1;
        }
    }

    /// Subscriber to hand `value` to right away, if credit allows and nothing
    /// is queued ahead of it.
    pub(crate) fn ready_subscriber(&self) -> Option<Arc<dyn Subscriber<O>>> {
        if self.credit > 0 && self.backlog.is_empty() {
            self.subscriber.clone()
        } else {
            None
        }
    }

    pub(crate) fn terminate(&mut self, terminal: Terminal) -> Option<Arc<dyn Subscriber<O>>> {
        self.phase = Phase::Terminated;
        self.backlog.clear();
        self.terminal = Some(terminal);
        self.subscriber.take()
    }
}
