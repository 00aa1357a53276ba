// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use spillway_core::SpillwayError;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) fn rejected(name: &str) -> SpillwayError {
    SpillwayError::dispatch_rejected(format!("{name} is shut down"))
}

/// Hands out `prefix-1`, `prefix-2`, ... for dispatchers built by a factory.
pub(crate) struct NameSequence {
    prefix: &'static str,
    next: AtomicUsize,
}

impl NameSequence {
    pub(crate) const fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next: AtomicUsize::new(1),
        }
    }

    pub(crate) fn next_name(&self) -> String {
        format!("{}-{}", self.prefix, self.next.fetch_add(1, Ordering::Relaxed))
    }
}
