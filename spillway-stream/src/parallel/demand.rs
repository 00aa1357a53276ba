// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// Folds the requests of all workers into upstream demand.
///
/// `pending` accumulates every request ever made (saturating at `u64::MAX`)
/// and is never decremented. Each request is then translated:
///
/// - `n > batch_size`: request `batch_size`
/// - otherwise, if `pending` was at most `batch_size` before this request:
///   request `n`
/// - otherwise: request nothing
///
/// ```
/// use spillway_stream::DemandAggregator;
///
/// let mut demand = DemandAggregator::new();
/// assert_eq!(demand.aggregate(32, 8), Some(8));
/// assert_eq!(demand.aggregate(4, 8), None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemandAggregator {
    pending: u64,
}

impl DemandAggregator {
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: 0 }
    }

    /// Record a request for `n` and return what to request upstream, if anything.
    pub fn aggregate(&mut self, n: u64, batch_size: u64) -> Option<u64> {
        let previous = self.pending;
        self.pending = self.pending.saturating_add(n);

        let amount = if n > batch_size {
            batch_size
        } else if previous <= batch_size {
            n
        } else {
            0
        };

        (amount > 0).then_some(amount)
    }

    #[must_use]
    pub const fn pending(&self) -> u64 {
        self.pending
    }
}
