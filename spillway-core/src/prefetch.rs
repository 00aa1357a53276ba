// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// Consumers that can be told how much to request up front.
///
/// A prefetch set before subscribing is requested as soon as the subscription
/// arrives, so the consumer receives that many elements without issuing any
/// demand itself.
pub trait Prefetch {
    fn prefetch(&self, elements: u64);
}
