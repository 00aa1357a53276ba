// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{SpillwayError, Subscription};
use std::sync::Arc;

/// Receiver side of a credit-based stream.
///
/// Signals arrive in the order `on_subscribe`, any number of `on_next` (never
/// more than the credit granted through the subscription), then at most one of
/// `on_error` / `on_complete`.
///
/// Implementations are shared between the producing and the requesting side, so
/// every method takes `&self`; stages hand the work to their own dispatcher
/// instead of doing it on the caller's thread.
pub trait Subscriber<T>: Send + Sync {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>);

    fn on_next(&self, value: T);

    fn on_error(&self, error: SpillwayError);

    fn on_complete(&self);
}
