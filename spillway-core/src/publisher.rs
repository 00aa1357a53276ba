// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::Subscriber;
use std::sync::Arc;

/// A source of elements that pushes to subscribers under credit.
///
/// `subscribe` always results in exactly one `on_subscribe` call on the
/// subscriber, possibly followed by an immediate terminal signal when the
/// publisher cannot accept it.
pub trait Publisher<T>: Send + Sync {
    /// Attach `subscriber`; elements flow only once it requests credit.
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>);
}
