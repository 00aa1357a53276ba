// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Credit handles handed from a publisher to its subscriber.

use std::sync::{Arc, Weak};

/// Downstream-facing credit handle.
///
/// `request(n)` grants `n` more elements, `cancel()` stops the flow. Both may
/// be called from any thread and after the publisher is gone.
pub trait Subscription: Send + Sync {
    fn request(&self, n: u64);

    fn cancel(&self);
}

/// Stage-side receiver of the calls made on a [`CreditSubscription`].
///
/// Stages implement this to customize what request and cancel mean for them,
/// while sharing the subscription type itself.
pub trait RequestHandler: Send + Sync {
    fn on_downstream_request(&self, n: u64);

    fn on_downstream_cancel(&self);
}

/// Subscription that forwards to a stage through a weak handle.
///
/// Holding the stage weakly keeps subscriber → subscription → stage from forming
/// an ownership cycle; calls on a subscription whose stage is gone are no-ops.
pub struct CreditSubscription {
    target: Weak<dyn RequestHandler>,
}

impl CreditSubscription {
    pub fn new(target: Weak<dyn RequestHandler>) -> Self {
        Self { target }
    }

    /// Convenience constructor returning the subscription as a trait object.
    pub fn shared(target: Weak<dyn RequestHandler>) -> Arc<dyn Subscription> {
        Arc::new(Self::new(target))
    }
}

impl Subscription for CreditSubscription {
    fn request(&self, n: u64) {
        if let Some(target) = self.target.upgrade() {
            target.on_downstream_request(n);
        }
    }

    fn cancel(&self) {
        if let Some(target) = self.target.upgrade() {
            target.on_downstream_cancel();
        }
    }
}

/// Subscription handed out together with an immediate terminal signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct CancelledSubscription;

impl CancelledSubscription {
    pub fn shared() -> Arc<dyn Subscription> {
        Arc::new(Self)
    }
}

impl Subscription for CancelledSubscription {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {}
}
