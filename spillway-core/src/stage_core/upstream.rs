// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::Subscription;
use std::sync::Arc;

#[derive(Default)]
pub(crate) struct Upstream {
    pub(crate) subscription: Option<Arc<dyn Subscription>>,
    /// Demand issued before any subscription arrived.
    pub(crate) deferred: u64,
    pub(crate) cancelled: bool,
}
