// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

#[macro_use]
mod logging;

#[doc(hidden)]
pub mod __private {
    #[cfg(feature = "tracing")]
    pub use tracing;
}

pub mod dispatcher;
pub mod error;
pub mod prefetch;
pub mod publisher;
pub mod stage_config;
pub mod stage_core;
pub mod stream_item;
pub mod subscriber;
pub mod subscription;

pub use self::dispatcher::{Dispatcher, DispatcherExt, DispatcherFactory, Task};
pub use self::error::{Result, SharedError, SpillwayError};
pub use self::prefetch::Prefetch;
pub use self::publisher::Publisher;
pub use self::stage_config::StageConfig;
pub use self::stage_core::StageCore;
pub use self::stream_item::StreamItem;
pub use self::subscriber::Subscriber;
pub use self::subscription::{CancelledSubscription, CreditSubscription, RequestHandler, Subscription};
