// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

pub mod bridge;
pub mod parallel;
pub mod scan;
pub mod sink;
pub mod source;

pub use self::bridge::{into_stream, SubscriberStream};
pub use self::parallel::{DemandAggregator, ParallelStage, ParallelWorker};
pub use self::scan::ScanStage;
pub use self::sink::CallbackSink;
pub use self::source::IterSource;
