// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Dispatcher implementations for Spillway stages.
//!
//! - [`SyncDispatcher`]: runs tasks inline on the submitting thread. Deterministic,
//!   handy for tests and single-threaded pipelines.
//! - [`TokioDispatcher`] (feature `runtime-tokio`, default): one tokio task per
//!   dispatcher draining an unbounded queue.

pub mod impls;

pub use self::impls::sync::SyncDispatcher;
#[cfg(feature = "runtime-tokio")]
pub use self::impls::tokio::TokioDispatcher;
