// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error types for Spillway pipelines
//!
//! This module provides the root [`SpillwayError`] type. Each variant maps to one
//! failure scope of a pipeline: construction, a single worker branch, a whole
//! fan-out stage, or a folding stage.
//!
//! # Examples
//!
//! ```
//! use spillway_core::{Result, SpillwayError};
//!
//! fn pool_size(size: usize) -> Result<usize> {
//!     if size == 0 {
//!         return Err(SpillwayError::invalid_configuration("pool size must be positive"));
//!     }
//!     Ok(size)
//! }
//!
//! assert!(pool_size(0).is_err());
//! ```

use std::error::Error;
use std::sync::Arc;

/// Shared, cloneable user error.
pub type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// Root error type for all Spillway operations
///
/// Errors travel through pipelines as signals and are cloned whenever a stage
/// fans a failure out to several branches, hence the `Clone` bound and the
/// `Arc`-wrapped sources.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SpillwayError {
    /// A stage or dispatcher was configured with an unusable value.
    #[error("Invalid configuration: {context}")]
    InvalidConfiguration {
        /// What was wrong with the configuration
        context: String,
    },

    /// An element routed to a worker could not be broadcast by it.
    ///
    /// Contained to the worker at `index`; siblings and the owning stage keep running.
    #[error("Routing to worker {index} failed: {source}")]
    RoutingFailure {
        /// Slot index of the worker that failed
        index: usize,
        /// The failure raised while broadcasting
        #[source]
        source: Box<SpillwayError>,
    },

    /// Computing or applying aggregated demand failed.
    ///
    /// Fatal for the whole fan-out stage and every live worker.
    #[error("Demand aggregation failed: {0}")]
    AggregationFailure(#[source] Box<SpillwayError>),

    /// The seed factory or the fold function of a folding stage failed.
    #[error("Fold failed: {0}")]
    FoldFailure(#[source] SharedError),

    /// A stage held more undemanded elements than its backlog limit allows.
    #[error("Backlog overflow: more than {limit} elements pending without demand")]
    BacklogOverflow {
        /// The configured backlog limit
        limit: usize,
    },

    /// A subscriber requested a non-positive number of elements.
    #[error("Invalid demand: {requested} (requests must be strictly positive)")]
    InvalidDemand {
        /// The requested amount
        requested: u64,
    },

    /// Upstream demand had to be issued before the stage was subscribed.
    #[error("Stage has no upstream subscription")]
    NotSubscribed,

    /// A single-subscriber publisher received a second subscriber.
    #[error("Publisher already has a subscriber")]
    AlreadySubscribed,

    /// A task was submitted to a dispatcher that no longer accepts work.
    #[error("Dispatcher rejected task: {context}")]
    DispatchRejected {
        /// Name of the dispatcher and reason
        context: String,
    },

    /// Generic stream processing error.
    #[error("Stream processing error: {context}")]
    StreamProcessingError {
        /// Description of what went wrong
        context: String,
    },

    /// Custom error from user code.
    #[error("User error: {0}")]
    UserError(#[source] SharedError),
}

impl SpillwayError {
    /// Create an invalid configuration error with the given context
    pub fn invalid_configuration(context: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            context: context.into(),
        }
    }

    /// Wrap a broadcast failure of the worker at `index`
    pub fn routing_failure(index: usize, source: SpillwayError) -> Self {
        Self::RoutingFailure {
            index,
            source: Box::new(source),
        }
    }

    /// Wrap a failure of the demand aggregation
    pub fn aggregation_failure(source: SpillwayError) -> Self {
        Self::AggregationFailure(Box::new(source))
    }

    /// Wrap an error raised by a seed factory or fold function
    pub fn fold_failure(error: impl Error + Send + Sync + 'static) -> Self {
        Self::FoldFailure(Arc::new(error))
    }

    /// Create a dispatch rejection with the given context
    pub fn dispatch_rejected(context: impl Into<String>) -> Self {
        Self::DispatchRejected {
            context: context.into(),
        }
    }

    /// Create a stream processing error with the given context
    pub fn stream_error(context: impl Into<String>) -> Self {
        Self::StreamProcessingError {
            context: context.into(),
        }
    }

    /// Wrap a user error
    pub fn user_error(error: impl Error + Send + Sync + 'static) -> Self {
        Self::UserError(Arc::new(error))
    }

    /// Returns `true` if the error is contained to a single worker branch.
    #[must_use]
    pub const fn is_routing_failure(&self) -> bool {
        matches!(self, Self::RoutingFailure { .. })
    }

    /// Returns `true` if this error violates the credit protocol rather than
    /// reporting a processing failure.
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDemand { .. } | Self::AlreadySubscribed | Self::NotSubscribed
        )
    }
}

/// Specialized Result type for Spillway operations
pub type Result<T> = std::result::Result<T, SpillwayError>;
