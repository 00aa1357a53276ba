// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// Construction-time settings shared by all stages.
///
/// ```
/// use spillway_core::StageConfig;
///
/// let config = StageConfig::new().with_name("ingest").with_backlog_limit(256);
/// assert_eq!(config.name(), Some("ingest"));
/// assert_eq!(config.backlog_limit(), Some(256));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageConfig {
    name: Option<String>,
    backlog_limit: Option<usize>,
}

impl StageConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name used in logs and in the stage's `Display` output.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Maximum number of elements a stage holds while its downstream has no
    /// credit. Exceeding it fails the broadcast with
    /// [`SpillwayError::BacklogOverflow`](crate::SpillwayError::BacklogOverflow).
    /// Unlimited when unset.
    #[must_use]
    pub fn with_backlog_limit(mut self, limit: usize) -> Self {
        self.backlog_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn backlog_limit(&self) -> Option<usize> {
        self.backlog_limit
    }

    pub(crate) fn name_or(&self, default: &str) -> String {
        self.name.clone().unwrap_or_else(|| default.to_string())
    }
}
