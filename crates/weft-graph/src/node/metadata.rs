//! Per-node execution metadata.

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

/// Fixed number of retries on failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryStrategy {
    pub retries: u32,
}

impl RetryStrategy {
    pub fn new(retries: u32) -> Self {
        Self { retries }
    }
}

/// Metadata the engine reads for every node execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Display name.
    pub name: String,
    /// Execution deadline; zero or absent means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<SignedDuration>,
    #[serde(default)]
    pub retries: RetryStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interruptible: Option<bool>,
    #[serde(default)]
    pub cacheable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_version: Option<String>,
    #[serde(default)]
    pub cache_serializable: bool,
}

impl NodeMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: SignedDuration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = RetryStrategy::new(retries);
        self
    }

    #[must_use]
    pub fn with_interruptible(mut self, interruptible: bool) -> Self {
        self.interruptible = Some(interruptible);
        self
    }
}
