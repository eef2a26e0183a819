//! Storage configuration.

use std::path::PathBuf;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Directory name used under the system temp dir when no sandbox is set.
const DEFAULT_SANDBOX_DIR: &str = "weft";

/// Sub-directory of the sandbox used as raw output prefix when none is set.
const DEFAULT_RAW_OUTPUT_DIR: &str = "raw";

/// Configuration for the storage collaborator with sensible defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct StorageConfig {
    /// Root under which auto-named uploads are placed, e.g. `s3://bucket/raw`.
    #[cfg_attr(
        feature = "config",
        arg(long = "raw-output-prefix", env = "WEFT_RAW_OUTPUT_PREFIX")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output_prefix: Option<String>,

    /// Local directory for scratch files and downloads.
    #[cfg_attr(
        feature = "config",
        arg(long = "local-sandbox-dir", env = "WEFT_LOCAL_SANDBOX_DIR")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_sandbox_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Creates a new storage configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the local sandbox directory, using the default if not set.
    #[must_use]
    pub fn local_sandbox_dir(&self) -> PathBuf {
        self.local_sandbox_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_SANDBOX_DIR))
    }

    /// Returns the raw output prefix, defaulting to a sandbox sub-directory.
    #[must_use]
    pub fn raw_output_prefix(&self) -> String {
        match &self.raw_output_prefix {
            Some(prefix) => prefix.trim_end_matches('/').to_owned(),
            None => self
                .local_sandbox_dir()
                .join(DEFAULT_RAW_OUTPUT_DIR)
                .to_string_lossy()
                .into_owned(),
        }
    }

    /// Set the raw output prefix.
    #[must_use]
    pub fn with_raw_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.raw_output_prefix = Some(prefix.into());
        self
    }

    /// Set the local sandbox directory.
    #[must_use]
    pub fn with_local_sandbox_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_sandbox_dir = Some(dir.into());
        self
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(prefix) = &self.raw_output_prefix {
            if prefix.trim_end_matches('/').is_empty() {
                return Err("Raw output prefix cannot be empty".to_string());
            }
        }
        if let Some(dir) = &self.local_sandbox_dir {
            if dir.as_os_str().is_empty() {
                return Err("Local sandbox directory cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config() {
        let config = StorageConfig::new();
        assert_eq!(
            config.local_sandbox_dir(),
            std::env::temp_dir().join(DEFAULT_SANDBOX_DIR)
        );
        assert!(config.raw_output_prefix().ends_with(DEFAULT_RAW_OUTPUT_DIR));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = StorageConfig::new()
            .with_raw_output_prefix("s3://bucket/raw/")
            .with_local_sandbox_dir("/var/tmp/sandbox");
        assert_eq!(config.raw_output_prefix(), "s3://bucket/raw");
        assert_eq!(config.local_sandbox_dir(), PathBuf::from("/var/tmp/sandbox"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(StorageConfig::new().with_raw_output_prefix("/").validate().is_err());
        assert!(StorageConfig::new().with_local_sandbox_dir("").validate().is_err());
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: StorageConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StorageConfig::new());
    }
}
