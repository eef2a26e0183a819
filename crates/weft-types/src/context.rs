//! Per-call context handed to transformers.

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use weft_core::Result;
use weft_storage::FileAccess;

/// Whether the SDK is simulating a run on the local machine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Local simulation: file values without an explicit destination are
    /// never uploaded.
    Local,
    /// Values are destined for the remote engine.
    #[default]
    Remote,
}

/// Detects the real MIME type of a local file from its content.
pub trait ContentSniffer: Debug + Send + Sync {
    /// Returns the MIME type of `path`, or `None` when it cannot be told.
    fn sniff_mime_type(&self, path: &Path) -> Result<Option<String>>;
}

/// Collaborators and execution state shared by one marshalling call.
#[derive(Debug, Clone)]
pub struct TransformContext {
    file_access: Arc<dyn FileAccess>,
    mode: ExecutionMode,
    sniffer: Option<Arc<dyn ContentSniffer>>,
}

impl TransformContext {
    /// Creates a remote-mode context without content sniffing.
    pub fn new(file_access: Arc<dyn FileAccess>) -> Self {
        Self {
            file_access,
            mode: ExecutionMode::default(),
            sniffer: None,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_sniffer(mut self, sniffer: Arc<dyn ContentSniffer>) -> Self {
        self.sniffer = Some(sniffer);
        self
    }

    #[inline]
    pub fn file_access(&self) -> &Arc<dyn FileAccess> {
        &self.file_access
    }

    #[inline]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    #[inline]
    pub fn is_local_execution(&self) -> bool {
        self.mode == ExecutionMode::Local
    }

    #[inline]
    pub fn sniffer(&self) -> Option<&Arc<dyn ContentSniffer>> {
        self.sniffer.as_ref()
    }
}
