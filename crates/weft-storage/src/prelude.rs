//! Convenient re-exports for common use.

pub use crate::access::{FileAccess, UploadHeaders};
pub use crate::config::StorageConfig;
pub use crate::error::{StorageError, StorageResult};
pub use crate::object::ObjectFileAccess;
