#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for storage operations.
pub const TRACING_TARGET: &str = "weft_storage";

mod access;
mod config;
mod error;
mod object;
mod uri;

#[doc(hidden)]
pub mod prelude;

pub use access::{FileAccess, GZIP_ENCODING, UploadHeaders};
pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use object::ObjectFileAccess;
pub use uri::{file_name, is_remote, to_local_path};
