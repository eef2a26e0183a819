//! Storage error types.

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The storage configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The URI could not be parsed or addresses nothing.
    #[error("invalid uri: {0}")]
    InvalidUri(String),

    /// File or object not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Read operation failed.
    #[error("read failed: {0}")]
    Read(String),

    /// Write operation failed.
    #[error("write failed: {0}")]
    Write(String),

    /// Local filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(object_store::Error),
}

impl StorageError {
    /// Creates a new invalid URI error.
    pub fn invalid_uri(uri: impl Into<String>) -> Self {
        Self::InvalidUri(uri.into())
    }

    /// Creates a new not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Creates a new read error.
    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    /// Creates a new write error.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Returns `true` if the error indicates a missing object or file.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            Self::Backend(err) => matches!(err, object_store::Error::NotFound { .. }),
            _ => false,
        }
    }
}

impl From<object_store::Error> for StorageError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => Self::NotFound(path),
            other => Self::Backend(other),
        }
    }
}

impl From<StorageError> for weft_core::Error {
    fn from(err: StorageError) -> Self {
        weft_core::Error::storage()
            .with_message(err.to_string())
            .with_source(err)
    }
}
