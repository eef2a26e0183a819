//! Common error type definitions.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of errors raised while marshalling values and editing nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Duplicate registration or otherwise inconsistent setup.
    Configuration,
    /// A value or literal does not have the shape its declared type demands.
    TypeMismatch,
    /// A value is malformed or violates an operation's preconditions.
    InvalidValue,
    /// A runtime expectation about external state did not hold.
    Assertion,
    /// A wire encoding or blob dimensionality that is not understood.
    UnsupportedFormat,
    /// No unique answer exists for a reverse type lookup.
    Lookup,
    /// The storage collaborator reported a failure.
    Storage,
    /// Serialization/deserialization error.
    Serialization,
    /// Local filesystem error.
    Io,
}

/// A structured error type shared by the weft crates.
#[derive(Debug, Error)]
#[error("{}{}", kind.as_ref(), message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Adds an already boxed source error to this error.
    pub fn with_boxed_source(mut self, source: BoxedError) -> Self {
        self.source = Some(source);
        self
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a new type mismatch error.
    pub fn type_mismatch() -> Self {
        Self::new(ErrorKind::TypeMismatch)
    }

    /// Creates a new invalid value error.
    pub fn invalid_value() -> Self {
        Self::new(ErrorKind::InvalidValue)
    }

    /// Creates a new assertion error.
    pub fn assertion() -> Self {
        Self::new(ErrorKind::Assertion)
    }

    /// Creates a new unsupported format error.
    pub fn unsupported_format() -> Self {
        Self::new(ErrorKind::UnsupportedFormat)
    }

    /// Creates a new lookup error.
    pub fn lookup() -> Self {
        Self::new(ErrorKind::Lookup)
    }

    /// Creates a new storage error.
    pub fn storage() -> Self {
        Self::new(ErrorKind::Storage)
    }

    /// Creates a new serialization error.
    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    /// Creates a new I/O error.
    pub fn io() -> Self {
        Self::new(ErrorKind::Io)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::io().with_message(err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization()
            .with_message(err.to_string())
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = Error::lookup().with_message("no transformer claims blob/SINGLE");
        assert_eq!(err.to_string(), "lookup: no transformer claims blob/SINGLE");
        assert_eq!(err.kind_str(), "lookup");
    }

    #[test]
    fn display_without_message() {
        let err = Error::type_mismatch();
        assert_eq!(err.to_string(), "type_mismatch");
    }

    #[test]
    fn io_errors_keep_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::from(io);
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
