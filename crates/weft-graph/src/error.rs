//! Graph error types.

use thiserror::Error;
use weft_core::ErrorKind;

use crate::node::NodeHandle;

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised while authoring a workflow graph.
///
/// All of them are programmer errors caught at declaration time.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A well-typed but semantically invalid value.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A deferred value used where only static values are legal.
    #[error("{0}")]
    Assertion(String),

    /// The handle does not belong to this graph.
    #[error("node {0} does not exist")]
    NodeNotFound(NodeHandle),

    /// Two nodes share an id.
    #[error("node id `{0}` is used more than once")]
    DuplicateNodeId(String),

    /// The edge would close a cycle.
    #[error("`{from}` cannot run before `{to}`: the graph would contain a cycle")]
    Cycle {
        /// Id of the upstream node.
        from: String,
        /// Id of the downstream node.
        to: String,
    },
}

impl GraphError {
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue(message.into())
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }

    /// Position of this error in the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidValue(_) | Self::Cycle { .. } => ErrorKind::InvalidValue,
            Self::Assertion(_) => ErrorKind::Assertion,
            Self::NodeNotFound(_) => ErrorKind::Lookup,
            Self::DuplicateNodeId(_) => ErrorKind::Configuration,
        }
    }
}

impl From<GraphError> for weft_core::Error {
    fn from(error: GraphError) -> Self {
        weft_core::Error::new(error.kind())
            .with_message(error.to_string())
            .with_source(error)
    }
}
