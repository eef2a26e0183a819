//! Convenient re-exports for common use.

pub use crate::entity::{RunEntity, TaskConfig};
pub use crate::error::{GraphError, GraphResult};
pub use crate::graph::WorkflowGraph;
pub use crate::node::{Binding, CachePolicy, NodeHandle, Overrides, Timeout};
pub use crate::promise::Promise;
pub use crate::resources::Resources;
