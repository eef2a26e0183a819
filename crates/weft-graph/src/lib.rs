#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for graph authoring.
pub const TRACING_TARGET: &str = "weft_graph";

mod dnsify;
mod entity;
mod error;
mod graph;
pub mod node;
mod promise;
pub mod resources;
mod spec;
mod template;

#[doc(hidden)]
pub mod prelude;

#[cfg(test)]
mod testing;

pub use dnsify::dnsify;
pub use entity::{RunEntity, RunEntityKind, TaskConfig};
pub use error::{GraphError, GraphResult};
pub use graph::{NodeRef, WorkflowGraph};
pub use node::{
    Binding, BindingData, Cache, CachePolicy, Node, NodeHandle, NodeMetadata, Overrides,
    OverridesBuilder, Timeout,
};
pub use promise::{Param, Promise};
pub use resources::{Accelerator, ResourceEntry, ResourceName, Resources, SharedMemory};
pub use spec::{
    BindingDataSpec, BindingSpec, NodeOverridesSpec, NodeSpec, OutputReference, WorkflowSpec,
};
pub use template::PodTemplate;
