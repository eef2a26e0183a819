#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for marshalling operations.
pub const TRACING_TARGET: &str = "weft_types";

pub mod context;
pub mod file;
pub mod host;
pub mod opaque;
pub mod primitive;
pub mod registry;
pub mod transformer;

#[doc(hidden)]
pub mod prelude;

#[cfg(test)]
mod testing;

pub use context::{ContentSniffer, ExecutionMode, TransformContext};
pub use host::{Capability, HostType, HostValue, OpaqueObject};
pub use registry::{TypeKey, TypeRegistry};
pub use transformer::TypeTransformer;
