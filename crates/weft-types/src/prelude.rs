//! Convenient re-exports for common use.

pub use crate::context::{ContentSniffer, ExecutionMode, TransformContext};
pub use crate::file::{FileRecord, FileTransformer, FileValue, RemotePath};
pub use crate::host::{Capability, HostType, HostValue, OpaqueObject};
pub use crate::opaque::OpaqueTransformer;
pub use crate::primitive::PrimitiveTransformer;
pub use crate::registry::{TypeKey, TypeRegistry};
pub use crate::transformer::TypeTransformer;
