//! Convenient re-exports for common use.

pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::literal::{
    Blob, BlobDimensionality, BlobType, Literal, LiteralType, LiteralTypeKind, Scalar, SimpleType,
};
