//! Wire-stable literal model.
//!
//! A [`LiteralType`] tags the shape of a value and a [`Literal`] carries the
//! value. Transformers produce literals against a declared literal type, and
//! [`LiteralType::accepts`] checks that the two agree.

mod types;
mod value;

pub use types::{BlobDimensionality, BlobType, LiteralType, LiteralTypeKind, SimpleType};
pub use value::{
    Binary, Blob, BlobMetadata, Literal, LiteralCollection, LiteralMap, LiteralValue, Primitive,
    Scalar, Void,
};
