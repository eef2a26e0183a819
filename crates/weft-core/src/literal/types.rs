//! Literal type tags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::{Literal, LiteralValue, Primitive, Scalar};

/// Primitive shapes a literal may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SimpleType {
    None,
    Integer,
    Float,
    String,
    Boolean,
    Datetime,
    Duration,
    /// Generic JSON-like struct.
    Struct,
    /// Tagged binary payload.
    Binary,
}

/// Whether a blob is a single object or a directory-like collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BlobDimensionality {
    #[default]
    Single,
    Multipart,
}

/// Shape of a blob: a format tag plus its dimensionality.
///
/// An empty `format` means "untyped".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobType {
    /// Format tag, for example `csv` or the opaque-value sentinel.
    #[serde(default)]
    pub format: String,
    /// Single object or multipart.
    #[serde(default)]
    pub dimensionality: BlobDimensionality,
}

impl BlobType {
    /// Creates a blob type with the given format and dimensionality.
    pub fn new(format: impl Into<String>, dimensionality: BlobDimensionality) -> Self {
        Self {
            format: format.into(),
            dimensionality,
        }
    }

    /// Creates a single-object blob type.
    pub fn single(format: impl Into<String>) -> Self {
        Self::new(format, BlobDimensionality::Single)
    }

    /// Returns `true` when the format tag is empty.
    #[inline]
    pub fn is_untyped(&self) -> bool {
        self.format.is_empty()
    }
}

/// Variants of a [`LiteralType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralTypeKind {
    Simple(SimpleType),
    Blob(BlobType),
    CollectionType(Box<LiteralType>),
    MapValueType(Box<LiteralType>),
}

/// Immutable tag describing the shape of a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralType {
    #[serde(flatten)]
    pub kind: LiteralTypeKind,
    /// Free-form annotations, e.g. the host type name of an opaque value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl LiteralType {
    /// Wraps a kind without metadata.
    pub fn new(kind: LiteralTypeKind) -> Self {
        Self {
            kind,
            metadata: None,
        }
    }

    pub fn simple(simple: SimpleType) -> Self {
        Self::new(LiteralTypeKind::Simple(simple))
    }

    pub fn blob(format: impl Into<String>, dimensionality: BlobDimensionality) -> Self {
        Self::new(LiteralTypeKind::Blob(BlobType::new(format, dimensionality)))
    }

    pub fn collection(item: LiteralType) -> Self {
        Self::new(LiteralTypeKind::CollectionType(Box::new(item)))
    }

    pub fn map(value: LiteralType) -> Self {
        Self::new(LiteralTypeKind::MapValueType(Box::new(value)))
    }

    /// Attaches a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Returns a metadata value by key.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(key).map(String::as_str)
    }

    /// Returns the blob shape when this is a blob type.
    pub fn as_blob(&self) -> Option<&BlobType> {
        match &self.kind {
            LiteralTypeKind::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    /// Returns `true` if `literal`'s runtime tag matches this type.
    ///
    /// Blob formats only have to agree when both sides carry one; an untyped
    /// blob type accepts any single-object blob and vice versa.
    pub fn accepts(&self, literal: &Literal) -> bool {
        match (&self.kind, &literal.value) {
            (LiteralTypeKind::Simple(simple), LiteralValue::Scalar(scalar)) => {
                simple_accepts(*simple, scalar)
            }
            (LiteralTypeKind::Blob(expected), LiteralValue::Scalar(Scalar::Blob(blob))) => {
                let actual = &blob.metadata.blob_type;
                expected.dimensionality == actual.dimensionality
                    && (expected.is_untyped()
                        || actual.is_untyped()
                        || expected.format == actual.format)
            }
            (LiteralTypeKind::CollectionType(item), LiteralValue::Collection(collection)) => {
                collection.literals.iter().all(|lit| item.accepts(lit))
            }
            (LiteralTypeKind::MapValueType(value), LiteralValue::Map(map)) => {
                map.literals.values().all(|lit| value.accepts(lit))
            }
            _ => false,
        }
    }
}

fn simple_accepts(simple: SimpleType, scalar: &Scalar) -> bool {
    match (simple, scalar) {
        (SimpleType::None, Scalar::NoneType(_)) => true,
        (SimpleType::Struct, Scalar::Generic(_)) => true,
        (SimpleType::Binary, Scalar::Binary(_)) => true,
        (SimpleType::Integer, Scalar::Primitive(Primitive::Integer(_))) => true,
        (SimpleType::Float, Scalar::Primitive(Primitive::FloatValue(_))) => true,
        (SimpleType::String, Scalar::Primitive(Primitive::StringValue(_))) => true,
        (SimpleType::Boolean, Scalar::Primitive(Primitive::Boolean(_))) => true,
        (SimpleType::Datetime, Scalar::Primitive(Primitive::Datetime(_))) => true,
        (SimpleType::Duration, Scalar::Primitive(Primitive::Duration(_))) => true,
        _ => false,
    }
}
