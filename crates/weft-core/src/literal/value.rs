//! Literal values.

use std::collections::BTreeMap;

use bytes::Bytes;
use derive_more::From;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use super::BlobType;

/// A primitive scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Integer(i64),
    FloatValue(f64),
    StringValue(String),
    Boolean(bool),
    Datetime(Timestamp),
    Duration(SignedDuration),
}

/// Marker carried by the `none_type` scalar.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Void {}

/// Blob metadata: the blob's type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    #[serde(rename = "type")]
    pub blob_type: BlobType,
}

/// Reference to content held by the storage collaborator.
///
/// The URI is opaque at this layer; whether it is remote is decided by the
/// storage capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub metadata: BlobMetadata,
    pub uri: String,
}

impl Blob {
    pub fn new(blob_type: BlobType, uri: impl Into<String>) -> Self {
        Self {
            metadata: BlobMetadata { blob_type },
            uri: uri.into(),
        }
    }

    /// Returns the blob's type tag.
    #[inline]
    pub fn blob_type(&self) -> &BlobType {
        &self.metadata.blob_type
    }
}

/// A tagged binary payload, e.g. `msgpack`-encoded records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binary {
    pub value: Bytes,
    pub tag: String,
}

/// Exactly one scalar payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
#[serde(rename_all = "snake_case")]
pub enum Scalar {
    Primitive(Primitive),
    Blob(Blob),
    Binary(Binary),
    /// Generic JSON-like struct.
    Generic(serde_json::Map<String, serde_json::Value>),
    NoneType(Void),
}

/// An ordered list of literals.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralCollection {
    pub literals: Vec<Literal>,
}

/// A string-keyed map of literals.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralMap {
    pub literals: BTreeMap<String, Literal>,
}

/// The tagged payload of a [`Literal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
#[serde(rename_all = "snake_case")]
pub enum LiteralValue {
    Scalar(Scalar),
    Collection(LiteralCollection),
    Map(LiteralMap),
}

/// Wire-stable, language-neutral value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    #[serde(flatten)]
    pub value: LiteralValue,
    /// Free-form string metadata carried alongside the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl Literal {
    pub fn new(value: impl Into<LiteralValue>) -> Self {
        Self {
            value: value.into(),
            metadata: None,
        }
    }

    pub fn scalar(scalar: impl Into<Scalar>) -> Self {
        Self::new(LiteralValue::Scalar(scalar.into()))
    }

    pub fn primitive(primitive: impl Into<Primitive>) -> Self {
        Self::scalar(Scalar::Primitive(primitive.into()))
    }

    pub fn blob(blob_type: BlobType, uri: impl Into<String>) -> Self {
        Self::scalar(Blob::new(blob_type, uri))
    }

    pub fn binary(tag: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self::scalar(Binary {
            value: value.into(),
            tag: tag.into(),
        })
    }

    pub fn generic(value: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::scalar(Scalar::Generic(value))
    }

    pub fn none() -> Self {
        Self::scalar(Void {})
    }

    pub fn collection(literals: Vec<Literal>) -> Self {
        Self::new(LiteralCollection { literals })
    }

    pub fn map(literals: BTreeMap<String, Literal>) -> Self {
        Self::new(LiteralMap { literals })
    }

    /// Replaces the literal's metadata.
    pub fn with_metadata(mut self, metadata: Option<BTreeMap<String, String>>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.value {
            LiteralValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Blob> {
        match self.as_scalar()? {
            Scalar::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&Binary> {
        match self.as_scalar()? {
            Scalar::Binary(binary) => Some(binary),
            _ => None,
        }
    }

    pub fn as_generic(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        match self.as_scalar()? {
            Scalar::Generic(generic) => Some(generic),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self.as_scalar(), Some(Scalar::NoneType(_)))
    }

    /// Short description of the runtime tag, used in error messages.
    pub fn tag_name(&self) -> &'static str {
        match &self.value {
            LiteralValue::Collection(_) => "collection",
            LiteralValue::Map(_) => "map",
            LiteralValue::Scalar(scalar) => match scalar {
                Scalar::Primitive(_) => "primitive",
                Scalar::Blob(_) => "blob",
                Scalar::Binary(_) => "binary",
                Scalar::Generic(_) => "generic",
                Scalar::NoneType(_) => "none_type",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::literal::BlobDimensionality;

    #[test]
    fn blob_literal_wire_form() {
        let literal = Literal::blob(BlobType::single("csv"), "s3://bucket/a.csv");
        let value = serde_json::to_value(&literal).unwrap();
        assert_eq!(
            value,
            json!({
                "scalar": {
                    "blob": {
                        "metadata": {"type": {"format": "csv", "dimensionality": "SINGLE"}},
                        "uri": "s3://bucket/a.csv"
                    }
                }
            })
        );
    }

    #[test]
    fn literal_metadata_survives_serde() {
        let mut metadata = BTreeMap::new();
        metadata.insert("owner".to_owned(), "team-a".to_owned());
        let literal = Literal::blob(
            BlobType::new("", BlobDimensionality::Multipart),
            "gs://bucket/dir",
        )
        .with_metadata(Some(metadata.clone()));

        let text = serde_json::to_string(&literal).unwrap();
        let back: Literal = serde_json::from_str(&text).unwrap();
        assert_eq!(back.metadata, Some(metadata));
        assert_eq!(back, literal);
    }

    #[test]
    fn none_type_serializes_as_empty_object() {
        let value = serde_json::to_value(Literal::none()).unwrap();
        assert_eq!(value, json!({"scalar": {"none_type": {}}}));
        assert!(Literal::none().is_none());
    }

    #[test]
    fn accessors_match_tags() {
        let binary = Literal::binary("msgpack", vec![0x80]);
        assert_eq!(binary.tag_name(), "binary");
        assert_eq!(binary.as_binary().map(|b| b.tag.as_str()), Some("msgpack"));
        assert!(binary.as_blob().is_none());

        let generic = Literal::generic(serde_json::Map::new());
        assert_eq!(generic.tag_name(), "generic");
        assert!(generic.as_generic().is_some());
    }
}
