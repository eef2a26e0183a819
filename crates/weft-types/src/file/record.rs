//! Structured record form of a file value: `{"path", "metadata"?}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use weft_core::literal::{Binary, BlobType, Literal};
use weft_core::{Error, Result};

/// Binary tag of message-pack encoded records.
pub const MSGPACK_TAG: &str = "msgpack";

/// A file value flattened to its path and metadata.
///
/// This is the shape files take when nested in structured values and sent
/// as a binary (`msgpack`) or generic literal.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl FileRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Option<BTreeMap<String, String>>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Decodes a binary literal payload; only the `msgpack` tag is known.
    pub fn from_binary(binary: &Binary) -> Result<Self> {
        if binary.tag != MSGPACK_TAG {
            return Err(Error::unsupported_format()
                .with_message(format!("unsupported binary format: `{}`", binary.tag)));
        }
        rmp_serde::from_slice(&binary.value).map_err(|err| {
            Error::serialization()
                .with_message(format!("invalid msgpack file record: {err}"))
                .with_source(err)
        })
    }

    /// Reads a generic (JSON struct) literal payload.
    pub fn from_generic(generic: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(generic.clone())).map_err(|err| {
            Error::serialization()
                .with_message(format!("invalid file record: {err}"))
                .with_source(err)
        })
    }

    /// Encodes the record as a `msgpack` binary literal.
    pub fn to_binary(&self) -> Result<Literal> {
        let bytes = rmp_serde::to_vec_named(self).map_err(|err| {
            Error::serialization()
                .with_message(format!("cannot encode file record: {err}"))
                .with_source(err)
        })?;
        Ok(Literal::binary(MSGPACK_TAG, bytes))
    }

    /// Encodes the record as a generic literal.
    pub fn to_generic(&self) -> Result<Literal> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(Literal::generic(map)),
            _ => Err(Error::serialization().with_message("file record is not a JSON object")),
        }
    }

    /// Rebuilds the untyped single-file blob literal this record describes.
    pub fn into_blob_literal(self) -> Result<Literal> {
        let path = self
            .path
            .ok_or_else(|| Error::invalid_value().with_message("file path should not be null"))?;
        Ok(Literal::blob(BlobType::single(""), path).with_metadata(self.metadata))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn msgpack_payload_uses_named_fields() {
        let record = FileRecord::new("s3://bucket/a.csv");
        let literal = record.to_binary().unwrap();
        let binary = literal.as_binary().unwrap();
        assert_eq!(binary.tag, MSGPACK_TAG);

        let decoded: serde_json::Value = rmp_serde::from_slice(&binary.value).unwrap();
        assert_eq!(decoded, json!({"path": "s3://bucket/a.csv"}));
        assert_eq!(FileRecord::from_binary(binary).unwrap(), record);
    }

    #[test]
    fn unknown_binary_tag_is_unsupported() {
        let literal = Literal::binary("protobuf", vec![1, 2, 3]);
        let err = FileRecord::from_binary(literal.as_binary().unwrap()).unwrap_err();
        assert_eq!(err.kind(), weft_core::ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn generic_payload_with_metadata() {
        let value = json!({"path": "/tmp/a.txt", "metadata": {"k": "v"}});
        let serde_json::Value::Object(map) = value else {
            unreachable!()
        };
        let record = FileRecord::from_generic(&map).unwrap();
        assert_eq!(record.path.as_deref(), Some("/tmp/a.txt"));
        assert_eq!(
            record.metadata.as_ref().and_then(|m| m.get("k")).map(String::as_str),
            Some("v")
        );

        let literal = record.into_blob_literal().unwrap();
        assert_eq!(literal.as_blob().unwrap().uri, "/tmp/a.txt");
        assert!(literal.metadata.is_some());
    }

    #[test]
    fn missing_path_is_invalid() {
        let err = FileRecord::default().into_blob_literal().unwrap_err();
        assert_eq!(err.kind(), weft_core::ErrorKind::InvalidValue);
    }
}
