//! Fallback transformer storing values with a general-purpose codec.

use async_trait::async_trait;
use ciborium::Value;
use sha2::{Digest, Sha256};
use weft_core::literal::{BlobDimensionality, BlobType, Literal, LiteralType};
use weft_core::{Error, Result};
use weft_storage::UploadHeaders;

use crate::TRACING_TARGET;
use crate::context::TransformContext;
use crate::host::{HostType, HostValue, OpaqueObject};
use crate::transformer::TypeTransformer;

/// Blob format reserved for opaque values.
pub const OPAQUE_FORMAT: &str = "OpaqueValue";

/// Literal type metadata key holding the declared host type name.
pub const HOST_TYPE_METADATA_KEY: &str = "host_type";

/// Universal fallback: serializes any host value to CBOR, stores the bytes
/// in a digest-named blob and reads them back on the way in.
#[derive(Debug, Default, Clone)]
pub struct OpaqueTransformer;

impl OpaqueTransformer {
    pub fn new() -> Self {
        Self
    }

    fn encode(value: &HostValue) -> Result<Value> {
        let value = match value {
            HostValue::None => {
                return Err(Error::assertion().with_message("cannot serialize a none value"));
            }
            HostValue::Int(v) => Value::Integer((*v).into()),
            HostValue::Float(v) => Value::Float(*v),
            HostValue::Bool(v) => Value::Bool(*v),
            HostValue::Str(v) => Value::Text(v.clone()),
            HostValue::Datetime(v) => Value::Text(v.to_string()),
            HostValue::Duration(v) => Value::Text(v.to_string()),
            HostValue::Path(v) => Value::Text(v.to_string_lossy().into_owned()),
            HostValue::File(v) => Value::Text(v.path().to_owned()),
            HostValue::Opaque(object) => object.value.clone(),
        };
        Ok(value)
    }
}

#[async_trait]
impl TypeTransformer for OpaqueTransformer {
    fn name(&self) -> &str {
        "opaque"
    }

    fn get_literal_type(&self, host_type: &HostType) -> Result<LiteralType> {
        Ok(
            LiteralType::blob(OPAQUE_FORMAT, BlobDimensionality::Single)
                .with_metadata(HOST_TYPE_METADATA_KEY, host_type.name()),
        )
    }

    async fn to_literal(
        &self,
        ctx: &TransformContext,
        value: &HostValue,
        host_type: &HostType,
        _expected: &LiteralType,
    ) -> Result<Literal> {
        let encoded = Self::encode(value)?;
        let mut bytes = Vec::new();
        ciborium::into_writer(&encoded, &mut bytes).map_err(|err| {
            Error::serialization()
                .with_message(format!("cannot serialize {host_type}: {err}"))
                .with_source(err)
        })?;

        let digest = hex::encode(Sha256::digest(&bytes));
        let access = ctx.file_access();
        let local = access.local_scratch_path(Some(digest.as_str()));
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&local, &bytes).await?;

        let uri = access.put_raw_data(&local, &UploadHeaders::default()).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            host_type = %host_type,
            digest = %digest,
            uri = %uri,
            "Stored opaque value"
        );
        Ok(Literal::blob(BlobType::single(OPAQUE_FORMAT), uri))
    }

    async fn to_host_value(
        &self,
        ctx: &TransformContext,
        literal: &Literal,
        expected: &HostType,
    ) -> Result<HostValue> {
        let blob = literal.as_blob().ok_or_else(|| {
            Error::type_mismatch().with_message(format!(
                "cannot read {expected} from a {} literal",
                literal.tag_name()
            ))
        })?;

        let access = ctx.file_access();
        let local = if access.is_remote(&blob.uri) {
            let local = access.local_scratch_path(Some(blob.uri.as_str()));
            access.get_data(&blob.uri, &local).await?;
            local
        } else {
            weft_storage::to_local_path(&blob.uri)?
        };

        let bytes = tokio::fs::read(&local).await?;
        let value: Value = ciborium::from_reader(bytes.as_slice()).map_err(|err| {
            Error::serialization()
                .with_message(format!("cannot deserialize {expected} from {}: {err}", blob.uri))
                .with_source(err)
        })?;

        Ok(HostValue::Opaque(OpaqueObject {
            type_name: expected.name().to_owned(),
            value,
        }))
    }

    fn guess_host_type(&self, literal_type: &LiteralType) -> Result<HostType> {
        match literal_type.as_blob() {
            Some(blob)
                if blob.dimensionality == BlobDimensionality::Single
                    && blob.format == OPAQUE_FORMAT =>
            {
                Ok(HostType::opaque())
            }
            _ => Err(Error::lookup().with_message(format!(
                "transformer `{}` cannot reverse {literal_type:?}",
                self.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use weft_core::ErrorKind;

    use super::*;
    use crate::testing::TestBed;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Checkpoint {
        step: u32,
        loss: f64,
        tags: Vec<String>,
    }

    #[tokio::test]
    async fn round_trip_through_remote_storage() {
        let bed = TestBed::new();
        let transformer = OpaqueTransformer::new();
        let host_type = HostType::of::<Checkpoint>();
        let checkpoint = Checkpoint {
            step: 7,
            loss: 0.25,
            tags: vec!["best".into()],
        };

        let expected = transformer.get_literal_type(&host_type).unwrap();
        assert_eq!(
            expected.metadata_value(HOST_TYPE_METADATA_KEY),
            Some(host_type.name())
        );

        let value = HostValue::Opaque(OpaqueObject::encode(&checkpoint).unwrap());
        let literal = transformer
            .to_literal(&bed.ctx, &value, &host_type, &expected)
            .await
            .unwrap();
        assert!(expected.accepts(&literal));
        let blob = literal.as_blob().unwrap();
        assert_eq!(blob.blob_type().format, OPAQUE_FORMAT);
        assert!(blob.uri.starts_with("s3://bucket/raw/"));
        assert_eq!(bed.access.put_count(), 1);

        let back = transformer
            .to_host_value(&bed.ctx, &literal, &host_type)
            .await
            .unwrap();
        let object = back.as_opaque().unwrap();
        assert_eq!(object.type_name, host_type.name());
        assert_eq!(object.decode::<Checkpoint>().unwrap(), checkpoint);
        assert_eq!(bed.access.get_count(), 1);
    }

    #[tokio::test]
    async fn identical_values_share_a_digest_name() {
        let bed = TestBed::new();
        let transformer = OpaqueTransformer::new();
        let host_type = HostType::new("Counter");
        let expected = transformer.get_literal_type(&host_type).unwrap();

        let a = transformer
            .to_literal(&bed.ctx, &HostValue::Int(42), &host_type, &expected)
            .await
            .unwrap();
        let b = transformer
            .to_literal(&bed.ctx, &HostValue::Int(42), &host_type, &expected)
            .await
            .unwrap();
        let name = |l: &Literal| l.as_blob().unwrap().uri.rsplit('/').next().unwrap().to_owned();
        assert_eq!(name(&a), name(&b));
        assert_eq!(name(&a).len(), 64);
    }

    #[tokio::test]
    async fn none_is_rejected() {
        let bed = TestBed::new();
        let transformer = OpaqueTransformer::new();
        let host_type = HostType::new("Anything");
        let expected = transformer.get_literal_type(&host_type).unwrap();
        let err = transformer
            .to_literal(&bed.ctx, &HostValue::None, &host_type, &expected)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Assertion);
        assert_eq!(bed.access.put_count(), 0);
    }

    #[test]
    fn guess_claims_only_the_sentinel_format() {
        let transformer = OpaqueTransformer::new();
        let opaque = LiteralType::blob(OPAQUE_FORMAT, BlobDimensionality::Single);
        assert_eq!(transformer.guess_host_type(&opaque).unwrap(), HostType::opaque());

        let csv = LiteralType::blob("csv", BlobDimensionality::Single);
        assert_eq!(
            transformer.guess_host_type(&csv).unwrap_err().kind(),
            ErrorKind::Lookup
        );
    }
}
