//! Transformer between file values and single-object blob literals.

use std::path::Path;

use async_trait::async_trait;
use weft_core::literal::{BlobDimensionality, BlobType, Literal, LiteralType, Scalar};
use weft_core::{Error, Result};
use weft_storage::UploadHeaders;

use super::mime::{expected_mime_types, matches_any};
use super::record::FileRecord;
use super::value::{FileValue, RemotePath};
use crate::TRACING_TARGET;
use crate::context::TransformContext;
use crate::host::{Capability, HostType, HostValue};
use crate::opaque::OPAQUE_FORMAT;
use crate::transformer::TypeTransformer;

/// Suffix of gzip-compressed sources.
const GZIP_SUFFIX: &str = ".gz";

/// Declared type of a conversion, as far as files are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Declared<'a> {
    /// `File` or `File[ext]`; the extension is empty when untyped.
    File(&'a str),
    /// The untyped path-like capability.
    PathLike,
}

impl<'a> Declared<'a> {
    fn of(host_type: &'a HostType) -> Result<Self> {
        if host_type.is_file() {
            Ok(Self::File(host_type.file_extension()))
        } else if host_type.has_capability(Capability::PathLike) {
            Ok(Self::PathLike)
        } else {
            Err(Error::type_mismatch().with_message(format!(
                "incorrect type {host_type}, must be either a file type or path-like"
            )))
        }
    }

    fn format(self) -> &'a str {
        match self {
            Self::File(extension) => extension,
            Self::PathLike => "",
        }
    }
}

/// Converts [`FileValue`]s, strings and paths into blob literals and back.
///
/// Uploads only happen in [`to_literal`](TypeTransformer::to_literal), and
/// values produced from remote literals download lazily.
#[derive(Debug, Default, Clone)]
pub struct FileTransformer;

impl FileTransformer {
    pub fn new() -> Self {
        Self
    }

    fn blob_type(format: &str) -> BlobType {
        BlobType::new(format, BlobDimensionality::Single)
    }

    /// Headers implied by the source file name.
    pub fn additional_headers(source_path: &str) -> UploadHeaders {
        if source_path.ends_with(GZIP_SUFFIX) {
            UploadHeaders::gzip()
        } else {
            UploadHeaders::default()
        }
    }

    /// Checks local content against the declared extension's MIME family.
    ///
    /// Skipped for untyped declarations, remote sources and contexts without
    /// a sniffer. With a sniffer, an unknown extension is a lookup error.
    fn validate_content(ctx: &TransformContext, extension: &str, source_path: &str) -> Result<()> {
        if extension.is_empty() || ctx.file_access().is_remote(source_path) {
            return Ok(());
        }
        let Some(sniffer) = ctx.sniffer() else {
            tracing::debug!(
                target: TRACING_TARGET,
                path = %source_path,
                "No content sniffer configured, skipping file type validation"
            );
            return Ok(());
        };
        let Some(expected) = expected_mime_types(extension) else {
            return Err(Error::lookup().with_message(format!(
                "no known MIME type for extension `{extension}`"
            )));
        };

        let path = weft_storage::to_local_path(source_path)?;
        let Some(actual) = sniffer.sniff_mime_type(&path)? else {
            return Ok(());
        };
        if !matches_any(&actual, &expected) {
            let expected: Vec<&str> = expected.iter().map(|m| m.essence_str()).collect();
            return Err(Error::invalid_value().with_message(format!(
                "incorrect file type, expected {expected:?}, got {actual}"
            )));
        }
        Ok(())
    }

    /// Upload decision for string and path sources.
    ///
    /// Local sources declared as a file type must name an existing regular
    /// file; a missing path is a value error, a missing string a type error.
    async fn plain_should_upload(
        ctx: &TransformContext,
        declared: Declared<'_>,
        source_path: &str,
        structured: bool,
    ) -> Result<bool> {
        let Declared::File(extension) = declared else {
            return Ok(false);
        };
        Self::validate_content(ctx, extension, source_path)?;
        if ctx.file_access().is_remote(source_path) {
            return Ok(false);
        }

        let local = weft_storage::to_local_path(source_path)?;
        let is_file = tokio::fs::metadata(&local)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            let error = if structured {
                Error::invalid_value()
            } else {
                Error::type_mismatch()
            };
            return Err(error.with_message(format!(
                "error converting {source_path} because it's not a file"
            )));
        }
        Ok(!ctx.is_local_execution())
    }

    /// Converts `value` to its record form through [`to_literal`](TypeTransformer::to_literal).
    pub async fn to_record(
        &self,
        ctx: &TransformContext,
        value: &HostValue,
        host_type: &HostType,
    ) -> Result<FileRecord> {
        let expected = self.get_literal_type(host_type)?;
        let literal = self.to_literal(ctx, value, host_type, &expected).await?;
        let blob = literal.as_blob().ok_or_else(|| {
            Error::type_mismatch().with_message("file literal is not a blob")
        })?;
        Ok(FileRecord::new(blob.uri.clone()).with_metadata(literal.metadata.clone()))
    }

    /// Converts a record back into a file value of `expected`.
    pub async fn from_record(
        &self,
        ctx: &TransformContext,
        record: FileRecord,
        expected: &HostType,
    ) -> Result<HostValue> {
        let literal = record.into_blob_literal()?;
        self.blob_to_host_value(ctx, &literal, expected).await
    }

    async fn blob_to_host_value(
        &self,
        ctx: &TransformContext,
        literal: &Literal,
        expected: &HostType,
    ) -> Result<HostValue> {
        let blob = literal.as_blob().ok_or_else(|| {
            Error::type_mismatch().with_message(format!(
                "cannot convert from a {} literal to {expected}",
                literal.tag_name()
            ))
        })?;
        if blob.blob_type().dimensionality != BlobDimensionality::Single {
            return Err(Error::unsupported_format()
                .with_message(format!("{} is not a file", blob.uri)));
        }

        let uri = blob.uri.as_str();
        let metadata = literal.metadata.clone();
        let access = ctx.file_access();
        let remote = access.is_remote(uri);

        if !remote {
            let is_file = match weft_storage::to_local_path(uri) {
                Ok(path) => tokio::fs::metadata(&path)
                    .await
                    .map(|m| m.is_file())
                    .unwrap_or(false),
                Err(_) => false,
            };
            if !is_file {
                return Err(Error::assertion().with_message(format!(
                    "cannot convert to {expected}, expected a file, but {uri} is not a file"
                )));
            }
        }

        let declared = Declared::of(expected)?;
        let value = match declared {
            Declared::PathLike => FileValue::unmanaged(uri).with_metadata(metadata),
            Declared::File(extension) if !remote => FileValue::new(Path::new(uri))
                .with_extension(extension)
                .with_metadata(metadata),
            Declared::File(extension) => {
                let local = access.local_scratch_path(Some(uri));
                FileValue::remote(uri, local, access.clone())
                    .with_extension(extension)
                    .with_metadata(metadata)
            }
        };
        Ok(HostValue::File(value))
    }
}

#[async_trait]
impl TypeTransformer for FileTransformer {
    fn name(&self) -> &str {
        "file"
    }

    fn get_literal_type(&self, host_type: &HostType) -> Result<LiteralType> {
        let declared = Declared::of(host_type)?;
        Ok(LiteralType::blob(declared.format(), BlobDimensionality::Single))
    }

    async fn to_literal(
        &self,
        ctx: &TransformContext,
        value: &HostValue,
        host_type: &HostType,
        _expected: &LiteralType,
    ) -> Result<Literal> {
        if value.is_none() {
            return Err(Error::type_mismatch().with_message("none cannot be converted to a file"));
        }
        let declared = Declared::of(host_type)?;
        let blob_type = Self::blob_type(declared.format());
        let access = ctx.file_access();

        let (source_path, destination, metadata, should_upload) = match value {
            HostValue::File(file) => {
                if let Some(remote_source) = file.remote_source() {
                    return Ok(Literal::blob(blob_type, remote_source)
                        .with_metadata(file.metadata().cloned()));
                }

                let source_path = file.path().to_owned();
                Self::validate_content(ctx, declared.format(), &source_path)?;

                let should_upload = if *file.remote_path() == RemotePath::Disabled
                    || access.is_remote(&source_path)
                {
                    false
                } else if declared == Declared::PathLike {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        path = %source_path,
                        declared = %host_type,
                        "Converting a file value while only a path-like type was declared, skipping upload"
                    );
                    false
                } else {
                    !(ctx.is_local_execution() && file.remote_path().explicit().is_none())
                };

                (
                    source_path,
                    file.remote_path().explicit().map(str::to_owned),
                    file.metadata().cloned(),
                    should_upload,
                )
            }
            HostValue::Str(text) => {
                let should_upload = Self::plain_should_upload(ctx, declared, text, false).await?;
                (text.clone(), None, None, should_upload)
            }
            HostValue::Path(path) => {
                let source_path = path.to_string_lossy().into_owned();
                let should_upload =
                    Self::plain_should_upload(ctx, declared, &source_path, true).await?;
                (source_path, None, None, should_upload)
            }
            other => {
                return Err(Error::type_mismatch().with_message(format!(
                    "expected a file value, string or path, received {}",
                    other.kind_name()
                )));
            }
        };

        if !should_upload {
            tracing::debug!(
                target: TRACING_TARGET,
                path = %source_path,
                "Keeping file at its source path"
            );
            return Ok(Literal::blob(blob_type, source_path).with_metadata(metadata));
        }

        let headers = Self::additional_headers(&source_path);
        let local = weft_storage::to_local_path(&source_path)?;
        let uri = match destination {
            Some(remote) => access.put_data(&local, &remote, &headers).await?,
            None => access.put_raw_data(&local, &headers).await?,
        };
        let uri = match urlencoding::decode(&uri) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => uri.clone(),
        };

        tracing::debug!(
            target: TRACING_TARGET,
            source = %source_path,
            uri = %uri,
            "Uploaded file value"
        );
        Ok(Literal::blob(blob_type, uri).with_metadata(metadata))
    }

    async fn to_host_value(
        &self,
        ctx: &TransformContext,
        literal: &Literal,
        expected: &HostType,
    ) -> Result<HostValue> {
        match literal.as_scalar() {
            Some(Scalar::Binary(binary)) => {
                let record = FileRecord::from_binary(binary)?;
                self.from_record(ctx, record, expected).await
            }
            Some(Scalar::Generic(generic)) => {
                let record = FileRecord::from_generic(generic)?;
                self.from_record(ctx, record, expected).await
            }
            _ => self.blob_to_host_value(ctx, literal, expected).await,
        }
    }

    fn guess_host_type(&self, literal_type: &LiteralType) -> Result<HostType> {
        match literal_type.as_blob() {
            Some(blob)
                if blob.dimensionality == BlobDimensionality::Single
                    && blob.format != OPAQUE_FORMAT =>
            {
                Ok(HostType::file_with_extension(blob.format.clone()))
            }
            _ => Err(Error::lookup().with_message(format!(
                "transformer `{}` cannot reverse {literal_type:?}",
                self.name()
            ))),
        }
    }
}
