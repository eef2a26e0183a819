//! The storage capability consumed by value transformers.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::TRACING_TARGET;
use crate::error::StorageResult;
use crate::uri;

/// Content encoding applied to gzip-compressed uploads.
pub const GZIP_ENCODING: &str = "gzip";

/// Object headers attached to an upload.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadHeaders {
    /// `Content-Encoding` of the stored object.
    pub content_encoding: Option<String>,
    /// `Content-Type` of the stored object.
    pub content_type: Option<String>,
}

impl UploadHeaders {
    /// Headers for a gzip-compressed payload.
    pub fn gzip() -> Self {
        Self {
            content_encoding: Some(GZIP_ENCODING.to_owned()),
            content_type: None,
        }
    }

    /// Returns `true` when no header is set.
    pub fn is_empty(&self) -> bool {
        self.content_encoding.is_none() && self.content_type.is_none()
    }
}

/// Moves file content between the local machine and blob storage.
///
/// Only [`get_bytes`](Self::get_bytes), [`put_bytes`](Self::put_bytes) and
/// the two path allocators have to be implemented; file transfers default to
/// buffering through them.
#[async_trait]
pub trait FileAccess: Debug + Send + Sync {
    /// Returns `true` if `uri` addresses remote storage.
    fn is_remote(&self, uri: &str) -> bool {
        uri::is_remote(uri)
    }

    /// Reads the whole object or file at `uri`.
    async fn get_bytes(&self, uri: &str) -> StorageResult<Bytes>;

    /// Writes `data` to `uri` and returns the confirmed URI.
    async fn put_bytes(&self, uri: &str, data: Bytes, headers: &UploadHeaders)
    -> StorageResult<String>;

    /// Downloads `remote` into the local file `local`, creating parents.
    async fn get_data(&self, remote: &str, local: &Path) -> StorageResult<()> {
        let data = self.get_bytes(remote).await?;
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local, &data).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            remote = %remote,
            local = %local.display(),
            size = data.len(),
            "Downloaded file"
        );
        Ok(())
    }

    /// Uploads the local file `local` to `remote` and returns the confirmed URI.
    async fn put_data(
        &self,
        local: &Path,
        remote: &str,
        headers: &UploadHeaders,
    ) -> StorageResult<String> {
        let data = Bytes::from(tokio::fs::read(local).await?);
        let size = data.len();
        let uri = self.put_bytes(remote, data, headers).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            local = %local.display(),
            remote = %uri,
            size,
            "Uploaded file"
        );
        Ok(uri)
    }

    /// Uploads `local` to a freshly allocated destination under the raw
    /// output prefix and returns the confirmed URI.
    async fn put_raw_data(&self, local: &Path, headers: &UploadHeaders) -> StorageResult<String> {
        let name = local.file_name().and_then(|name| name.to_str());
        let remote = self.new_remote_path(name, None);
        self.put_data(local, &remote, headers).await
    }

    /// Allocates a unique local scratch path ending in the file name of `hint`.
    fn local_scratch_path(&self, hint: Option<&str>) -> PathBuf;

    /// Allocates a unique destination URI ending in `stem`, under `prefix`
    /// or the configured raw output prefix.
    fn new_remote_path(&self, stem: Option<&str>, prefix: Option<&str>) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_headers() {
        let headers = UploadHeaders::gzip();
        assert_eq!(headers.content_encoding.as_deref(), Some(GZIP_ENCODING));
        assert!(!headers.is_empty());
        assert!(UploadHeaders::default().is_empty());
    }
}
