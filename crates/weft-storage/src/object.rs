//! [`FileAccess`] backed by [`object_store::ObjectStore`].

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::TRACING_TARGET;
use crate::access::{FileAccess, UploadHeaders};
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::uri::{self, RemoteLocation};

/// Storage access resolving one [`ObjectStore`] per `scheme://bucket`.
///
/// Stores are registered explicitly with [`register_store`](Self::register_store)
/// or, for unregistered URIs, resolved with [`object_store::parse_url`] on
/// first use. Local paths and `file://` URIs go straight to the filesystem.
#[derive(Clone)]
pub struct ObjectFileAccess {
    stores: Arc<RwLock<HashMap<String, Arc<dyn ObjectStore>>>>,
    config: StorageConfig,
}

impl ObjectFileAccess {
    /// Creates a new storage access from configuration.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        config.validate().map_err(StorageError::Config)?;

        tracing::info!(
            target: TRACING_TARGET,
            raw_output_prefix = %config.raw_output_prefix(),
            sandbox = %config.local_sandbox_dir().display(),
            "Storage access initialized"
        );

        Ok(Self {
            stores: Arc::default(),
            config,
        })
    }

    /// Returns the configuration for this storage access.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Routes every URI under `base` (`scheme://bucket`) to `store`.
    pub fn register_store(&self, base: &str, store: impl ObjectStore) -> StorageResult<()> {
        let location = RemoteLocation::parse(base)?;
        self.stores.write().insert(location.store, Arc::new(store));
        Ok(())
    }

    /// Builder-style variant of [`register_store`](Self::register_store).
    pub fn with_store(self, base: &str, store: impl ObjectStore) -> StorageResult<Self> {
        self.register_store(base, store)?;
        Ok(self)
    }

    fn resolve(&self, location: &RemoteLocation) -> StorageResult<Arc<dyn ObjectStore>> {
        if let Some(store) = self.stores.read().get(&location.store) {
            return Ok(store.clone());
        }

        let (store, _) = object_store::parse_url(&location.url)?;
        let store: Arc<dyn ObjectStore> = Arc::from(store);
        self.stores
            .write()
            .entry(location.store.clone())
            .or_insert_with(|| store.clone());

        tracing::debug!(
            target: TRACING_TARGET,
            store = %location.store,
            "Resolved object store from uri"
        );
        Ok(store)
    }
}

impl fmt::Debug for ObjectFileAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectFileAccess")
            .field("stores", &self.stores.read().keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl FileAccess for ObjectFileAccess {
    #[tracing::instrument(name = "storage.get", skip(self), fields(uri))]
    async fn get_bytes(&self, uri: &str) -> StorageResult<Bytes> {
        if !uri::is_remote(uri) {
            let path = uri::to_local_path(uri)?;
            return match tokio::fs::read(&path).await {
                Ok(data) => Ok(Bytes::from(data)),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    Err(StorageError::not_found(uri))
                }
                Err(err) => Err(err.into()),
            };
        }

        let location = RemoteLocation::parse(uri)?;
        let store = self.resolve(&location)?;
        let result = store.get(&location.key).await?;
        Ok(result.bytes().await?)
    }

    #[tracing::instrument(name = "storage.put", skip(self, data, headers), fields(uri, size = data.len()))]
    async fn put_bytes(
        &self,
        uri: &str,
        data: Bytes,
        headers: &UploadHeaders,
    ) -> StorageResult<String> {
        if !uri::is_remote(uri) {
            let path = uri::to_local_path(uri)?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &data).await?;
            return Ok(uri.to_owned());
        }

        let location = RemoteLocation::parse(uri)?;
        let store = self.resolve(&location)?;

        let mut attributes = Attributes::new();
        if let Some(encoding) = &headers.content_encoding {
            attributes.insert(Attribute::ContentEncoding, encoding.clone().into());
        }
        if let Some(content_type) = &headers.content_type {
            attributes.insert(Attribute::ContentType, content_type.clone().into());
        }
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };

        store
            .put_opts(&location.key, PutPayload::from(data), opts)
            .await?;
        Ok(uri.to_owned())
    }

    fn local_scratch_path(&self, hint: Option<&str>) -> PathBuf {
        let dir = self
            .config
            .local_sandbox_dir()
            .join(Uuid::now_v7().simple().to_string());
        match hint.and_then(uri::file_name) {
            Some(name) => dir.join(name),
            None => dir,
        }
    }

    fn new_remote_path(&self, stem: Option<&str>, prefix: Option<&str>) -> String {
        let base = match prefix {
            Some(prefix) => prefix.trim_end_matches('/').to_owned(),
            None => self.config.raw_output_prefix(),
        };
        let unique = Uuid::now_v7().simple().to_string();
        match stem.and_then(uri::file_name) {
            Some(name) => format!("{base}/{unique}/{}", urlencoding::encode(name)),
            None => format!("{base}/{unique}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use object_store::memory::InMemory;
    use object_store::path::Path as ObjectPath;

    use super::*;

    fn test_access(sandbox: &std::path::Path) -> ObjectFileAccess {
        let config = StorageConfig::new()
            .with_raw_output_prefix("s3://bucket/raw")
            .with_local_sandbox_dir(sandbox);
        ObjectFileAccess::new(config)
            .unwrap()
            .with_store("s3://bucket", InMemory::new())
            .unwrap()
    }

    #[tokio::test]
    async fn put_and_get_remote_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let access = test_access(dir.path());

        let uri = access
            .put_bytes(
                "s3://bucket/a/data.csv",
                Bytes::from("a,b\n1,2\n"),
                &UploadHeaders::default(),
            )
            .await
            .unwrap();
        assert_eq!(uri, "s3://bucket/a/data.csv");

        let data = access.get_bytes(&uri).await.unwrap();
        assert_eq!(data, Bytes::from("a,b\n1,2\n"));
    }

    #[tokio::test]
    async fn gzip_header_is_stored_as_attribute() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemory::new());
        let access = ObjectFileAccess::new(StorageConfig::new().with_local_sandbox_dir(dir.path()))
            .unwrap();
        access
            .stores
            .write()
            .insert("s3://bucket".to_owned(), store.clone());

        access
            .put_bytes(
                "s3://bucket/logs.txt.gz",
                Bytes::from_static(b"\x1f\x8b"),
                &UploadHeaders::gzip(),
            )
            .await
            .unwrap();

        let result = store.get(&ObjectPath::from("logs.txt.gz")).await.unwrap();
        assert_eq!(
            result
                .attributes
                .get(&Attribute::ContentEncoding)
                .map(|v| v.to_string()),
            Some("gzip".to_owned())
        );
    }

    #[tokio::test]
    async fn missing_remote_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let access = test_access(dir.path());
        let err = access.get_bytes("s3://bucket/missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn file_round_trip_through_remote() {
        let dir = tempfile::tempdir().unwrap();
        let access = test_access(dir.path());

        let local = dir.path().join("input.txt");
        tokio::fs::write(&local, b"hello").await.unwrap();

        let uri = access
            .put_raw_data(&local, &UploadHeaders::default())
            .await
            .unwrap();
        assert!(uri.starts_with("s3://bucket/raw/"));
        assert!(uri.ends_with("/input.txt"));

        let target = access.local_scratch_path(Some(uri.as_str()));
        access.get_data(&uri, &target).await.unwrap();
        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"hello");
        assert!(target.starts_with(dir.path()));
    }

    #[tokio::test]
    async fn local_paths_bypass_object_stores() {
        let dir = tempfile::tempdir().unwrap();
        let access = test_access(dir.path());

        let target = dir.path().join("nested/out.bin");
        let uri = target.to_string_lossy().into_owned();
        access
            .put_bytes(&uri, Bytes::from_static(b"\x00\x01"), &UploadHeaders::default())
            .await
            .unwrap();
        assert_eq!(access.get_bytes(&uri).await.unwrap().as_ref(), b"\x00\x01");

        let missing = dir.path().join("missing").to_string_lossy().into_owned();
        assert!(access.get_bytes(&missing).await.unwrap_err().is_not_found());
    }

    #[test]
    fn remote_paths_are_unique_and_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let access = test_access(dir.path());

        let a = access.new_remote_path(Some("my file.csv"), None);
        let b = access.new_remote_path(Some("my file.csv"), None);
        assert_ne!(a, b);
        assert!(a.starts_with("s3://bucket/raw/"));
        assert!(a.ends_with("/my%20file.csv"));

        let custom = access.new_remote_path(None, Some("gs://other/prefix/"));
        assert!(custom.starts_with("gs://other/prefix/"));
    }

    #[test]
    fn scratch_paths_keep_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let access = test_access(dir.path());
        let path = access.local_scratch_path(Some("s3://bucket/a/b.csv"));
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("b.csv"));
        assert!(path.starts_with(dir.path()));
    }
}
