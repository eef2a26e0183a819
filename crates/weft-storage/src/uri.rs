//! URI helpers shared by the storage implementations.

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{StorageError, StorageResult};

/// Scheme treated as local even though it parses as a URL.
const FILE_SCHEME: &str = "file";

/// Returns `true` if `uri` addresses remote blob storage.
///
/// Plain paths and `file://` URIs are local. Single-letter schemes are
/// Windows drive letters and are local as well.
pub fn is_remote(uri: &str) -> bool {
    match Url::parse(uri) {
        Ok(url) => url.scheme() != FILE_SCHEME && url.scheme().len() > 1,
        Err(_) => false,
    }
}

/// Converts a local URI or plain path into a filesystem path.
pub fn to_local_path(uri: &str) -> StorageResult<PathBuf> {
    if let Ok(url) = Url::parse(uri) {
        if url.scheme() == FILE_SCHEME {
            return url
                .to_file_path()
                .map_err(|_| StorageError::invalid_uri(uri));
        }
    }
    Ok(PathBuf::from(uri))
}

/// A remote URI split into the store it lives in and the object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemoteLocation {
    /// `scheme://authority`, used to pick the backing store.
    pub store: String,
    /// Key of the object inside that store.
    pub key: object_store::path::Path,
    pub url: Url,
}

impl RemoteLocation {
    pub fn parse(uri: &str) -> StorageResult<Self> {
        let url = Url::parse(uri).map_err(|_| StorageError::invalid_uri(uri))?;
        if !is_remote(uri) {
            return Err(StorageError::invalid_uri(uri));
        }
        let store = match url.host_str() {
            Some(host) => format!("{}://{}", url.scheme(), host),
            None => format!("{}://", url.scheme()),
        };
        let key = object_store::path::Path::from_url_path(url.path())
            .map_err(|_| StorageError::invalid_uri(uri))?;
        Ok(Self { store, key, url })
    }
}

/// Returns the final path component of a URI or path, if any.
pub fn file_name(uri: &str) -> Option<&str> {
    let trimmed = uri.trim_end_matches('/');
    let name = trimmed.rsplit('/').next()?;
    let name = Path::new(name).file_name()?.to_str()?;
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_predicate() {
        assert!(is_remote("s3://bucket/key"));
        assert!(is_remote("gs://bucket/a/b.csv"));
        assert!(is_remote("https://example.com/data.json"));
        assert!(!is_remote("/tmp/a.csv"));
        assert!(!is_remote("relative/a.csv"));
        assert!(!is_remote("file:///tmp/a.csv"));
        assert!(!is_remote("C:\\data\\a.csv"));
    }

    #[test]
    fn local_path_strips_file_scheme() {
        assert_eq!(
            to_local_path("file:///tmp/a.csv").unwrap(),
            PathBuf::from("/tmp/a.csv")
        );
        assert_eq!(to_local_path("/tmp/b.csv").unwrap(), PathBuf::from("/tmp/b.csv"));
    }

    #[test]
    fn remote_location_splits_store_and_key() {
        let loc = RemoteLocation::parse("s3://bucket/raw/x%20y.csv").unwrap();
        assert_eq!(loc.store, "s3://bucket");
        assert_eq!(loc.key.as_ref(), "raw/x y.csv");

        assert!(RemoteLocation::parse("/tmp/local").is_err());
    }

    #[test]
    fn file_name_of_uri() {
        assert_eq!(file_name("s3://bucket/a/b.csv"), Some("b.csv"));
        assert_eq!(file_name("/tmp/dir/"), Some("dir"));
        assert_eq!(file_name(""), None);
    }
}
