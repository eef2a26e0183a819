//! Host handle to file content.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;
use weft_core::literal::{BlobType, Literal};
use weft_core::{Error, Result};
use weft_storage::FileAccess;

use crate::TRACING_TARGET;
use crate::context::TransformContext;
use crate::file::FileTransformer;
use crate::host::HostType;
use crate::transformer::TypeTransformer;

/// Where a file value should be uploaded when converted to a literal.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum RemotePath {
    /// Let the storage collaborator allocate a destination.
    #[default]
    Auto,
    /// Never upload; the literal points at the path as-is.
    Disabled,
    /// Upload to this exact URI.
    Explicit(String),
}

impl RemotePath {
    pub fn explicit(&self) -> Option<&str> {
        match self {
            Self::Explicit(uri) => Some(uri),
            _ => None,
        }
    }
}

impl From<bool> for RemotePath {
    fn from(upload: bool) -> Self {
        if upload { Self::Auto } else { Self::Disabled }
    }
}

impl From<String> for RemotePath {
    fn from(uri: String) -> Self {
        Self::Explicit(uri)
    }
}

impl From<&str> for RemotePath {
    fn from(uri: &str) -> Self {
        Self::Explicit(uri.to_owned())
    }
}

/// A pending download of `uri` into `local`.
#[derive(Debug)]
struct RemoteDownload {
    uri: String,
    local: PathBuf,
    access: Arc<dyn FileAccess>,
    done: OnceCell<()>,
}

/// How a value's content reaches its local path.
#[derive(Debug, Clone)]
enum Materializer {
    /// The content already lives at the path.
    Local,
    /// The handle has no way to fetch content.
    Unmanaged,
    /// Content is fetched on first access, shared by all clones.
    Remote(Arc<RemoteDownload>),
}

/// Host handle to a single file, local or remote.
///
/// Values built from remote literals are lazy: construction performs no
/// I/O and [`download`](Self::download) fetches the content at most once,
/// no matter how many clones of the value call it.
#[derive(Debug, Clone)]
pub struct FileValue {
    path: String,
    extension: String,
    remote_path: RemotePath,
    remote_source: Option<String>,
    metadata: Option<BTreeMap<String, String>>,
    materializer: Materializer,
}

impl FileValue {
    /// Wraps a local path whose content is already present.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_materializer(
            path.as_ref().to_string_lossy().into_owned(),
            Materializer::Local,
        )
    }

    /// Wraps a path or URI without any download behavior.
    pub fn unmanaged(path: impl Into<String>) -> Self {
        Self::with_materializer(path.into(), Materializer::Unmanaged)
    }

    /// A lazy value that downloads `uri` into `local` on first access.
    pub fn remote(uri: impl Into<String>, local: PathBuf, access: Arc<dyn FileAccess>) -> Self {
        let uri = uri.into();
        let download = RemoteDownload {
            uri: uri.clone(),
            local: local.clone(),
            access,
            done: OnceCell::new(),
        };
        let mut value = Self::with_materializer(
            local.to_string_lossy().into_owned(),
            Materializer::Remote(Arc::new(download)),
        );
        value.remote_source = Some(uri);
        value
    }

    /// A value named `relative` inside `working_dir`.
    pub fn new_in(working_dir: impl AsRef<Path>, relative: impl AsRef<Path>) -> Result<Self> {
        let relative = relative.as_ref();
        if relative.is_absolute() {
            return Err(Error::invalid_value()
                .with_message(format!("path {} should be relative", relative.display())));
        }
        Ok(Self::new(working_dir.as_ref().join(relative)))
    }

    /// A value whose path is a freshly allocated remote destination.
    ///
    /// No I/O happens; the path is only reserved by name.
    pub fn new_remote_file(
        ctx: &TransformContext,
        name: Option<&str>,
        alt_prefix: Option<&str>,
    ) -> Self {
        Self::unmanaged(ctx.file_access().new_remote_path(name, alt_prefix))
    }

    /// Builds a value as if it had been received in a blob literal.
    ///
    /// Remote URIs produce a lazy value; local paths must name an existing
    /// regular file.
    pub async fn from_source(ctx: &TransformContext, source: impl Into<String>) -> Result<Self> {
        let literal = Literal::blob(BlobType::single(""), source);
        let value = FileTransformer::new()
            .to_host_value(ctx, &literal, &HostType::file())
            .await?;
        value.into_file().ok_or_else(|| {
            Error::type_mismatch().with_message("file transformer returned a non-file value")
        })
    }

    fn with_materializer(path: String, materializer: Materializer) -> Self {
        Self {
            path,
            extension: String::new(),
            remote_path: RemotePath::Auto,
            remote_source: None,
            metadata: None,
            materializer,
        }
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    #[must_use]
    pub fn with_remote_path(mut self, remote_path: impl Into<RemotePath>) -> Self {
        self.remote_path = remote_path.into();
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Option<BTreeMap<String, String>>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Local path or URI this value points at.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// File extension fixed by the value's type, empty when untyped.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn remote_path(&self) -> &RemotePath {
        &self.remote_path
    }

    /// The remote URI this value was downloaded from, if any.
    pub fn remote_source(&self) -> Option<&str> {
        self.remote_source.as_deref()
    }

    pub fn metadata(&self) -> Option<&BTreeMap<String, String>> {
        self.metadata.as_ref()
    }

    /// Returns `true` if the value can fetch its content on demand.
    pub fn is_lazy(&self) -> bool {
        matches!(self.materializer, Materializer::Remote(_))
    }

    /// Returns `true` once the content is available at [`path`](Self::path).
    pub fn is_downloaded(&self) -> bool {
        match &self.materializer {
            Materializer::Local => true,
            Materializer::Unmanaged => false,
            Materializer::Remote(download) => download.done.initialized(),
        }
    }

    /// Makes the content available locally and returns its path.
    ///
    /// Remote values download on the first call only; later calls and
    /// clones reuse the result. Unmanaged values fail.
    pub async fn download(&self) -> Result<PathBuf> {
        match &self.materializer {
            Materializer::Local => Ok(PathBuf::from(&self.path)),
            Materializer::Unmanaged => Err(Error::invalid_value().with_message(format!(
                "file {} has no downloader attached",
                self.path
            ))),
            Materializer::Remote(download) => {
                download
                    .done
                    .get_or_try_init(|| async {
                        tracing::debug!(
                            target: TRACING_TARGET,
                            remote = %download.uri,
                            local = %download.local.display(),
                            "Materializing remote file"
                        );
                        download
                            .access
                            .get_data(&download.uri, &download.local)
                            .await
                            .map_err(Error::from)
                    })
                    .await?;
                Ok(download.local.clone())
            }
        }
    }
}

impl PartialEq for FileValue {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.remote_path == other.remote_path
            && self.extension == other.extension
    }
}

impl fmt::Display for FileValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
