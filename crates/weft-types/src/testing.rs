//! Test doubles shared by the unit tests of this crate.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use object_store::memory::InMemory;
use weft_core::Result;
use weft_storage::{
    FileAccess, ObjectFileAccess, StorageConfig, StorageResult, UploadHeaders,
};

use crate::context::{ContentSniffer, TransformContext};

/// Storage access counting transfers, backed by an in-memory bucket.
#[derive(Debug)]
pub struct CountingAccess {
    inner: ObjectFileAccess,
    gets: AtomicUsize,
    puts: AtomicUsize,
    last_headers: parking_lot::Mutex<Option<UploadHeaders>>,
}

impl CountingAccess {
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn last_headers(&self) -> Option<UploadHeaders> {
        self.last_headers.lock().clone()
    }
}

#[async_trait]
impl FileAccess for CountingAccess {
    async fn get_bytes(&self, uri: &str) -> StorageResult<Bytes> {
        if self.inner.is_remote(uri) {
            self.gets.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.get_bytes(uri).await
    }

    async fn put_bytes(
        &self,
        uri: &str,
        data: Bytes,
        headers: &UploadHeaders,
    ) -> StorageResult<String> {
        if self.inner.is_remote(uri) {
            self.puts.fetch_add(1, Ordering::SeqCst);
            *self.last_headers.lock() = Some(headers.clone());
        }
        self.inner.put_bytes(uri, data, headers).await
    }

    fn local_scratch_path(&self, hint: Option<&str>) -> PathBuf {
        self.inner.local_scratch_path(hint)
    }

    fn new_remote_path(&self, stem: Option<&str>, prefix: Option<&str>) -> String {
        self.inner.new_remote_path(stem, prefix)
    }
}

/// Sniffer answering a fixed MIME type for every file.
#[derive(Debug)]
pub struct FixedSniffer(pub &'static str);

impl ContentSniffer for FixedSniffer {
    fn sniff_mime_type(&self, _path: &Path) -> Result<Option<String>> {
        Ok(Some(self.0.to_owned()))
    }
}

/// Temp sandbox, counting storage over `s3://bucket` and a remote-mode context.
pub struct TestBed {
    pub dir: tempfile::TempDir,
    pub access: Arc<CountingAccess>,
    pub ctx: TransformContext,
}

impl TestBed {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new()
            .with_raw_output_prefix("s3://bucket/raw")
            .with_local_sandbox_dir(dir.path().join("sandbox"));
        let inner = ObjectFileAccess::new(config)
            .unwrap()
            .with_store("s3://bucket", InMemory::new())
            .unwrap();
        let access = Arc::new(CountingAccess {
            inner,
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            last_headers: parking_lot::Mutex::new(None),
        });
        let ctx = TransformContext::new(access.clone());
        Self { dir, access, ctx }
    }

    /// Stores `data` at `s3://bucket/{key}` without touching the counters.
    pub async fn seed_remote(&self, key: &str, data: &'static [u8]) -> String {
        let uri = format!("s3://bucket/{key}");
        self.access
            .inner
            .put_bytes(&uri, Bytes::from_static(data), &UploadHeaders::default())
            .await
            .unwrap();
        uri
    }
}

/// Writes `data` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Log output collected by [`capture_logs`].
#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Arc<parking_lot::Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Routes this thread's log events into a buffer until the guard drops.
pub fn capture_logs() -> (tracing::subscriber::DefaultGuard, LogBuffer) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    (tracing::subscriber::set_default(subscriber), buffer)
}
