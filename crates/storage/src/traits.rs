//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::io;
use std::path::Path;
use std::pin::Pin;

/// A boxed stream of uploaded bytes.
///
/// The lifetime lets request-scoped sources (such as a multipart field
/// borrowing its request) be written without buffering.
pub type ByteStream<'a> = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + 'a>>;

/// Filesystem mutations performed by an upload.
///
/// Creation is exclusive: a target that already exists is reported as
/// [`StorageError::AlreadyExists`](crate::StorageError::AlreadyExists) and is
/// left untouched.
#[async_trait]
pub trait UploadStore: Send + Sync + 'static {
    /// Write `data` to a new file at `dest`, returning the bytes written.
    ///
    /// If the copy fails the partially written file is removed before the
    /// error is returned.
    async fn store(&self, data: ByteStream<'_>, dest: &Path) -> StorageResult<u64>;

    /// Create a single directory. Its parent must already exist.
    async fn create_dir(&self, path: &Path) -> StorageResult<()>;

    /// Remove a file.
    async fn remove_file(&self, path: &Path) -> StorageResult<()>;

    /// Remove a directory and everything below it.
    async fn remove_dir(&self, path: &Path) -> StorageResult<()>;

    /// Get the name of this storage backend, for logs and metrics.
    fn backend_name(&self) -> &'static str;

    /// Verify the storage roots are reachable.
    async fn health_check(&self) -> StorageResult<()>;
}

/// Box any `Send` byte stream as a [`ByteStream`].
pub fn boxed_stream<'a, S>(stream: S) -> ByteStream<'a>
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'a,
{
    Box::pin(stream)
}
