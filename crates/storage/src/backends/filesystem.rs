//! Local filesystem storage backend.

use crate::error::{StorageError, StorageResult};
use crate::traits::{ByteStream, UploadStore};
use async_trait::async_trait;
use futures::StreamExt;
use sqldepot_core::StorageLayout;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

/// Filesystem upload store rooted at the configured layout.
pub struct FilesystemStore {
    roots: Vec<PathBuf>,
}

impl FilesystemStore {
    /// Create a new filesystem store, creating the roots if they are missing.
    pub async fn new(layout: &StorageLayout) -> StorageResult<Self> {
        let roots = vec![
            layout.database_root().to_path_buf(),
            layout.sql_root().to_path_buf(),
        ];
        for root in &roots {
            fs::create_dir_all(root)
                .await
                .map_err(|e| StorageError::from_io(root, e))?;
        }
        Ok(Self { roots })
    }

    /// Reject any path that is not strictly below one of the roots.
    ///
    /// Identifiers are validated before paths are derived, so this only
    /// trips on a caller bug. It is purely lexical: symlinks inside a root
    /// are the operator's business.
    fn check_path(&self, path: &Path) -> StorageResult<()> {
        let rest = self
            .roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
            .ok_or_else(|| {
                StorageError::InvalidPath(format!("outside storage roots: {}", path.display()))
            })?;

        if rest.as_os_str().is_empty() {
            return Err(StorageError::InvalidPath(format!(
                "refusing to operate on a storage root: {}",
                path.display()
            )));
        }

        for component in rest.components() {
            match component {
                Component::Normal(_) => {}
                _ => {
                    return Err(StorageError::InvalidPath(format!(
                        "contains unsafe path component: {}",
                        path.display()
                    )));
                }
            }
        }

        Ok(())
    }
}

/// A file created by [`FilesystemStore::store`] that is not complete yet.
///
/// Dropping the guard before [`PartialFile::keep`] removes the file, which
/// covers both a failed copy and a cancelled store future.
struct PartialFile<'a> {
    path: &'a Path,
    keep: bool,
}

impl<'a> PartialFile<'a> {
    fn new(path: &'a Path) -> Self {
        Self { path, keep: false }
    }

    fn keep(mut self) {
        self.keep = true;
    }
}

impl Drop for PartialFile<'_> {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        // Drop cannot await; a single unlink is fine to run inline
        if let Err(e) = std::fs::remove_file(self.path) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove partially written file"
            );
        }
    }
}

/// Copy the whole stream into `file`, then flush and sync it.
///
/// Takes both ends by value so they are closed when this returns, whatever
/// the outcome.
async fn copy_stream(
    mut data: ByteStream<'_>,
    mut file: fs::File,
    dest: &Path,
) -> StorageResult<u64> {
    let io_err = |e| StorageError::from_io(dest, e);
    let mut written = 0u64;

    while let Some(chunk) = data.next().await {
        let chunk = chunk.map_err(StorageError::Stream)?;
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(io_err)?;
    file.sync_all().await.map_err(io_err)?;
    Ok(written)
}

#[async_trait]
impl UploadStore for FilesystemStore {
    #[instrument(skip(self, data), fields(backend = "filesystem"))]
    async fn store(&self, data: ByteStream<'_>, dest: &Path) -> StorageResult<u64> {
        self.check_path(dest)?;

        // create_new makes the existence check and the creation one atomic step
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .await
            .map_err(|e| StorageError::from_io(dest, e))?;
        let partial = PartialFile::new(dest);

        let written = copy_stream(data, file, dest).await?;
        partial.keep();

        tracing::debug!(bytes = written, "Stored upload");
        Ok(written)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn create_dir(&self, path: &Path) -> StorageResult<()> {
        self.check_path(path)?;
        fs::create_dir(path)
            .await
            .map_err(|e| StorageError::from_io(path, e))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn remove_file(&self, path: &Path) -> StorageResult<()> {
        self.check_path(path)?;
        fs::remove_file(path)
            .await
            .map_err(|e| StorageError::from_io(path, e))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn remove_dir(&self, path: &Path) -> StorageResult<()> {
        self.check_path(path)?;
        fs::remove_dir_all(path)
            .await
            .map_err(|e| StorageError::from_io(path, e))
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn health_check(&self) -> StorageResult<()> {
        for root in &self.roots {
            let metadata = fs::metadata(root).await.map_err(|e| StorageError::Io {
                path: root.clone(),
                source: std::io::Error::new(
                    e.kind(),
                    format!("storage root not accessible: {e}"),
                ),
            })?;

            if !metadata.is_dir() {
                return Err(StorageError::InvalidPath(format!(
                    "storage root is not a directory: {}",
                    root.display()
                )));
            }
        }

        Ok(())
    }
}
