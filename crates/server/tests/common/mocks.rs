use async_trait::async_trait;
use sqldepot_server::{ConversionError, Converter};
use sqldepot_storage::{ByteStream, StorageError, StorageResult, UploadStore};
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Converter that accepts scripts starting with `CREATE`.
///
/// Like the real tool it creates the database file before reading the
/// script, so a rejected script leaves a half-built database behind.
#[allow(dead_code)]
pub struct FakeSqlite;

#[async_trait]
impl Converter for FakeSqlite {
    async fn convert(&self, script: &Path, database: &Path) -> Result<(), ConversionError> {
        let sql = tokio::fs::read_to_string(script)
            .await
            .map_err(|e| ConversionError::Other(e.to_string()))?;
        tokio::fs::write(database, crate::common::fixtures::SQLITE_HEADER)
            .await
            .map_err(|e| ConversionError::Other(e.to_string()))?;

        if sql.trim_start().to_ascii_uppercase().starts_with("CREATE") {
            Ok(())
        } else {
            Err(ConversionError::Other(
                "Parse error near line 1: syntax error".to_string(),
            ))
        }
    }
}

/// Which store operations a [`FailingStore`] breaks.
#[allow(dead_code)]
#[derive(Default, Clone, Copy)]
pub struct Failures {
    pub create_dir: bool,
    pub remove_file: bool,
    pub remove_dir: bool,
}

/// Store wrapper that injects I/O errors into selected operations.
#[allow(dead_code)]
pub struct FailingStore {
    inner: Arc<dyn UploadStore>,
    failures: Failures,
}

#[allow(dead_code)]
impl FailingStore {
    pub fn wrap(inner: Arc<dyn UploadStore>, failures: Failures) -> Arc<dyn UploadStore> {
        Arc::new(Self { inner, failures })
    }

    fn injected(path: &Path) -> StorageError {
        StorageError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "injected failure"),
        }
    }
}

#[async_trait]
impl UploadStore for FailingStore {
    async fn store(&self, data: ByteStream<'_>, dest: &Path) -> StorageResult<u64> {
        self.inner.store(data, dest).await
    }

    async fn create_dir(&self, path: &Path) -> StorageResult<()> {
        if self.failures.create_dir {
            return Err(Self::injected(path));
        }
        self.inner.create_dir(path).await
    }

    async fn remove_file(&self, path: &Path) -> StorageResult<()> {
        if self.failures.remove_file {
            return Err(Self::injected(path));
        }
        self.inner.remove_file(path).await
    }

    async fn remove_dir(&self, path: &Path) -> StorageResult<()> {
        if self.failures.remove_dir {
            return Err(Self::injected(path));
        }
        self.inner.remove_dir(path).await
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.inner.health_check().await
    }
}
