//! Storage test utilities.

use sqldepot_core::StorageLayout;
use sqldepot_storage::{FilesystemStore, StorageResult, UploadStore};
use std::sync::Arc;
use tempfile::TempDir;

/// A test storage wrapper that cleans up on drop.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestStorage {
    pub backend: Arc<dyn UploadStore>,
    pub layout: StorageLayout,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestStorage {
    /// Create a new test storage with temporary roots.
    pub async fn new() -> StorageResult<Self> {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let layout = StorageLayout::new(
            temp_dir.path().join("database"),
            temp_dir.path().join("sql"),
        );
        let backend = FilesystemStore::new(&layout).await?;

        Ok(Self {
            backend: Arc::new(backend),
            layout,
            _temp_dir: temp_dir,
        })
    }

    /// Get a reference to the upload store.
    pub fn store(&self) -> Arc<dyn UploadStore> {
        self.backend.clone()
    }
}
