//! Server test utilities.

use crate::common::mocks::FakeSqlite;
use sqldepot_core::config::AppConfig;
use sqldepot_core::{Identifier, UploadPaths};
use sqldepot_server::{AppState, Converter, create_router};
use sqldepot_storage::{FilesystemStore, UploadStore};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary roots and a fake converter.
    pub async fn new() -> Self {
        Self::build(|_| {}, |store| store, Arc::new(FakeSqlite)).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        Self::build(modifier, |store| store, Arc::new(FakeSqlite)).await
    }

    /// Create a test server whose storage is wrapped by `wrap`.
    pub async fn with_store<W>(wrap: W) -> Self
    where
        W: FnOnce(Arc<dyn UploadStore>) -> Arc<dyn UploadStore>,
    {
        Self::build(|_| {}, wrap, Arc::new(FakeSqlite)).await
    }

    /// Create a test server that converts with `converter`.
    pub async fn with_converter(converter: Arc<dyn Converter>) -> Self {
        Self::build(|_| {}, |store| store, converter).await
    }

    async fn build<F, W>(modifier: F, wrap: W, converter: Arc<dyn Converter>) -> Self
    where
        F: FnOnce(&mut AppConfig),
        W: FnOnce(Arc<dyn UploadStore>) -> Arc<dyn UploadStore>,
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let mut config = AppConfig::for_testing(temp_dir.path());
        modifier(&mut config);

        let storage: Arc<dyn UploadStore> = Arc::new(
            FilesystemStore::new(&config.storage.layout())
                .await
                .expect("Failed to create storage backend"),
        );
        let storage = wrap(storage);

        sqldepot_server::metrics::register_metrics();

        let state = AppState::new(config, storage, converter);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Root of the temporary directory holding both storage roots.
    pub fn root(&self) -> &Path {
        self._temp_dir.path()
    }

    /// On-disk paths for the identifier `id`.
    pub fn paths(&self, id: &str) -> UploadPaths {
        let id = Identifier::new(id).expect("invalid test identifier");
        self.state.uploader.layout().paths(&id)
    }
}
