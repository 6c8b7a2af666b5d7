//! Application state shared across handlers.

use crate::convert::Converter;
use crate::uploader::Uploader;
use sqldepot_core::config::AppConfig;
use sqldepot_storage::UploadStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Upload storage backend.
    pub storage: Arc<dyn UploadStore>,
    /// Upload orchestrator.
    pub uploader: Arc<Uploader>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Panics
    ///
    /// Panics if the configuration fails validation. `main` validates before
    /// getting here, so this only trips on a misconfigured test.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn UploadStore>,
        converter: Arc<dyn Converter>,
    ) -> Self {
        if let Err(error) = config.validate() {
            panic!("Invalid configuration: {}", error);
        }

        let uploader = Uploader::new(storage.clone(), converter, config.storage.layout());

        Self {
            config: Arc::new(config),
            storage,
            uploader: Arc::new(uploader),
        }
    }
}
