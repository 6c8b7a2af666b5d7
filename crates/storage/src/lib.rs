//! Filesystem storage for sqldepot uploads.
//!
//! This crate provides:
//! - An exclusive-create writer that streams uploads to disk and removes
//!   partial files when the copy fails
//! - Directory creation and removal with collision and not-found reporting
//! - A filesystem backend confined to the configured storage roots

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemStore;
pub use error::{StorageError, StorageResult};
pub use traits::{ByteStream, UploadStore, boxed_stream};

use sqldepot_core::config::StorageConfig;
use std::sync::Arc;

/// Create an upload store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn UploadStore>> {
    config.validate().map_err(StorageError::Config)?;

    let backend = FilesystemStore::new(&config.layout()).await?;
    Ok(Arc::new(backend))
}
