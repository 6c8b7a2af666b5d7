//! HTTP upload service for SQLite databases.
//!
//! This crate provides:
//! - Binary database uploads stored under the database root
//! - SQL script uploads converted into databases with the sqlite3 CLI
//! - Compensating rollback of partially completed uploads
//! - Health and Prometheus metrics endpoints

pub mod convert;
pub mod error;
pub mod handlers;
pub mod inflight;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod uploader;

pub use convert::{ConversionError, Converter, SqliteCli};
pub use error::{ApiError, UploadError};
pub use routes::create_router;
pub use state::AppState;
pub use uploader::Uploader;
