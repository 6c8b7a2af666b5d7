//! Core domain types shared by the sqldepot crates.
//!
//! This crate defines:
//! - Upload identifiers derived from client file names
//! - The on-disk layout of stored scripts and databases
//! - Configuration types loaded by the server binary

pub mod config;
pub mod error;
pub mod identifier;
pub mod layout;

pub use error::{Error, Result};
pub use identifier::Identifier;
pub use layout::{StorageLayout, UploadPaths};

/// Extension given to every stored database file.
pub const DATABASE_EXTENSION: &str = "sqlite";

/// Extension given to every stored SQL script.
pub const SCRIPT_EXTENSION: &str = "sql";
