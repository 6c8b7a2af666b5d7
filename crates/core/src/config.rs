//! Configuration types shared across crates.

use crate::layout::StorageLayout;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size for uploads, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_max_upload_bytes() -> usize {
    512 * 1024 * 1024
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

/// Storage roots configuration.
///
/// Relative roots resolve against the process working directory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root under which one directory per database is created.
    #[serde(default = "default_database_root")]
    pub database_root: PathBuf,
    /// Root under which uploaded SQL scripts are kept.
    #[serde(default = "default_sql_root")]
    pub sql_root: PathBuf,
}

fn default_database_root() -> PathBuf {
    PathBuf::from("database")
}

fn default_sql_root() -> PathBuf {
    PathBuf::from("sql")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_root: default_database_root(),
            sql_root: default_sql_root(),
        }
    }
}

impl StorageConfig {
    /// Build the layout described by this configuration.
    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.database_root, &self.sql_root)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database_root.as_os_str().is_empty() || self.sql_root.as_os_str().is_empty() {
            return Err("storage roots cannot be empty".to_string());
        }
        if self.database_root == self.sql_root {
            return Err(format!(
                "storage.database_root and storage.sql_root must differ, both are {}",
                self.database_root.display()
            ));
        }
        // the converter passes script paths to sqlite3 inside single quotes
        for root in [&self.database_root, &self.sql_root] {
            if root.to_string_lossy().contains('\'') {
                return Err(format!(
                    "storage roots cannot contain a single quote: {}",
                    root.display()
                ));
            }
        }
        Ok(())
    }
}

/// SQL-to-database conversion configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Database CLI invoked as `<program> -safe -bail <database> ".read <script>"`.
    #[serde(default = "default_program")]
    pub program: String,
    /// Seconds before a running conversion is killed; 0 waits forever.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_program() -> String {
    "sqlite3".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ConversionConfig {
    /// Get the conversion timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.program.trim().is_empty() {
            return Err("conversion.program cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage roots.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Conversion tool configuration.
    #[serde(default)]
    pub conversion: ConversionConfig,
}

impl AppConfig {
    /// Validate every section, failing on the first problem.
    pub fn validate(&self) -> crate::Result<()> {
        self.storage
            .validate()
            .and_then(|_| self.conversion.validate())
            .map_err(crate::Error::InvalidConfig)
    }

    /// Create a test configuration rooted in `root`.
    ///
    /// **For testing only.** Metrics stay enabled and conversion uses the
    /// default program.
    pub fn for_testing(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig {
                database_root: root.join("database"),
                sql_root: root.join("sql"),
            },
            conversion: ConversionConfig::default(),
        }
    }
}
