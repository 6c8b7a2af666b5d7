//! On-disk placement of uploaded scripts and databases.

use crate::identifier::Identifier;
use crate::{DATABASE_EXTENSION, SCRIPT_EXTENSION};
use std::path::{Path, PathBuf};

/// Roots under which uploads are placed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageLayout {
    database_root: PathBuf,
    sql_root: PathBuf,
}

/// Every path an upload may touch, derived from its identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadPaths {
    /// `<database_root>/<id>`
    pub database_dir: PathBuf,
    /// `<database_root>/<id>/<id>.sqlite`
    pub database_file: PathBuf,
    /// `<sql_root>/<id>.sql`
    pub sql_file: PathBuf,
}

impl StorageLayout {
    pub fn new(database_root: impl Into<PathBuf>, sql_root: impl Into<PathBuf>) -> Self {
        Self {
            database_root: database_root.into(),
            sql_root: sql_root.into(),
        }
    }

    pub fn database_root(&self) -> &Path {
        &self.database_root
    }

    pub fn sql_root(&self) -> &Path {
        &self.sql_root
    }

    /// Derive the paths for an identifier.
    pub fn paths(&self, id: &Identifier) -> UploadPaths {
        let database_dir = self.database_root.join(id.as_str());
        let database_file = database_dir.join(database_file_name(id));
        let sql_file = self
            .sql_root
            .join(format!("{}.{}", id.as_str(), SCRIPT_EXTENSION));

        UploadPaths {
            database_dir,
            database_file,
            sql_file,
        }
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::new("database", "sql")
    }
}

/// File name of the database stored for an identifier (`<id>.sqlite`).
pub fn database_file_name(id: &Identifier) -> String {
    format!("{}.{}", id.as_str(), DATABASE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_paths() {
        let id = Identifier::new("orders").unwrap();
        let paths = StorageLayout::default().paths(&id);

        assert_eq!(paths.database_dir, Path::new("database/orders"));
        assert_eq!(
            paths.database_file,
            Path::new("database/orders/orders.sqlite")
        );
        assert_eq!(paths.sql_file, Path::new("sql/orders.sql"));
    }

    #[test]
    fn test_custom_roots() {
        let layout = StorageLayout::new("/srv/depot/db", "/srv/depot/scripts");
        let id = Identifier::new("inventory.v2").unwrap();
        let paths = layout.paths(&id);

        assert_eq!(
            paths.database_file,
            Path::new("/srv/depot/db/inventory.v2/inventory.v2.sqlite")
        );
        assert_eq!(
            paths.sql_file,
            Path::new("/srv/depot/scripts/inventory.v2.sql")
        );
        assert!(paths.database_file.starts_with(layout.database_root()));
        assert!(paths.sql_file.starts_with(layout.sql_root()));
    }

    #[test]
    fn test_database_file_name() {
        let id = Identifier::new("bad").unwrap();
        assert_eq!(database_file_name(&id), "bad.sqlite");
    }
}
