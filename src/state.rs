//! Application state: the database location, migrated once at startup.
//!
//! Each request opens its own connection; WAL mode plus a busy timeout
//! let concurrent writers queue instead of failing.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::db::sqlite::open_database;
use crate::db::DatabaseError;

pub struct AppState {
    db_path: PathBuf,
}

impl AppState {
    /// Open (creating if needed) the database at `path` and run
    /// pending migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::MigrationFailed {
                    version: 0,
                    reason: format!("cannot create data directory: {e}"),
                }
            })?;
        }
        // Opening runs migrations; later per-request opens are no-ops
        let conn = open_database(path)?;
        drop(conn);

        Ok(Self {
            db_path: path.to_path_buf(),
        })
    }

    /// A fresh connection for one request.
    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        open_database(&self.db_path)
    }
}
