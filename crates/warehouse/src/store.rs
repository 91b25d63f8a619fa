//! SQLite store wrapper.

use std::fs;
use std::path::Path;

use rusqlite::Connection;
use tracing::info;

use pipeline_core::{Error, Result};

use crate::schema;

/// Handle to the warehouse database.
///
/// Single-writer by contract; the pipeline never opens more than one
/// connection per run.
pub struct Warehouse {
    conn: Connection,
}

impl Warehouse {
    /// Open (creating if needed) the warehouse at `path` and ensure the
    /// star schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| Error::storage(format!("open {}: {e}", path.display())))?;

        let store = Self { conn };
        store.apply_pragmas()?;
        schema::init_schema(&store)?;

        info!(path = %path.display(), "opened warehouse");
        Ok(store)
    }

    /// In-memory warehouse for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::storage(format!("open in-memory: {e}")))?;
        let store = Self { conn };
        store.apply_pragmas()?;
        schema::init_schema(&store)?;
        Ok(store)
    }

    fn apply_pragmas(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;",
            )
            .map_err(|e| Error::storage(format!("apply pragmas: {e}")))
    }

    /// Returns the inner connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}
