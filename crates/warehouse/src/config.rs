//! Warehouse configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Warehouse storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Path of the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/output/warehouse.db")
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}
