//! Unified error types for the pipeline.
//!
//! Record-level problems (bad JSON, missing fields, disallowed event kinds)
//! are NOT errors: they become quarantine entries and the run continues.
//! Everything here is stage-level or storage-level and aborts the run.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the batch pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Input file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Tabular feed with a broken header or row layout.
    #[error("feed error: {0}")]
    Feed(String),

    /// Warehouse persistence failure (DDL, transaction, upsert batch).
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal-consistency defect, e.g. a fact row whose event-type
    /// foreign key does not resolve after the dimension upsert ran.
    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn feed(msg: impl Into<String>) -> Self {
        Self::Feed(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
