//! Error types for the upload ledger.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing the upload ledger.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Failed to open or create the ledger file.
    #[error("Failed to open ledger at {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    /// The ledger path could not be inspected.
    #[error("Cannot access ledger at {path}: {source}")]
    Access {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to apply the ledger schema.
    #[error("Ledger migration failed: {0}")]
    Migration(#[from] rusqlite::Error),

    /// A query failed.
    #[error("Ledger query failed: {0}")]
    Query(String),

    /// Failed to spawn a blocking task.
    #[error("Failed to spawn blocking task: {0}")]
    Spawn(#[from] tokio::task::JoinError),

    /// The ledger schema version is newer than supported.
    #[error("Ledger schema version {found} is newer than supported version {expected}")]
    UnsupportedSchemaVersion { found: i32, expected: i32 },

    /// Failed to remove a ledger file during a full wipe.
    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Another process holds the ledger lock.
    #[error("Another photosyncr instance is already using {0}")]
    Locked(PathBuf),

    /// The lock file could not be created.
    #[error("Failed to create lock file {path}: {source}")]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl LedgerError {
    /// Create a Query error from a rusqlite error.
    pub fn query(source: rusqlite::Error) -> Self {
        Self::Query(source.to_string())
    }
}
