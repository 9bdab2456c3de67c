//! # Error Types

use thiserror::Error;

/// Errors from the object store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Nothing stored under this path and key.
    #[error("Object not found: {path}/{key}")]
    NotFound { path: String, key: String },

    /// Path or key would escape the store root.
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// Stored bytes are not what the reader expects.
    #[error("Corrupt object {path}/{key}: {reason}")]
    Corrupt {
        path: String,
        key: String,
        reason: String,
    },

    /// Underlying I/O failed.
    #[error("I/O error on {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// True when the object simply does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}
