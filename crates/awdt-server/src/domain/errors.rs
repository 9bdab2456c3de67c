//! Server error types.

use awdt_crypto::CryptoError;
use awdt_storage::StorageError;
use awdt_types::WireError;
use thiserror::Error;

/// Failures a server handler cannot recover from locally.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
