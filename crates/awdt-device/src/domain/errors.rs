//! Device error types.

use awdt_crypto::CryptoError;
use awdt_storage::StorageError;
use awdt_types::{EnvelopeError, WireError};
use thiserror::Error;

/// Failures a device handler cannot recover from locally.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Durable state required for a decision could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Signature check could not be carried out
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Envelope could not be serialized for staging
    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    /// History cursor could not be moved
    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),
}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
