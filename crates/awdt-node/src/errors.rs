//! Node error types.

use awdt_bus::BusError;
use awdt_crypto::CryptoError;
use awdt_storage::StorageError;
use awdt_types::WireError;
use thiserror::Error;

use crate::config::ConfigError;

/// Failures that stop the coordinator. Protocol-level failures (invalid
/// tickets, suppressed requests, watchdog resets) are run outcomes, not
/// errors.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    #[error("Runtime error: {0}")]
    Bus(#[from] BusError),
}

pub type NodeResult<T> = Result<T, NodeError>;
