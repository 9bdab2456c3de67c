//! Crypto error types.

use awdt_storage::StorageError;
use awdt_types::{CryptoMode, SignatureVariant, WireError};
use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Public key bytes do not decode for this scheme
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Private key bytes do not decode for this scheme
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Signing failed inside the provider
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Provider asked to handle a scheme from another family
    #[error("{provider} provider does not support {variant}")]
    UnsupportedVariant {
        /// Requested scheme
        variant: SignatureVariant,
        /// Provider name
        provider: &'static str,
    },

    /// Crypto mode and variant do not belong together
    #[error("Invalid crypto policy: {0}")]
    InvalidPolicy(String),

    /// Envelope signed under a different crypto mode than this role runs
    #[error("Crypto mode mismatch: role uses {expected}, envelope carries {found}")]
    ModeMismatch {
        /// Role's configured mode
        expected: CryptoMode,
        /// Mode stamped on the envelope
        found: CryptoMode,
    },

    /// Envelope signed with a different scheme than this role runs
    #[error("Signature variant mismatch: role uses {expected}, envelope carries {found}")]
    VariantMismatch {
        /// Role's configured scheme
        expected: SignatureVariant,
        /// Scheme stamped on the envelope
        found: SignatureVariant,
    },

    /// Key material could not be read from storage
    #[error("Key {path}/{key} unavailable: {source}")]
    KeyUnavailable {
        /// Storage path
        path: String,
        /// Key file name
        key: String,
        /// Underlying storage error
        #[source]
        source: StorageError,
    },

    /// Canonical bytes could not be produced
    #[error(transparent)]
    Canonicalization(#[from] WireError),
}
