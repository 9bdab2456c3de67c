//! # Signature Providers
//!
//! Uniform sign/verify/keygen capability per provider family. The
//! orchestrator picks a provider from the signature variant and never touches
//! curve or lattice types directly.

use std::fmt;

use awdt_types::{CryptoMode, HashAlgorithm, SignatureVariant};
use zeroize::Zeroizing;

use crate::ecdsa::{secp256k1, secp256r1};
use crate::errors::CryptoError;
use crate::pqc::{ml_dsa_44, ml_dsa_65, ml_dsa_87};
use crate::signatures as ed25519;

/// Encoded keypair. Private bytes are wiped on drop.
pub struct KeyPair {
    pub public: Vec<u8>,
    pub private: Zeroizing<Vec<u8>>,
}

impl KeyPair {
    #[must_use]
    pub fn new(public: Vec<u8>, private: Vec<u8>) -> Self {
        Self {
            public,
            private: Zeroizing::new(private),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &hex::encode(&self.public))
            .field("private", &"<redacted>")
            .finish()
    }
}

/// Audit facts about a scheme. Logged, never used for protocol decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderMetadata {
    pub family: CryptoMode,
    pub algorithm: &'static str,
    pub public_key_bytes: usize,
    pub private_key_bytes: usize,
    pub signature_bytes: usize,
    pub security_level: &'static str,
}

/// Sign/verify/keygen capability of one provider family.
pub trait SignatureProvider: Send + Sync {
    /// Provider name for logs and errors.
    fn name(&self) -> &'static str;

    /// Whether this provider handles `variant`.
    fn supports(&self, variant: SignatureVariant) -> bool;

    /// Key and signature sizes of `variant`.
    fn metadata(&self, variant: SignatureVariant) -> Result<ProviderMetadata, CryptoError>;

    /// Fresh random keypair for `variant`.
    fn generate_keypair(&self, variant: SignatureVariant) -> Result<KeyPair, CryptoError>;

    /// Sign `message`.
    fn sign(
        &self,
        variant: SignatureVariant,
        hash: HashAlgorithm,
        private: &[u8],
        message: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Verify `signature` over `message`.
    fn verify(
        &self,
        variant: SignatureVariant,
        hash: HashAlgorithm,
        public: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError>;
}

// =============================================================================
// CLASSICAL
// =============================================================================

/// secp256r1, secp256k1 and Ed25519.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClassicalProvider;

impl ClassicalProvider {
    fn unsupported(variant: SignatureVariant) -> CryptoError {
        CryptoError::UnsupportedVariant {
            variant,
            provider: "classical",
        }
    }
}

impl SignatureProvider for ClassicalProvider {
    fn name(&self) -> &'static str {
        "classical"
    }

    fn supports(&self, variant: SignatureVariant) -> bool {
        variant.family() == CryptoMode::Classical
    }

    fn metadata(&self, variant: SignatureVariant) -> Result<ProviderMetadata, CryptoError> {
        let (algorithm, public_key_bytes, private_key_bytes) = match variant {
            SignatureVariant::Secp256r1 => ("ECDSA P-256", 33, 32),
            SignatureVariant::Secp256k1 => ("ECDSA secp256k1", 33, 32),
            SignatureVariant::Ed25519 => ("Ed25519", 32, 32),
            other => return Err(Self::unsupported(other)),
        };
        Ok(ProviderMetadata {
            family: CryptoMode::Classical,
            algorithm,
            public_key_bytes,
            private_key_bytes,
            signature_bytes: 64,
            security_level: "128-bit classical",
        })
    }

    fn generate_keypair(&self, variant: SignatureVariant) -> Result<KeyPair, CryptoError> {
        match variant {
            SignatureVariant::Secp256r1 => Ok(secp256r1::generate()),
            SignatureVariant::Secp256k1 => Ok(secp256k1::generate()),
            SignatureVariant::Ed25519 => Ok(ed25519::generate()),
            other => Err(Self::unsupported(other)),
        }
    }

    fn sign(
        &self,
        variant: SignatureVariant,
        hash: HashAlgorithm,
        private: &[u8],
        message: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        match variant {
            SignatureVariant::Secp256r1 => secp256r1::sign(private, message, hash),
            SignatureVariant::Secp256k1 => secp256k1::sign(private, message, hash),
            SignatureVariant::Ed25519 => ed25519::sign(private, message),
            other => Err(Self::unsupported(other)),
        }
    }

    fn verify(
        &self,
        variant: SignatureVariant,
        hash: HashAlgorithm,
        public: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        match variant {
            SignatureVariant::Secp256r1 => secp256r1::verify(public, message, signature, hash),
            SignatureVariant::Secp256k1 => secp256k1::verify(public, message, signature, hash),
            SignatureVariant::Ed25519 => ed25519::verify(public, message, signature),
            other => Err(Self::unsupported(other)),
        }
    }
}

// =============================================================================
// POST-QUANTUM
// =============================================================================

/// ML-DSA-44, ML-DSA-65 and ML-DSA-87.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostQuantumProvider;

impl PostQuantumProvider {
    fn unsupported(variant: SignatureVariant) -> CryptoError {
        CryptoError::UnsupportedVariant {
            variant,
            provider: "post-quantum",
        }
    }
}

impl SignatureProvider for PostQuantumProvider {
    fn name(&self) -> &'static str {
        "post-quantum"
    }

    fn supports(&self, variant: SignatureVariant) -> bool {
        variant.family() == CryptoMode::PostQuantum
    }

    fn metadata(&self, variant: SignatureVariant) -> Result<ProviderMetadata, CryptoError> {
        let (algorithm, public_key_bytes, private_key_bytes, signature_bytes, security_level) =
            match variant {
                SignatureVariant::MlDsa44 => ("ML-DSA-44", 1312, 2560, 2420, "NIST level 2"),
                SignatureVariant::MlDsa65 => ("ML-DSA-65", 1952, 4032, 3309, "NIST level 3"),
                SignatureVariant::MlDsa87 => ("ML-DSA-87", 2592, 4896, 4627, "NIST level 5"),
                other => return Err(Self::unsupported(other)),
            };
        Ok(ProviderMetadata {
            family: CryptoMode::PostQuantum,
            algorithm,
            public_key_bytes,
            private_key_bytes,
            signature_bytes,
            security_level,
        })
    }

    fn generate_keypair(&self, variant: SignatureVariant) -> Result<KeyPair, CryptoError> {
        match variant {
            SignatureVariant::MlDsa44 => Ok(ml_dsa_44::generate()),
            SignatureVariant::MlDsa65 => Ok(ml_dsa_65::generate()),
            SignatureVariant::MlDsa87 => Ok(ml_dsa_87::generate()),
            other => Err(Self::unsupported(other)),
        }
    }

    fn sign(
        &self,
        variant: SignatureVariant,
        _hash: HashAlgorithm,
        private: &[u8],
        message: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        match variant {
            SignatureVariant::MlDsa44 => ml_dsa_44::sign(private, message),
            SignatureVariant::MlDsa65 => ml_dsa_65::sign(private, message),
            SignatureVariant::MlDsa87 => ml_dsa_87::sign(private, message),
            other => Err(Self::unsupported(other)),
        }
    }

    fn verify(
        &self,
        variant: SignatureVariant,
        _hash: HashAlgorithm,
        public: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        match variant {
            SignatureVariant::MlDsa44 => ml_dsa_44::verify(public, message, signature),
            SignatureVariant::MlDsa65 => ml_dsa_65::verify(public, message, signature),
            SignatureVariant::MlDsa87 => ml_dsa_87::verify(public, message, signature),
            other => Err(Self::unsupported(other)),
        }
    }
}

static CLASSICAL: ClassicalProvider = ClassicalProvider;
static POST_QUANTUM: PostQuantumProvider = PostQuantumProvider;

/// Provider responsible for `variant`.
///
/// # Errors
///
/// `UnsupportedVariant` for [`SignatureVariant::Unsigned`].
pub fn provider_for(variant: SignatureVariant) -> Result<&'static dyn SignatureProvider, CryptoError> {
    match variant.family() {
        CryptoMode::Classical => Ok(&CLASSICAL),
        CryptoMode::PostQuantum => Ok(&POST_QUANTUM),
        CryptoMode::None => Err(CryptoError::UnsupportedVariant {
            variant,
            provider: "none",
        }),
    }
}
