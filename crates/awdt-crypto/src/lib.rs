//! # AWDT Crypto - Signature Orchestration
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `ecdsa` | secp256r1, secp256k1 | Classical payload signatures (prehashed) |
//! | `signatures` | Ed25519 | Classical payload signatures |
//! | `pqc` | ML-DSA-44/65/87 | Post-quantum payload signatures |
//! | `hashing` | SHA-256/384/512 | Prehash for classical signing |
//! | `provider` | - | Uniform sign/verify/keygen capability per family |
//! | `orchestrator` | - | Picks the provider, canonicalizes, hex-encodes |
//! | `keys` | - | Key file layout and provisioning |
//!
//! ## Security Properties
//!
//! - Only the tagged payload is signed; routing metadata never is
//! - `CryptoMode::None` short-circuits without touching any provider
//! - An envelope whose crypto mode or variant differs from the role's policy
//!   never verifies
//! - Private key bytes are zeroized after each use

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod keys;
pub mod orchestrator;
pub mod pqc;
pub mod provider;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use keys::{provision_keys, KeyLocator, KeyOwner};
pub use orchestrator::{generate_keypair, sign, verify, CryptoOrchestrator, CryptoPolicy};
pub use provider::{
    provider_for, ClassicalProvider, KeyPair, PostQuantumProvider, ProviderMetadata,
    SignatureProvider,
};
