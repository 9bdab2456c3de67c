//! # Crypto Orchestrator
//!
//! Binds one role's crypto policy to its key material and turns envelopes
//! into signatures and verdicts.
//!
//! ## Flow
//!
//! ```text
//! payload ──canonical_payload_bytes──→ bytes ──provider.sign──→ sig ──hex──→ envelope.signature
//! envelope.signature ──hex decode──→ sig ──provider.verify(bytes)──→ bool
//! ```
//!
//! `CryptoMode::None` never reaches a provider: signing leaves the signature
//! empty and verification reports valid.

use std::sync::Arc;

use awdt_storage::ObjectStore;
use awdt_types::{
    canonical_payload_bytes, CryptoMode, Envelope, HashAlgorithm, Payload, SignatureVariant,
};
use tracing::{debug, warn};

use crate::errors::CryptoError;
use crate::keys::{KeyLocator, KeyOwner};
use crate::provider::{provider_for, KeyPair, ProviderMetadata};

/// Crypto selectors a role runs with for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CryptoPolicy {
    mode: CryptoMode,
    variant: SignatureVariant,
    hash: HashAlgorithm,
}

impl CryptoPolicy {
    /// Validated policy.
    ///
    /// # Errors
    ///
    /// `InvalidPolicy` when a signing mode is paired with a variant from
    /// another family.
    pub fn new(
        mode: CryptoMode,
        variant: SignatureVariant,
        hash: HashAlgorithm,
    ) -> Result<Self, CryptoError> {
        if !mode.is_disabled() && variant.family() != mode {
            return Err(CryptoError::InvalidPolicy(format!(
                "variant {variant} belongs to {}, not {mode}",
                variant.family()
            )));
        }
        Ok(Self { mode, variant, hash })
    }

    /// Policy that never signs.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            mode: CryptoMode::None,
            variant: SignatureVariant::Unsigned,
            hash: HashAlgorithm::None,
        }
    }

    #[must_use]
    pub fn mode(&self) -> CryptoMode {
        self.mode
    }

    #[must_use]
    pub fn variant(&self) -> SignatureVariant {
        self.variant
    }

    #[must_use]
    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }
}

impl Default for CryptoPolicy {
    fn default() -> Self {
        Self {
            mode: CryptoMode::Classical,
            variant: SignatureVariant::Secp256r1,
            hash: HashAlgorithm::Sha256,
        }
    }
}

// =============================================================================
// FREE FUNCTIONS
// =============================================================================

/// Sign the canonical bytes of `payload`. `Unsigned` yields an empty signature.
pub fn sign(
    payload: Option<&Payload>,
    variant: SignatureVariant,
    hash: HashAlgorithm,
    private: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if variant == SignatureVariant::Unsigned {
        return Ok(Vec::new());
    }
    let message = canonical_payload_bytes(payload)?;
    provider_for(variant)?.sign(variant, hash, private, &message)
}

/// Verify `signature` over the canonical bytes of `payload`. `Unsigned` is
/// always valid.
pub fn verify(
    payload: Option<&Payload>,
    signature: &[u8],
    variant: SignatureVariant,
    hash: HashAlgorithm,
    public: &[u8],
) -> Result<bool, CryptoError> {
    if variant == SignatureVariant::Unsigned {
        return Ok(true);
    }
    let message = canonical_payload_bytes(payload)?;
    provider_for(variant)?.verify(variant, hash, public, &message, signature)
}

/// Fresh keypair for `variant`.
pub fn generate_keypair(variant: SignatureVariant) -> Result<KeyPair, CryptoError> {
    provider_for(variant)?.generate_keypair(variant)
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// Signs outbound and verifies inbound envelopes for one role.
#[derive(Clone)]
pub struct CryptoOrchestrator {
    policy: CryptoPolicy,
    keys: KeyLocator,
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for CryptoOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoOrchestrator")
            .field("policy", &self.policy)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl CryptoOrchestrator {
    pub fn new(policy: CryptoPolicy, owner: KeyOwner, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            policy,
            keys: KeyLocator::new(owner, policy.variant()),
            store,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &CryptoPolicy {
        &self.policy
    }

    /// Provider metadata of the active variant, `None` when crypto is off.
    #[must_use]
    pub fn metadata(&self) -> Option<ProviderMetadata> {
        if self.policy.mode().is_disabled() {
            return None;
        }
        provider_for(self.policy.variant())
            .and_then(|p| p.metadata(self.policy.variant()))
            .ok()
    }

    /// Sign the envelope's payload in place.
    ///
    /// # Errors
    ///
    /// Mode or variant mismatch with the policy, missing private key, or a
    /// provider failure.
    pub fn sign_envelope(&self, envelope: &mut Envelope) -> Result<(), CryptoError> {
        self.check_selectors(envelope)?;
        if self.policy.mode().is_disabled() {
            envelope.signature.clear();
            return Ok(());
        }

        let private = self.keys.load_private(self.store.as_ref())?;
        let signature = sign(
            envelope.payload.as_ref(),
            self.policy.variant(),
            self.policy.hash(),
            &private,
        )?;
        envelope.signature = hex::encode(signature);

        debug!(
            owner = self.keys.owner.name(),
            variant = %self.policy.variant(),
            payload = envelope.payload_kind(),
            "[crypto] envelope signed"
        );
        Ok(())
    }

    /// Verify the envelope's signature against the peer's public key.
    ///
    /// `Ok(false)` is a verification failure. `Err` means the check could not
    /// be carried out (policy mismatch, missing key material).
    pub fn verify_envelope(&self, envelope: &Envelope) -> Result<bool, CryptoError> {
        self.check_selectors(envelope)?;
        if self.policy.mode().is_disabled() {
            return Ok(true);
        }

        let Ok(signature) = hex::decode(&envelope.signature) else {
            warn!(owner = self.keys.owner.name(), "[crypto] signature is not valid hex");
            return Ok(false);
        };
        if signature.is_empty() {
            return Ok(false);
        }

        let public = self.keys.load_peer_public(self.store.as_ref())?;
        let verdict = verify(
            envelope.payload.as_ref(),
            &signature,
            self.policy.variant(),
            self.policy.hash(),
            &public,
        );
        match verdict {
            Ok(valid) => Ok(valid),
            // A peer key that no longer decodes is treated like a bad signature.
            Err(CryptoError::InvalidPublicKey) => {
                warn!(owner = self.keys.owner.name(), "[crypto] peer public key does not decode");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn check_selectors(&self, envelope: &Envelope) -> Result<(), CryptoError> {
        if envelope.crypto_mode != self.policy.mode() {
            return Err(CryptoError::ModeMismatch {
                expected: self.policy.mode(),
                found: envelope.crypto_mode,
            });
        }
        if !self.policy.mode().is_disabled() && envelope.variant != self.policy.variant() {
            return Err(CryptoError::VariantMismatch {
                expected: self.policy.variant(),
                found: envelope.variant,
            });
        }
        Ok(())
    }
}
