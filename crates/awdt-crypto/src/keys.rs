//! # Key Material Layout
//!
//! Each role keeps its own private key and its peer's public key in its
//! secure storage path:
//!
//! | Owner | Path | Private key | Peer public key |
//! |-------|------|-------------|-----------------|
//! | Device | `device_secure_storage` | `device_priv_key.<variant>` | `server_pub_key.<variant>` |
//! | Server | `server_secure_storage` | `server_priv_key.<variant>` | `device_pub_key.<variant>` |
//!
//! Key files hold the raw encoded key bytes.

use awdt_storage::layout::{DEVICE_SECURE_STORAGE, SERVER_SECURE_STORAGE};
use awdt_storage::ObjectStore;
use awdt_types::SignatureVariant;
use tracing::info;
use zeroize::Zeroizing;

use crate::errors::CryptoError;
use crate::provider::provider_for;

/// Which side of the boundary owns a key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyOwner {
    Device,
    Server,
}

impl KeyOwner {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            KeyOwner::Device => "device",
            KeyOwner::Server => "server",
        }
    }

    /// Secure storage path of this owner.
    #[must_use]
    pub fn storage_path(&self) -> &'static str {
        match self {
            KeyOwner::Device => DEVICE_SECURE_STORAGE,
            KeyOwner::Server => SERVER_SECURE_STORAGE,
        }
    }

    /// The other side of the boundary.
    #[must_use]
    pub fn peer(&self) -> KeyOwner {
        match self {
            KeyOwner::Device => KeyOwner::Server,
            KeyOwner::Server => KeyOwner::Device,
        }
    }
}

/// Where one role finds its keys for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLocator {
    pub owner: KeyOwner,
    pub variant: SignatureVariant,
}

impl KeyLocator {
    #[must_use]
    pub fn new(owner: KeyOwner, variant: SignatureVariant) -> Self {
        Self { owner, variant }
    }

    /// `(path, key)` of this owner's private key.
    #[must_use]
    pub fn private_key(&self) -> (&'static str, String) {
        (
            self.owner.storage_path(),
            format!("{}_priv_key.{}", self.owner.name(), self.variant),
        )
    }

    /// `(path, key)` of the peer's public key, stored with this owner.
    #[must_use]
    pub fn peer_public_key(&self) -> (&'static str, String) {
        (
            self.owner.storage_path(),
            format!("{}_pub_key.{}", self.owner.peer().name(), self.variant),
        )
    }

    /// Load this owner's private key.
    pub fn load_private(&self, store: &dyn ObjectStore) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let (path, key) = self.private_key();
        store
            .get(path, &key)
            .map(Zeroizing::new)
            .map_err(|source| CryptoError::KeyUnavailable {
                path: path.to_string(),
                key,
                source,
            })
    }

    /// Load the peer's public key.
    pub fn load_peer_public(&self, store: &dyn ObjectStore) -> Result<Vec<u8>, CryptoError> {
        let (path, key) = self.peer_public_key();
        store.get(path, &key).map_err(|source| CryptoError::KeyUnavailable {
            path: path.to_string(),
            key,
            source,
        })
    }
}

/// Generate fresh device and server keypairs for `variant` and store them.
///
/// Each private key lands with its owner and each public key with the peer.
/// Existing keys for the variant are replaced.
pub fn provision_keys(store: &dyn ObjectStore, variant: SignatureVariant) -> Result<(), CryptoError> {
    let provider = provider_for(variant)?;

    for owner in [KeyOwner::Device, KeyOwner::Server] {
        let keypair = provider.generate_keypair(variant)?;
        let own = KeyLocator::new(owner, variant);
        let peer = KeyLocator::new(owner.peer(), variant);

        let (path, key) = own.private_key();
        store
            .put(path, &key, &keypair.private)
            .map_err(|source| CryptoError::KeyUnavailable {
                path: path.to_string(),
                key,
                source,
            })?;

        let (path, key) = peer.peer_public_key();
        store
            .put(path, &key, &keypair.public)
            .map_err(|source| CryptoError::KeyUnavailable {
                path: path.to_string(),
                key,
                source,
            })?;
    }

    info!(variant = %variant, provider = provider.name(), "[keys] provisioned device and server keypairs");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use awdt_storage::InMemoryStore;

    #[test]
    fn test_key_file_names() {
        let device = KeyLocator::new(KeyOwner::Device, SignatureVariant::MlDsa65);
        assert_eq!(
            device.private_key(),
            ("device_secure_storage", "device_priv_key.ML-DSA-65".to_string())
        );
        assert_eq!(
            device.peer_public_key(),
            ("device_secure_storage", "server_pub_key.ML-DSA-65".to_string())
        );
    }

    #[test]
    fn test_provision_places_keys_with_owner_and_peer() {
        let store = InMemoryStore::new();
        provision_keys(&store, SignatureVariant::Ed25519).unwrap();

        let device = KeyLocator::new(KeyOwner::Device, SignatureVariant::Ed25519);
        let server = KeyLocator::new(KeyOwner::Server, SignatureVariant::Ed25519);
        assert_eq!(device.load_private(&store).unwrap().len(), 32);
        assert_eq!(server.load_peer_public(&store).unwrap().len(), 32);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_missing_key_is_unavailable() {
        let store = InMemoryStore::new();
        let locator = KeyLocator::new(KeyOwner::Server, SignatureVariant::Secp256r1);
        assert!(matches!(
            locator.load_private(&store),
            Err(CryptoError::KeyUnavailable { .. })
        ));
    }

    #[test]
    fn test_unsigned_variant_cannot_be_provisioned() {
        let store = InMemoryStore::new();
        assert!(provision_keys(&store, SignatureVariant::Unsigned).is_err());
        assert!(store.is_empty());
    }
}
