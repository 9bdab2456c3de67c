//! # Ed25519 Signatures
//!
//! Twisted Edwards curve signatures with deterministic nonces.
//!
//! Ed25519 hashes internally with SHA-512, so the envelope's hash algorithm
//! is ignored and the canonical bytes are signed as-is.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::errors::CryptoError;
use crate::provider::KeyPair;

/// Generate a random keypair (32-byte seed, 32-byte public key).
pub fn generate() -> KeyPair {
    let signing_key = SigningKey::generate(&mut OsRng);
    KeyPair::new(
        signing_key.verifying_key().to_bytes().to_vec(),
        signing_key.to_bytes().to_vec(),
    )
}

/// Sign `message` with a 32-byte seed.
pub fn sign(private: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let seed: Zeroizing<[u8; 32]> = Zeroizing::new(
        private
            .try_into()
            .map_err(|_| CryptoError::InvalidPrivateKey)?,
    );
    let signing_key = SigningKey::from_bytes(&seed);
    Ok(signing_key.sign(message).to_bytes().to_vec())
}

/// Verify a 64-byte signature. Malformed signatures verify as `false`.
pub fn verify(public: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
    let public: [u8; 32] = public
        .try_into()
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    let verifying_key =
        VerifyingKey::from_bytes(&public).map_err(|_| CryptoError::InvalidPublicKey)?;
    let Ok(signature) = Signature::from_slice(signature) else {
        return Ok(false);
    };
    Ok(verifying_key.verify(message, &signature).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let keypair = generate();
        let sig = sign(&keypair.private, b"Hello, Ed25519!").unwrap();
        assert!(verify(&keypair.public, b"Hello, Ed25519!", &sig).unwrap());
    }

    #[test]
    fn test_wrong_message_fails() {
        let keypair = generate();
        let sig = sign(&keypair.private, b"message1").unwrap();
        assert!(!verify(&keypair.public, b"message2", &sig).unwrap());
    }

    #[test]
    fn test_deterministic_signatures() {
        let seed = [0x42u8; 32];
        assert_eq!(sign(&seed, b"same").unwrap(), sign(&seed, b"same").unwrap());
    }

    #[test]
    fn test_bad_key_lengths() {
        assert!(matches!(sign(&[0u8; 31], b"m"), Err(CryptoError::InvalidPrivateKey)));
        assert!(matches!(
            verify(&[0u8; 12], b"m", &[0u8; 64]),
            Err(CryptoError::InvalidPublicKey)
        ));
    }
}
