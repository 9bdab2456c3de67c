//! # ECDSA Signatures (secp256r1, secp256k1)
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S signatures on secp256k1
//! - Keys: 32-byte scalar private, compressed SEC1 public
//! - Signatures: fixed 64-byte `r || s`
//!
//! With a hash algorithm set, the message is digested first and the digest
//! signed through the prehash API. Without one, the curve's default SHA-256
//! message signing is used.

use crate::errors::CryptoError;
use crate::provider::KeyPair;

macro_rules! ecdsa_curve {
    ($module:ident, $krate:ident) => {
        pub mod $module {
            use super::{CryptoError, KeyPair};
            use crate::hashing::digest;
            use awdt_types::HashAlgorithm;
            use $krate::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
            use $krate::ecdsa::signature::{Signer, Verifier};
            use $krate::ecdsa::{Signature, SigningKey, VerifyingKey};
            use rand::rngs::OsRng;

            /// Generate a random keypair.
            pub fn generate() -> KeyPair {
                let signing_key = SigningKey::random(&mut OsRng);
                let public = signing_key
                    .verifying_key()
                    .to_encoded_point(true)
                    .as_bytes()
                    .to_vec();
                KeyPair::new(public, signing_key.to_bytes().to_vec())
            }

            /// Sign `message`, prehashing with `hash` unless it is `None`.
            pub fn sign(
                private: &[u8],
                message: &[u8],
                hash: HashAlgorithm,
            ) -> Result<Vec<u8>, CryptoError> {
                let signing_key =
                    SigningKey::from_slice(private).map_err(|_| CryptoError::InvalidPrivateKey)?;
                let signature: Signature = match digest(hash, message) {
                    Some(prehash) => signing_key
                        .sign_prehash(&prehash)
                        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?,
                    None => signing_key.sign(message),
                };
                Ok(signature.to_bytes().to_vec())
            }

            /// Verify a 64-byte signature. Malformed signatures verify as `false`.
            pub fn verify(
                public: &[u8],
                message: &[u8],
                signature: &[u8],
                hash: HashAlgorithm,
            ) -> Result<bool, CryptoError> {
                let verifying_key = VerifyingKey::from_sec1_bytes(public)
                    .map_err(|_| CryptoError::InvalidPublicKey)?;
                let Ok(signature) = Signature::from_slice(signature) else {
                    return Ok(false);
                };
                let valid = match digest(hash, message) {
                    Some(prehash) => verifying_key.verify_prehash(&prehash, &signature).is_ok(),
                    None => verifying_key.verify(message, &signature).is_ok(),
                };
                Ok(valid)
            }
        }
    };
}

ecdsa_curve!(secp256r1, p256);
ecdsa_curve!(secp256k1, k256);

#[cfg(test)]
mod tests {
    use super::*;
    use awdt_types::HashAlgorithm;

    const ALL_HASHES: [HashAlgorithm; 4] = [
        HashAlgorithm::None,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    #[test]
    fn test_p256_sign_verify_every_hash() {
        let keypair = secp256r1::generate();
        for hash in ALL_HASHES {
            let sig = secp256r1::sign(&keypair.private, b"payload", hash).unwrap();
            assert_eq!(sig.len(), 64);
            assert!(secp256r1::verify(&keypair.public, b"payload", &sig, hash).unwrap());
        }
    }

    #[test]
    fn test_public_keys_are_compressed_points() {
        for public in [secp256r1::generate().public, secp256k1::generate().public] {
            assert_eq!(public.len(), 33);
            assert!(matches!(public[0], 0x02 | 0x03));
        }
    }

    #[test]
    fn test_k256_wrong_message_fails() {
        let keypair = secp256k1::generate();
        let sig = secp256k1::sign(&keypair.private, b"message1", HashAlgorithm::Sha256).unwrap();
        assert!(!secp256k1::verify(&keypair.public, b"message2", &sig, HashAlgorithm::Sha256).unwrap());
    }

    #[test]
    fn test_hash_mismatch_fails() {
        let keypair = secp256r1::generate();
        let sig = secp256r1::sign(&keypair.private, b"payload", HashAlgorithm::Sha256).unwrap();
        assert!(!secp256r1::verify(&keypair.public, b"payload", &sig, HashAlgorithm::Sha512).unwrap());
    }

    #[test]
    fn test_deterministic_signatures() {
        let keypair = secp256k1::generate();
        let a = secp256k1::sign(&keypair.private, b"same", HashAlgorithm::Sha384).unwrap();
        let b = secp256k1::sign(&keypair.private, b"same", HashAlgorithm::Sha384).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_malformed_inputs() {
        let keypair = secp256r1::generate();
        assert!(matches!(
            secp256r1::sign(&[0u8; 5], b"m", HashAlgorithm::Sha256),
            Err(CryptoError::InvalidPrivateKey)
        ));
        assert!(matches!(
            secp256r1::verify(&[1u8; 10], b"m", &[0u8; 64], HashAlgorithm::Sha256),
            Err(CryptoError::InvalidPublicKey)
        ));
        assert!(!secp256r1::verify(&keypair.public, b"m", &[0u8; 3], HashAlgorithm::Sha256).unwrap());
    }

    #[test]
    fn test_cross_curve_keys_rejected() {
        let k1 = secp256k1::generate();
        let sig = secp256k1::sign(&k1.private, b"m", HashAlgorithm::Sha256).unwrap();
        // A secp256k1 point is not on P-256.
        let result = secp256r1::verify(&k1.public, b"m", &sig, HashAlgorithm::Sha256);
        assert!(!matches!(result, Ok(true)));
    }
}
