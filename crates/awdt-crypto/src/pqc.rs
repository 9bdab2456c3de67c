//! # ML-DSA Signatures (FIPS 204)
//!
//! Lattice signatures at three parameter sets.
//!
//! | Set | NIST level | Public key | Private key | Signature |
//! |-----|-----------|------------|-------------|-----------|
//! | ML-DSA-44 | 2 | 1312 | 2560 | 2420 |
//! | ML-DSA-65 | 3 | 1952 | 4032 | 3309 |
//! | ML-DSA-87 | 5 | 2592 | 4896 | 4627 |
//!
//! Keys travel in their FIPS 204 encoded form. The message is signed directly;
//! the envelope's hash algorithm does not apply.

use crate::errors::CryptoError;
use crate::provider::KeyPair;

macro_rules! ml_dsa_suite {
    ($module:ident, $params:ident) => {
        pub mod $module {
            use super::{CryptoError, KeyPair};
            use ml_dsa::signature::{Signer, Verifier};
            use ml_dsa::{
                $params, EncodedSigningKey, EncodedVerifyingKey, KeyGen, Signature, SigningKey,
                VerifyingKey,
            };
            use rand::rngs::OsRng;

            /// Generate a random keypair.
            pub fn generate() -> KeyPair {
                let keypair = $params::key_gen(&mut OsRng);
                let public = keypair.verifying_key().encode();
                let private = keypair.signing_key().encode();
                KeyPair::new(
                    AsRef::<[u8]>::as_ref(&public).to_vec(),
                    AsRef::<[u8]>::as_ref(&private).to_vec(),
                )
            }

            /// Sign `message` with an encoded signing key.
            pub fn sign(private: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
                let encoded = EncodedSigningKey::<$params>::try_from(private)
                    .map_err(|_| CryptoError::InvalidPrivateKey)?;
                // decode() cannot fail once the input has the encoded length.
                let signing_key = SigningKey::<$params>::decode(&encoded);
                let signature: Signature<$params> = signing_key.sign(message);
                let encoded_sig = signature.encode();
                Ok(AsRef::<[u8]>::as_ref(&encoded_sig).to_vec())
            }

            /// Verify an encoded signature. Malformed signatures verify as `false`.
            pub fn verify(
                public: &[u8],
                message: &[u8],
                signature: &[u8],
            ) -> Result<bool, CryptoError> {
                let encoded = EncodedVerifyingKey::<$params>::try_from(public)
                    .map_err(|_| CryptoError::InvalidPublicKey)?;
                let verifying_key = VerifyingKey::<$params>::decode(&encoded);
                let Ok(signature) = Signature::<$params>::try_from(signature) else {
                    return Ok(false);
                };
                Ok(verifying_key.verify(message, &signature).is_ok())
            }
        }
    };
}

ml_dsa_suite!(ml_dsa_44, MlDsa44);
ml_dsa_suite!(ml_dsa_65, MlDsa65);
ml_dsa_suite!(ml_dsa_87, MlDsa87);
