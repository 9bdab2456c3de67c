//! # SHA-2 Prehashing
//!
//! Classical ECDSA signs the digest selected by the envelope's hash algorithm.

use awdt_types::HashAlgorithm;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Digest `data` with `algorithm`. `HashAlgorithm::None` yields `None`.
pub fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Option<Vec<u8>> {
    match algorithm {
        HashAlgorithm::None => None,
        HashAlgorithm::Sha256 => Some(Sha256::digest(data).to_vec()),
        HashAlgorithm::Sha384 => Some(Sha384::digest(data).to_vec()),
        HashAlgorithm::Sha512 => Some(Sha512::digest(data).to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_lengths() {
        assert!(digest(HashAlgorithm::None, b"x").is_none());
        assert_eq!(digest(HashAlgorithm::Sha256, b"x").unwrap().len(), 32);
        assert_eq!(digest(HashAlgorithm::Sha384, b"x").unwrap().len(), 48);
        assert_eq!(digest(HashAlgorithm::Sha512, b"x").unwrap().len(), 64);
    }

    #[test]
    fn test_sha256_known_vector() {
        let d = digest(HashAlgorithm::Sha256, b"abc").unwrap();
        assert_eq!(
            hex::encode(d),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
