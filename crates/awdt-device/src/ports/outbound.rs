//! # Outbound Ports (Driven Ports)
//!
//! Randomness the device draws on. Production uses [`OsEntropy`]; tests
//! plug in fixed values so nonces and readings are predictable.

use rand::Rng;

/// Inclusive range of simulated sensor readings.
pub const SENSOR_RANGE: std::ops::RangeInclusive<u32> = 4..=14;

/// Bytes of randomness in a nonce before hex encoding.
pub const NONCE_BYTES: usize = 32;

/// Source of nonces and sensor readings.
pub trait EntropySource: Send + Sync {
    /// Fresh hex-encoded nonce of [`NONCE_BYTES`] random bytes.
    fn nonce(&self) -> String;

    /// One sensor reading within [`SENSOR_RANGE`].
    fn sensor_value(&self) -> u32;
}

/// Operating-system randomness.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn nonce(&self) -> String {
        let mut bytes = [0u8; NONCE_BYTES];
        rand::thread_rng().fill(&mut bytes);
        hex::encode(bytes)
    }

    fn sensor_value(&self) -> u32 {
        rand::thread_rng().gen_range(SENSOR_RANGE)
    }
}
