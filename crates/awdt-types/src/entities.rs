//! # Protocol Entities
//!
//! Payload variants carried by an [`Envelope`](crate::Envelope) and the
//! selectors that pick how it is signed.
//!
//! Exactly one payload variant is active at a time. Wire names match the
//! `messagetype` discriminator of the wire document.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::EnvelopeError;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

// =============================================================================
// CRYPTO SELECTORS
// =============================================================================

/// Which provider family signs and verifies payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CryptoMode {
    /// No signatures. Every verification reports valid.
    #[serde(rename = "none")]
    None,
    /// Elliptic-curve signatures.
    #[default]
    #[serde(rename = "classic")]
    Classical,
    /// ML-DSA lattice signatures.
    #[serde(rename = "pqc")]
    PostQuantum,
}

impl CryptoMode {
    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CryptoMode::None => "none",
            CryptoMode::Classical => "classic",
            CryptoMode::PostQuantum => "pqc",
        }
    }

    /// True when signing and verification are skipped.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        matches!(self, CryptoMode::None)
    }
}

impl fmt::Display for CryptoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CryptoMode {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(CryptoMode::None),
            "classic" | "classical" => Ok(CryptoMode::Classical),
            "pqc" | "post-quantum" => Ok(CryptoMode::PostQuantum),
            other => Err(EnvelopeError::UnknownCryptoMode(other.to_string())),
        }
    }
}

/// Signature scheme. The scheme decides which provider handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignatureVariant {
    /// ECDSA over NIST P-256.
    #[default]
    #[serde(rename = "secp256r1")]
    Secp256r1,
    /// ECDSA over secp256k1.
    #[serde(rename = "secp256k1")]
    Secp256k1,
    /// EdDSA over Curve25519.
    #[serde(rename = "ed25519")]
    Ed25519,
    /// ML-DSA-44 (Dilithium2).
    #[serde(rename = "ML-DSA-44", alias = "Dilithium2")]
    MlDsa44,
    /// ML-DSA-65 (Dilithium3).
    #[serde(rename = "ML-DSA-65", alias = "Dilithium3")]
    MlDsa65,
    /// ML-DSA-87 (Dilithium5).
    #[serde(rename = "ML-DSA-87", alias = "Dilithium5")]
    MlDsa87,
    /// No scheme; only valid together with [`CryptoMode::None`].
    #[serde(rename = "none")]
    Unsigned,
}

impl SignatureVariant {
    /// Every signing scheme, excluding [`SignatureVariant::Unsigned`].
    pub const SIGNING: [SignatureVariant; 6] = [
        SignatureVariant::Secp256r1,
        SignatureVariant::Secp256k1,
        SignatureVariant::Ed25519,
        SignatureVariant::MlDsa44,
        SignatureVariant::MlDsa65,
        SignatureVariant::MlDsa87,
    ];

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureVariant::Secp256r1 => "secp256r1",
            SignatureVariant::Secp256k1 => "secp256k1",
            SignatureVariant::Ed25519 => "ed25519",
            SignatureVariant::MlDsa44 => "ML-DSA-44",
            SignatureVariant::MlDsa65 => "ML-DSA-65",
            SignatureVariant::MlDsa87 => "ML-DSA-87",
            SignatureVariant::Unsigned => "none",
        }
    }

    /// Crypto mode this scheme belongs to.
    #[must_use]
    pub fn family(&self) -> CryptoMode {
        match self {
            SignatureVariant::Secp256r1 | SignatureVariant::Secp256k1 | SignatureVariant::Ed25519 => {
                CryptoMode::Classical
            }
            SignatureVariant::MlDsa44 | SignatureVariant::MlDsa65 | SignatureVariant::MlDsa87 => {
                CryptoMode::PostQuantum
            }
            SignatureVariant::Unsigned => CryptoMode::None,
        }
    }
}

impl fmt::Display for SignatureVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureVariant {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "secp256r1" | "p256" => Ok(SignatureVariant::Secp256r1),
            "secp256k1" | "k256" => Ok(SignatureVariant::Secp256k1),
            "ed25519" => Ok(SignatureVariant::Ed25519),
            "ML-DSA-44" | "ml-dsa-44" | "Dilithium2" => Ok(SignatureVariant::MlDsa44),
            "ML-DSA-65" | "ml-dsa-65" | "Dilithium3" => Ok(SignatureVariant::MlDsa65),
            "ML-DSA-87" | "ml-dsa-87" | "Dilithium5" => Ok(SignatureVariant::MlDsa87),
            "none" => Ok(SignatureVariant::Unsigned),
            other => Err(EnvelopeError::UnknownVariant(other.to_string())),
        }
    }
}

/// Digest applied to the canonical bytes before classical signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Sign the message as-is.
    None,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::None => "none",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(HashAlgorithm::None),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            other => Err(EnvelopeError::UnknownHashAlgorithm(other.to_string())),
        }
    }
}

/// Benchmarking scenario id (1-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Scenario(u8);

impl Scenario {
    /// Highest scenario id.
    pub const MAX: u8 = 8;

    /// Create a scenario id, rejecting values outside 1..=8.
    pub fn new(id: u8) -> Result<Self, EnvelopeError> {
        if (1..=Self::MAX).contains(&id) {
            Ok(Self(id))
        } else {
            Err(EnvelopeError::InvalidScenario(id))
        }
    }

    #[must_use]
    pub fn id(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Scenario {
    type Error = EnvelopeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Scenario::new(value)
    }
}

impl From<Scenario> for u8 {
    fn from(s: Scenario) -> Self {
        s.0
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Crypto and scenario selectors stamped on every envelope of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionProfile {
    pub crypto_mode: CryptoMode,
    pub variant: SignatureVariant,
    pub hash_algo: HashAlgorithm,
    pub scenario: Option<Scenario>,
}

// =============================================================================
// PAYLOAD VARIANTS
// =============================================================================

/// What a device is asking the server for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Update,
    BootTicket,
    DefTicket,
}

impl RequestType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Update => "update",
            RequestType::BootTicket => "bootticket",
            RequestType::DefTicket => "defticket",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nonce challenge sent from device to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub request_type: RequestType,
    pub timestamp: Timestamp,
    pub nonce: String,
}

/// Credential that lets a device past boot and seeds its watchdog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootTicket {
    pub ticket_ref: String,
    pub nonce: String,
    pub issued_at: Timestamp,
    pub counter_init_seconds: u64,
}

/// Credential that pushes the watchdog deadline out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefTicket {
    pub nonce: String,
    pub deferral_seconds: u64,
    pub issued_at: Timestamp,
}

/// Firmware update. `version` must be exactly one above the device's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub update_kind: String,
    pub payload_ref: String,
    pub version: u64,
    pub issued_at: Timestamp,
}

/// Sensor reading reported to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasuredData {
    pub value: u32,
    pub timestamp: Timestamp,
}

/// Tagged union of payloads. Serializes as `{"messagetype": .., "data": {..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "messagetype", content = "data")]
pub enum Payload {
    #[serde(rename = "request")]
    Request(Request),
    #[serde(rename = "bootticket")]
    BootTicket(BootTicket),
    #[serde(rename = "defticket")]
    DefTicket(DefTicket),
    #[serde(rename = "update")]
    Update(Update),
    #[serde(rename = "measured_data")]
    MeasuredData(MeasuredData),
}

impl Payload {
    /// Discriminator names accepted on the wire.
    pub const MESSAGE_TYPES: [&'static str; 5] =
        ["request", "bootticket", "defticket", "update", "measured_data"];

    /// Placeholder meaning "no boot ticket is available".
    #[must_use]
    pub fn empty_boot_ticket() -> Self {
        Payload::BootTicket(BootTicket::default())
    }

    /// Placeholder meaning "no acceptable update is available".
    #[must_use]
    pub fn empty_update() -> Self {
        Payload::Update(Update::default())
    }

    /// Discriminator of the active variant.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Request(_) => "request",
            Payload::BootTicket(_) => "bootticket",
            Payload::DefTicket(_) => "defticket",
            Payload::Update(_) => "update",
            Payload::MeasuredData(_) => "measured_data",
        }
    }

    /// Request type that fetches a fresh copy of this item, if it is fetchable.
    #[must_use]
    pub fn missing_item(&self) -> Option<RequestType> {
        match self {
            Payload::BootTicket(_) => Some(RequestType::BootTicket),
            Payload::Update(_) => Some(RequestType::Update),
            Payload::DefTicket(_) => Some(RequestType::DefTicket),
            Payload::Request(_) | Payload::MeasuredData(_) => None,
        }
    }

    /// Nonce echoed by tickets.
    #[must_use]
    pub fn ticket_nonce(&self) -> Option<&str> {
        match self {
            Payload::BootTicket(t) => Some(&t.nonce),
            Payload::DefTicket(t) => Some(&t.nonce),
            _ => None,
        }
    }
}
