//! # Wire Document
//!
//! Transport-neutral form of an envelope.
//!
//! ```json
//! {
//!   "messagetype": "bootticket",
//!   "history": ["boot", "device", "boot", "staging_area"],
//!   "cursor": 2,
//!   "signature": "3045...",
//!   "crypto": "classic",
//!   "variant": "secp256r1",
//!   "scenario": 3,
//!   "hash_algo": "sha256",
//!   "data": { "ticket_ref": "...", "nonce": "...", ... }
//! }
//! ```
//!
//! Addresses never enter the document. A [`Parcel`] carries them alongside.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::entities::{CryptoMode, HashAlgorithm, Payload, Scenario, SignatureVariant};
use crate::envelope::{Addresses, Envelope};
use crate::errors::WireError;
use crate::roles::Role;

/// Discriminator used when an envelope has no payload.
pub const EMPTY_MESSAGE_TYPE: &str = "message";

/// Serialized envelope minus addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireDocument {
    pub messagetype: String,
    pub history: Vec<Role>,
    pub cursor: usize,
    pub signature: String,
    pub crypto: CryptoMode,
    pub variant: SignatureVariant,
    pub scenario: Option<Scenario>,
    pub hash_algo: HashAlgorithm,
    pub data: Value,
}

impl WireDocument {
    /// Build the document for an envelope.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, WireError> {
        let (messagetype, data) = split_payload(envelope.payload.as_ref())?;
        Ok(Self {
            messagetype,
            history: envelope.history().to_vec(),
            cursor: envelope.cursor(),
            signature: envelope.signature.clone(),
            crypto: envelope.crypto_mode,
            variant: envelope.variant,
            scenario: envelope.scenario,
            hash_algo: envelope.hash_algo,
            data,
        })
    }

    /// Reconstruct the envelope, attaching the transport's addresses.
    pub fn into_envelope(self, addresses: Addresses) -> Result<Envelope, WireError> {
        let payload = join_payload(&self.messagetype, self.data)?;
        Ok(Envelope::from_parts(
            addresses,
            self.history,
            self.cursor,
            self.signature,
            self.crypto,
            self.variant,
            self.scenario,
            self.hash_algo,
            payload,
        )?)
    }

    /// JSON bytes of an envelope's document.
    pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, WireError> {
        let doc = Self::from_envelope(envelope)?;
        serde_json::to_vec(&doc).map_err(|e| WireError::Encode(e.to_string()))
    }

    /// Parse JSON bytes back into an envelope.
    pub fn decode(bytes: &[u8], addresses: Addresses) -> Result<Envelope, WireError> {
        let doc: WireDocument = serde_json::from_slice(bytes)?;
        doc.into_envelope(addresses)
    }
}

/// What crosses the device/server boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parcel {
    pub body: Vec<u8>,
    pub addresses: Addresses,
}

impl Parcel {
    /// Serialize an envelope for the transport.
    pub fn seal(envelope: &Envelope) -> Result<Self, WireError> {
        Ok(Self {
            body: WireDocument::encode(envelope)?,
            addresses: envelope.addresses.clone(),
        })
    }

    /// Rebuild the envelope on the receiving side.
    pub fn open(&self) -> Result<Envelope, WireError> {
        WireDocument::decode(&self.body, self.addresses.clone())
    }
}

/// Deterministic bytes that get signed: the tagged payload and nothing else.
pub fn canonical_payload_bytes(payload: Option<&Payload>) -> Result<Vec<u8>, WireError> {
    let value = match payload {
        Some(p) => serde_json::to_value(p).map_err(|e| WireError::Encode(e.to_string()))?,
        None => json!({ "messagetype": EMPTY_MESSAGE_TYPE, "data": {} }),
    };
    serde_json::to_vec(&value).map_err(|e| WireError::Encode(e.to_string()))
}

fn split_payload(payload: Option<&Payload>) -> Result<(String, Value), WireError> {
    let Some(payload) = payload else {
        return Ok((EMPTY_MESSAGE_TYPE.to_string(), json!({})));
    };
    let mut tagged = serde_json::to_value(payload).map_err(|e| WireError::Encode(e.to_string()))?;
    let data = tagged
        .get_mut("data")
        .map(Value::take)
        .ok_or_else(|| WireError::Encode("payload has no data section".into()))?;
    Ok((payload.kind().to_string(), data))
}

fn join_payload(messagetype: &str, data: Value) -> Result<Option<Payload>, WireError> {
    if messagetype == EMPTY_MESSAGE_TYPE {
        return Ok(None);
    }
    if !Payload::MESSAGE_TYPES.contains(&messagetype) {
        return Err(WireError::UnknownMessageType(messagetype.to_string()));
    }
    let payload = serde_json::from_value(json!({ "messagetype": messagetype, "data": data }))?;
    Ok(Some(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BootTicket, MeasuredData, SessionProfile, Update};
    use crate::envelope::EndpointAddr;

    fn addresses() -> Addresses {
        Addresses {
            device: EndpointAddr::new("device-0"),
            server: EndpointAddr::new("server-0"),
        }
    }

    fn ticket_envelope() -> Envelope {
        let mut env = Envelope::entry(Role::Boot, &SessionProfile::default(), addresses());
        env.step(Role::Device);
        env.set_payload(Payload::BootTicket(BootTicket {
            ticket_ref: "bootticket_10".into(),
            nonce: "n-1".into(),
            issued_at: 10,
            counter_init_seconds: 25,
        }));
        env.signature = "abcd".into();
        env
    }

    #[test]
    fn test_document_layout() {
        let doc = WireDocument::from_envelope(&ticket_envelope()).unwrap();
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["messagetype"], "bootticket");
        assert_eq!(json["crypto"], "classic");
        assert_eq!(json["data"]["counter_init_seconds"], 25);
        assert!(json.get("addresses").is_none());
    }

    #[test]
    fn test_parcel_carries_addresses_outside_body() {
        let env = ticket_envelope();
        let parcel = Parcel::seal(&env).unwrap();
        let body = String::from_utf8(parcel.body.clone()).unwrap();
        assert!(!body.contains("device-0"));

        let back = parcel.open().unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn test_empty_envelope_uses_message_type() {
        let env = Envelope::entry(Role::PushUpdate, &SessionProfile::default(), addresses());
        let doc = WireDocument::from_envelope(&env).unwrap();
        assert_eq!(doc.messagetype, EMPTY_MESSAGE_TYPE);
        let back = doc.into_envelope(addresses()).unwrap();
        assert!(back.payload.is_none());
    }

    #[test]
    fn test_unknown_message_type_rejected() {
        let mut doc = WireDocument::from_envelope(&ticket_envelope()).unwrap();
        doc.messagetype = "firmware".into();
        assert!(matches!(
            doc.into_envelope(addresses()),
            Err(WireError::UnknownMessageType(_))
        ));
    }

    #[test]
    fn test_mismatched_data_rejected() {
        let mut doc = WireDocument::from_envelope(&ticket_envelope()).unwrap();
        doc.messagetype = "measured_data".into();
        assert!(doc.into_envelope(addresses()).is_err());
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(WireDocument::decode(b"\x80\x04not json", addresses()).is_err());
    }

    #[test]
    fn test_canonical_bytes_ignore_routing() {
        let payload = Payload::Update(Update {
            update_kind: "config_update".into(),
            payload_ref: "update_5".into(),
            version: 2,
            issued_at: 5,
        });
        let mut a = Envelope::entry(Role::Boot, &SessionProfile::default(), addresses());
        a.set_payload(payload.clone());
        let mut b = a.clone();
        b.step(Role::Device);
        b.signature = "ffff".into();

        let bytes_a = canonical_payload_bytes(a.payload.as_ref()).unwrap();
        let bytes_b = canonical_payload_bytes(b.payload.as_ref()).unwrap();
        assert_eq!(bytes_a, bytes_b);
    }

    #[test]
    fn test_canonical_bytes_change_with_payload() {
        let one = Payload::MeasuredData(MeasuredData { value: 4, timestamp: 1 });
        let two = Payload::MeasuredData(MeasuredData { value: 5, timestamp: 1 });
        assert_ne!(
            canonical_payload_bytes(Some(&one)).unwrap(),
            canonical_payload_bytes(Some(&two)).unwrap()
        );
    }
}
