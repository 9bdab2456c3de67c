//! # Envelope
//!
//! The unit that travels along a handler chain and across the device/server
//! boundary.
//!
//! ## Former-Step Routing
//!
//! Every handler calls [`Envelope::step`] with its own role when it receives
//! the envelope. The history is append-only and the cursor trails the tail by
//! one hop, so `step` returns the role that handed the envelope over:
//!
//! ```text
//! history: [boot, device, boot, staging_area]
//!                          ^cursor
//! staging_area.step() -> former = boot
//! ```
//!
//! When the cursor cannot advance there is no recorded predecessor and
//! `step` returns `None`. Only entry handlers accept that case.

use serde::{Deserialize, Serialize};

use crate::entities::{CryptoMode, HashAlgorithm, Payload, Scenario, SessionProfile, SignatureVariant};
use crate::errors::EnvelopeError;
use crate::roles::Role;

/// Opaque endpoint handle understood only by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EndpointAddr(String);

impl EndpointAddr {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Device and server endpoints of a run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Addresses {
    pub device: EndpointAddr,
    pub server: EndpointAddr,
}

/// Mutable message passed by ownership from handler to handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Transport routing only; never signed, never inside the wire document.
    pub addresses: Addresses,
    history: Vec<Role>,
    cursor: usize,
    /// Hex-encoded signature over the payload, empty when unsigned.
    pub signature: String,
    pub crypto_mode: CryptoMode,
    pub variant: SignatureVariant,
    pub scenario: Option<Scenario>,
    pub hash_algo: HashAlgorithm,
    pub payload: Option<Payload>,
}

impl Envelope {
    /// Fresh envelope whose history holds only the entry label.
    #[must_use]
    pub fn entry(label: Role, profile: &SessionProfile, addresses: Addresses) -> Self {
        Self {
            addresses,
            history: vec![label],
            cursor: 0,
            signature: String::new(),
            crypto_mode: profile.crypto_mode,
            variant: profile.variant,
            scenario: profile.scenario,
            hash_algo: profile.hash_algo,
            payload: None,
        }
    }

    /// Rebuild an envelope from decoded parts.
    ///
    /// # Errors
    ///
    /// `CursorOutOfRange` if `cursor > history.len()`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        addresses: Addresses,
        history: Vec<Role>,
        cursor: usize,
        signature: String,
        crypto_mode: CryptoMode,
        variant: SignatureVariant,
        scenario: Option<Scenario>,
        hash_algo: HashAlgorithm,
        payload: Option<Payload>,
    ) -> Result<Self, EnvelopeError> {
        if cursor > history.len() {
            return Err(EnvelopeError::CursorOutOfRange {
                cursor,
                len: history.len(),
            });
        }
        Ok(Self {
            addresses,
            history,
            cursor,
            signature,
            crypto_mode,
            variant,
            scenario,
            hash_algo,
            payload,
        })
    }

    /// Record `current` as the newest hop and return the former role.
    pub fn step(&mut self, current: Role) -> Option<Role> {
        self.history.push(current);
        let prior = self.cursor;
        let next = prior + 1;
        if next < self.history.len() {
            self.cursor = next;
            self.history.get(prior).copied()
        } else {
            None
        }
    }

    /// Undo the newest hop so the last handler can receive the envelope again
    /// with the same former role.
    ///
    /// # Errors
    ///
    /// `CannotRewind` when the cursor is already at the first entry.
    pub fn rewind(&mut self) -> Result<(), EnvelopeError> {
        if self.cursor == 0 || self.history.is_empty() {
            return Err(EnvelopeError::CannotRewind);
        }
        self.history.pop();
        self.cursor -= 1;
        Ok(())
    }

    /// Roles visited so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Role] {
        &self.history
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Session selectors carried by this envelope.
    #[must_use]
    pub fn profile(&self) -> SessionProfile {
        SessionProfile {
            crypto_mode: self.crypto_mode,
            variant: self.variant,
            hash_algo: self.hash_algo,
            scenario: self.scenario,
        }
    }

    /// Replace the payload and drop the now stale signature.
    pub fn set_payload(&mut self, payload: Payload) {
        self.payload = Some(payload);
        self.signature.clear();
    }

    /// Discriminator of the active payload, `message` when there is none.
    #[must_use]
    pub fn payload_kind(&self) -> &'static str {
        self.payload.as_ref().map_or("message", Payload::kind)
    }
}
