//! # AWDT Types Crate
//!
//! Message model of the Attestation Watchdog Timer protocol.
//!
//! ## Contents
//!
//! - `entities`: payload variants and the crypto/session selectors
//! - `roles`: closed set of role names that appear in an envelope's history
//! - `envelope`: the `Envelope` and its former-step cursor
//! - `wire`: transport-neutral document and canonical signing bytes
//! - `hooks`: measurement hook points exposed to external collaborators
//! - `profile`: where a benchmarking scenario ends its run
//!
//! ## Design Principles
//!
//! - **History is the identity**: a handler learns who handed it a message
//!   from the envelope's own history, never from the transport.
//! - **Signed scope**: only the tagged payload is signed. Routing metadata
//!   and addresses stay outside the signature.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod hooks;
pub mod profile;
pub mod roles;
pub mod wire;

pub use entities::*;
pub use envelope::{Addresses, EndpointAddr, Envelope};
pub use errors::{EnvelopeError, WireError};
pub use hooks::{HookContext, HookPoint, MeasurementHook, NoopHook};
pub use profile::RunProfile;
pub use roles::Role;
pub use wire::{canonical_payload_bytes, Parcel, WireDocument};
