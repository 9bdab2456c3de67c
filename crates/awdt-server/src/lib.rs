//! # AWDT Server - Attestation Server Role
//!
//! Answers device challenges with signed boot tickets, deferral tickets and
//! updates, and stores the device's measurements.
//!
//! ## Suppression
//!
//! A device flagged compromised gets no answer at all. It cannot tell
//! suppression apart from a lost link, and its watchdog expires.
//!
//! ## Module Structure
//!
//! - `domain`: states, issuance, compromise flag, measurement sink, errors
//! - `service`: per-state handlers and the station factory
//! - `runtime`: wiring onto the station runtime

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod domain;
pub mod runtime;
pub mod service;

pub use domain::{
    is_compromised, issue_boot_ticket, issue_def_ticket, issue_update, set_compromised,
    IssuanceConfig, ServerError, ServerResult, ServerState, UPDATE_KINDS,
};
pub use runtime::{spawn_server, PUSH_UPDATE_LABEL};
pub use service::{ServerContext, ServerStations};
