//! # AWDT Device - Attested Device Role
//!
//! The device boots only with a fresh, server-signed boot ticket and keeps
//! running only while the server keeps deferring its watchdog.
//!
//! ## State Machine
//!
//! ```text
//! boot → staging_area ─┬─ staged item ──→ verifier ─┬─ update ──→ core_patcher → shutdown
//!                      │                            ├─ ticket ──→ awdt_init → timer
//!                      │                            │        └──→ business_logic → sensor
//!                      │                            └─ invalid ─→ update_downloader
//!                      └─ nothing staged ─────────────────────────→ update_downloader → signer → server
//! ```
//!
//! ## Security Properties
//!
//! - Tickets must echo the last nonce this device issued
//! - Updates must carry exactly the next version
//! - Corrupt staging contents count as absent; the device asks again
//! - A watchdog that is not deferred in time resets the device
//!
//! ## Module Structure
//!
//! - `domain`: states, watchdog countdown, staging reconciliation, errors
//! - `ports`: entropy source
//! - `service`: per-state handlers and the station factory
//! - `runtime`: wiring onto the station runtime

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod domain;
pub mod ports;
pub mod runtime;
pub mod service;

pub use domain::{Countdown, DeviceError, DeviceResult, DeviceState, Reconciled};
pub use ports::{EntropySource, OsEntropy};
pub use runtime::{spawn_device, BOOT_LABEL};
pub use service::{DeviceConfig, DeviceContext, DeviceStations};
