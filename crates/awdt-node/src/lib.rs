//! # AWDT Node
//!
//! Wires a device and a server into runnable AWDT sessions.
//!
//! ## Modules
//!
//! - `config`: `NodeConfig` and its environment overrides
//! - `setup`: key provisioning and scenario preconditions
//! - `coordinator`: boot/update runs with crash-restart reboots
//!
//! ## Run Lifecycle
//!
//! 1. Load configuration (defaults, `AWDT_*` environment, CLI flags)
//! 2. Provision keys for the configured variant if missing
//! 3. Arrange the scenario's staging area and compromised flag
//! 4. Run boot cycles until the device ends without a reset, the reboot
//!    budget is spent, or a cycle times out

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod setup;

pub use config::{resolve_policy, ConfigError, NodeConfig, ProtocolConfig, RunConfig, StorageConfig};
pub use coordinator::{Action, Coordinator, CycleReport, RunReport};
pub use errors::{NodeError, NodeResult};
pub use setup::{ensure_keys, ScenarioSetup, STALE_NONCE};
