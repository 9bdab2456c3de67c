//! # Domain Layer - Device Role
//!
//! Pure device logic, free of runtime and transport concerns.
//!
//! ## Components
//!
//! - `state`: closed set of device states and their role names
//! - `watchdog`: countdown deadline with deferral
//! - `staging`: crash-restart reconciliation of the staging area
//! - `errors`: `DeviceError`

pub mod errors;
pub mod staging;
pub mod state;
pub mod watchdog;

pub use errors::*;
pub use staging::*;
pub use state::*;
pub use watchdog::*;
