//! # Ports Layer
//!
//! Outbound dependencies the device role needs from its host.

pub mod outbound;

pub use outbound::*;
