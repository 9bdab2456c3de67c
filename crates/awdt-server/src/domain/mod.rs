//! # Domain Layer - Server Role
//!
//! ## Components
//!
//! - `state`: closed set of server states
//! - `issuance`: boot ticket, deferral ticket and update construction
//! - `compromise`: the compromised-device flag
//! - `measurements`: measurement sink format
//! - `errors`: `ServerError`

pub mod compromise;
pub mod errors;
pub mod issuance;
pub mod measurements;
pub mod state;

pub use compromise::*;
pub use errors::*;
pub use issuance::*;
pub use measurements::*;
pub use state::*;
