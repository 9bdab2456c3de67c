//! # AWDT Storage
//!
//! Storage collaborator of the protocol: a path-addressed byte store.
//!
//! ## Contract
//!
//! - `put`/`get`/`exists`/`delete`/`list` on `(path, key)` pairs
//! - directories are created on demand
//! - reading a missing version file yields `0` and creates it
//! - each read and write is atomic; one writer per path at a time
//!
//! ## Adapters
//!
//! - [`FileSystemStore`]: rooted at a base directory, temp-file + rename writes
//!   under an exclusive `fs2` lock
//! - [`InMemoryStore`]: `parking_lot` guarded map for tests

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod clock;
pub mod errors;
pub mod layout;
pub mod ports;

pub use adapters::{FileSystemStore, InMemoryStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::StorageError;
pub use ports::ObjectStore;
