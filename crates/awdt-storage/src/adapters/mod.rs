//! # Storage Adapters
//!
//! - `filesystem`: directory-per-path store used by the node binary
//! - `memory`: map-backed store used by tests

mod filesystem;
mod memory;

pub use filesystem::FileSystemStore;
pub use memory::InMemoryStore;
