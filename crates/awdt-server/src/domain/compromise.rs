//! # Compromised-Device Flag
//!
//! An operator flags a device by creating `compromised.device` in the server
//! data storage. While the flag exists the server answers nothing: no
//! tickets, no updates, no stored measurements. The device sees silence and
//! its watchdog runs out.

use awdt_storage::layout::{COMPROMISED_FLAG, SERVER_DATA_STORAGE};
use awdt_storage::{ObjectStore, StorageError};
use tracing::warn;

/// Whether the device is flagged. A flag that cannot be checked counts as set.
pub fn is_compromised(store: &dyn ObjectStore) -> bool {
    match store.exists(SERVER_DATA_STORAGE, COMPROMISED_FLAG) {
        Ok(flagged) => flagged,
        Err(e) => {
            warn!(error = %e, "[server/verifier] compromised flag unreadable, suppressing");
            true
        }
    }
}

/// Set or clear the flag.
pub fn set_compromised(store: &dyn ObjectStore, flagged: bool) -> Result<(), StorageError> {
    if flagged {
        store.put(SERVER_DATA_STORAGE, COMPROMISED_FLAG, b"")
    } else {
        match store.delete(SERVER_DATA_STORAGE, COMPROMISED_FLAG) {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        }
    }
}
