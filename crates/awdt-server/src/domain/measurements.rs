//! Measurement sink: one `<value>;<timestamp>` line per reading.

use awdt_storage::layout::{MEASURED_DATA_FILE, SERVER_DATA_STORAGE};
use awdt_storage::{ObjectStore, StorageError};
use awdt_types::MeasuredData;

/// Append a reading to `measured_data.txt`.
pub fn append_measurement(store: &dyn ObjectStore, data: &MeasuredData) -> Result<(), StorageError> {
    let line = format!("{};{}\n", data.value, data.timestamp);
    store.append(SERVER_DATA_STORAGE, MEASURED_DATA_FILE, line.as_bytes())
}
