//! Storage layout shared by both roles.

/// Default root of the file-backed store.
pub const DEFAULT_BASE_DIR: &str = "memory";

/// Device keys, last issued nonce and installed version.
pub const DEVICE_SECURE_STORAGE: &str = "device_secure_storage";
/// Items received from the server but not yet verified.
pub const STAGING_AREA: &str = "device_staging_area";
/// Server keys, release version and audit copies.
pub const SERVER_SECURE_STORAGE: &str = "server_secure_storage";
/// Measurement sink and the compromised-device flag.
pub const SERVER_DATA_STORAGE: &str = "server_data_storage";

pub const NONCE_FILE: &str = "nonce.txt";
pub const VERSION_FILE: &str = "version.txt";
pub const MEASURED_DATA_FILE: &str = "measured_data.txt";
pub const COMPROMISED_FLAG: &str = "compromised.device";

/// Staging key of a pending update.
pub const STAGED_UPDATE: &str = "update";
/// Staging key of a pending boot ticket.
pub const STAGED_BOOT_TICKET: &str = "bootticket";
