//! # Node Configuration
//!
//! Unified configuration for both roles and the coordinator.
//!
//! Built in three layers: [`Default`], then `AWDT_*` environment variables
//! ([`NodeConfig::from_env`]), then command line flags applied by the binary.
//! Configuration is passed down explicitly; nothing here is global.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use awdt_crypto::{CryptoError, CryptoPolicy};
use awdt_device::DeviceConfig;
use awdt_server::IssuanceConfig;
use awdt_storage::layout::DEFAULT_BASE_DIR;
use awdt_types::{CryptoMode, HashAlgorithm, Scenario, SessionProfile, SignatureVariant};
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Protocol timing.
    pub protocol: ProtocolConfig,
    /// Crypto selectors shared by both roles.
    pub crypto: CryptoPolicy,
    /// Where both roles keep their state.
    pub storage: StorageConfig,
    /// Coordinator behaviour.
    pub run: RunConfig,
}

impl NodeConfig {
    /// Defaults overridden by `AWDT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`NodeConfig::from_env`] over an arbitrary variable source.
    ///
    /// # Environment Variables
    ///
    /// - `AWDT_CRYPTO`, `AWDT_VARIANT`, `AWDT_HASH`: crypto selectors
    /// - `AWDT_SCENARIO`: benchmarking scenario 1-8
    /// - `AWDT_STORAGE_DIR`: file store root (default: memory)
    /// - `AWDT_IN_MEMORY`: keep state in memory only
    /// - `AWDT_RUN_TIMEOUT_SECS`, `AWDT_REBOOTS`: coordinator limits
    /// - `AWDT_SENSOR_INTERVAL_SECS`, `AWDT_RENEWAL_INTERVAL_SECS`,
    ///   `AWDT_POLL_INTERVAL_SECS`, `AWDT_COUNTER_INIT_SECS`,
    ///   `AWDT_DEFERRAL_SECS`: protocol timing
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let mode = parse_opt::<CryptoMode>(&lookup, "AWDT_CRYPTO")?;
        let variant = parse_opt::<SignatureVariant>(&lookup, "AWDT_VARIANT")?;
        let hash = parse_opt::<HashAlgorithm>(&lookup, "AWDT_HASH")?;
        if mode.is_some() || variant.is_some() || hash.is_some() {
            config.crypto = resolve_policy(
                mode.unwrap_or(config.crypto.mode()),
                variant,
                hash,
            )?;
        }

        if let Some(id) = parse_opt::<u8>(&lookup, "AWDT_SCENARIO")? {
            config.run.scenario = Some(scenario(id)?);
        }
        if let Some(dir) = lookup("AWDT_STORAGE_DIR") {
            config.storage.base_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("AWDT_IN_MEMORY") {
            config.storage.in_memory = flag.to_lowercase() == "true" || flag == "1";
        }
        if let Some(secs) = parse_opt::<u64>(&lookup, "AWDT_RUN_TIMEOUT_SECS")? {
            config.run.timeout = Duration::from_secs(secs);
        }
        if let Some(reboots) = parse_opt::<u32>(&lookup, "AWDT_REBOOTS")? {
            config.run.reboots = reboots;
        }

        let protocol = &mut config.protocol;
        if let Some(secs) = parse_opt::<u64>(&lookup, "AWDT_SENSOR_INTERVAL_SECS")? {
            protocol.sensor_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_opt::<u64>(&lookup, "AWDT_RENEWAL_INTERVAL_SECS")? {
            protocol.renewal_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_opt::<u64>(&lookup, "AWDT_POLL_INTERVAL_SECS")? {
            protocol.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_opt::<u64>(&lookup, "AWDT_COUNTER_INIT_SECS")? {
            protocol.counter_init_seconds = secs;
        }
        if let Some(secs) = parse_opt::<u64>(&lookup, "AWDT_DEFERRAL_SECS")? {
            protocol.deferral_seconds = secs;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make a run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let protocol = &self.protocol;
        for (key, interval) in [
            ("sensor_interval", protocol.sensor_interval),
            ("renewal_interval", protocol.renewal_interval),
            ("poll_interval", protocol.poll_interval),
        ] {
            if interval.is_zero() {
                return Err(ConfigError::invalid(key, "0", "interval must be positive"));
            }
        }
        if self.run.timeout.is_zero() {
            return Err(ConfigError::invalid("run_timeout", "0", "timeout must be positive"));
        }
        Ok(())
    }

    /// Selectors stamped on every envelope of a run.
    #[must_use]
    pub fn session_profile(&self) -> SessionProfile {
        SessionProfile {
            crypto_mode: self.crypto.mode(),
            variant: self.crypto.variant(),
            hash_algo: self.crypto.hash(),
            scenario: self.run.scenario,
        }
    }
}

/// Timing of both roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Period between two sensor readings.
    pub sensor_interval: Duration,
    /// Period between two deferral ticket requests.
    pub renewal_interval: Duration,
    /// Period between two watchdog polls.
    pub poll_interval: Duration,
    /// Watchdog budget a boot ticket grants, in seconds.
    pub counter_init_seconds: u64,
    /// Extension a deferral ticket grants, in seconds.
    pub deferral_seconds: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        let device = DeviceConfig::default();
        let issuance = IssuanceConfig::default();
        Self {
            sensor_interval: device.sensor_interval,
            renewal_interval: device.renewal_interval,
            poll_interval: device.poll_interval,
            counter_init_seconds: issuance.counter_init_seconds,
            deferral_seconds: issuance.deferral_seconds,
        }
    }
}

impl ProtocolConfig {
    #[must_use]
    pub fn device(&self) -> DeviceConfig {
        DeviceConfig {
            sensor_interval: self.sensor_interval,
            renewal_interval: self.renewal_interval,
            poll_interval: self.poll_interval,
        }
    }

    #[must_use]
    pub fn issuance(&self) -> IssuanceConfig {
        IssuanceConfig {
            counter_init_seconds: self.counter_init_seconds,
            deferral_seconds: self.deferral_seconds,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Root of the file-backed store.
    pub base_dir: PathBuf,
    /// Keep everything in memory; nothing survives the process.
    pub in_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            in_memory: false,
        }
    }
}

/// Coordinator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Benchmarking scenario, if any.
    pub scenario: Option<Scenario>,
    /// Upper bound on one boot cycle.
    pub timeout: Duration,
    /// Boot cycles allowed after a device reset.
    pub reboots: u32,
    /// Arrange the scenario's preconditions before the first cycle.
    pub prepare_scenario: bool,
    /// Frames buffered on the boundary link in each direction.
    pub link_capacity: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            scenario: None,
            timeout: Duration::from_secs(120),
            reboots: 3,
            prepare_scenario: true,
            link_capacity: awdt_bus::DEFAULT_LINK_CAPACITY,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting has a value that cannot be used.
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// Crypto selectors that do not belong together.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl ConfigError {
    fn invalid(key: &str, value: &str, reason: impl ToString) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Policy for `mode`, filling unset selectors with the mode's defaults:
/// secp256r1 with SHA-256 for classic, ML-DSA-44 for pqc.
pub fn resolve_policy(
    mode: CryptoMode,
    variant: Option<SignatureVariant>,
    hash: Option<HashAlgorithm>,
) -> Result<CryptoPolicy, ConfigError> {
    if mode.is_disabled() {
        return Ok(CryptoPolicy::disabled());
    }
    let variant = variant.unwrap_or(match mode {
        CryptoMode::PostQuantum => SignatureVariant::MlDsa44,
        _ => SignatureVariant::Secp256r1,
    });
    let hash = hash.unwrap_or(match mode {
        CryptoMode::Classical => HashAlgorithm::Sha256,
        _ => HashAlgorithm::None,
    });
    Ok(CryptoPolicy::new(mode, variant, hash)?)
}

/// Scenario `id`, or a config error naming the bad value.
pub fn scenario(id: u8) -> Result<Scenario, ConfigError> {
    Scenario::new(id).map_err(|e| ConfigError::invalid("scenario", &id.to_string(), e))
}

fn parse_opt<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>().map_err(|e| ConfigError::invalid(key, &raw, e)))
        .transpose()
}
