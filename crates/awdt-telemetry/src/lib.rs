//! # AWDT Telemetry
//!
//! Observability for AWDT nodes.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an `EnvFilter` and a
//!   pretty or JSON fmt layer
//! - **Metrics**: Prometheus counters and histograms in a crate-local registry
//! - **Hooks**: [`PrometheusHook`], a measurement hook that brackets protocol
//!   intervals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use awdt_telemetry::{init_telemetry, PrometheusHook, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::from_env())?;
//! let hook = std::sync::Arc::new(PrometheusHook::new());
//! // hand `hook` to the device and server contexts
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AWDT_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `AWDT_JSON_LOGS` | `false` | JSON formatted logs |
//! | `AWDT_CONSOLE_OUTPUT` | `true` | Console output |
//! | `AWDT_SERVICE_NAME` | `awdt-node` | Service name |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod hook;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use hook::{Interval, PrometheusHook};
pub use logging::init_logging;
pub use metrics::{encode_metrics, record_run_outcome, register_metrics};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install logging.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}
