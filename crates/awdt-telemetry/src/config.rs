//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration of one node process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive such as `awdt_device=debug,info`
    pub log_level: String,

    /// Whether to write logs to the console at all
    pub console_output: bool,

    /// Whether to format logs as JSON lines
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "awdt-node".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AWDT_SERVICE_NAME`: Service name (default: awdt-node)
    /// - `AWDT_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `AWDT_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `AWDT_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`TelemetryConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            service_name: lookup("AWDT_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("AWDT_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: lookup("AWDT_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.console_output),

            json_logs: lookup("AWDT_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.json_logs),
        }
    }

    /// Raise the filter to `debug` unless an explicit directive is set.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose && self.log_level == "info" {
            self.log_level = "debug".to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::from_lookup(lookup(&[]));
        assert_eq!(config, TelemetryConfig::default());
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_awdt_level_wins_over_rust_log() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("AWDT_LOG_LEVEL", "warn"),
            ("RUST_LOG", "trace"),
        ]));
        assert_eq!(config.log_level, "warn");

        let config = TelemetryConfig::from_lookup(lookup(&[("RUST_LOG", "trace")]));
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_boolean_flags() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("AWDT_JSON_LOGS", "1"),
            ("AWDT_CONSOLE_OUTPUT", "FALSE"),
        ]));
        assert!(config.json_logs);
        assert!(!config.console_output);
    }

    #[test]
    fn test_verbose_keeps_explicit_filter() {
        assert_eq!(TelemetryConfig::default().verbose(true).log_level, "debug");
        let custom = TelemetryConfig {
            log_level: "awdt_server=trace".to_string(),
            ..TelemetryConfig::default()
        };
        assert_eq!(custom.verbose(true).log_level, "awdt_server=trace");
    }
}
