//! Prometheus metrics for AWDT runs.
//!
//! All metrics follow the naming convention: `awdt_<concern>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: hook marks and run outcomes
//! - **Histogram**: bracketed intervals (first watchdog poll, put-ticket, whole run)

use lazy_static::lazy_static;
use prometheus::{exponential_buckets, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Crate-local metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // HOOK METRICS
    // =========================================================================

    /// Every measurement hook mark
    pub static ref HOOK_MARKS: CounterVec = CounterVec::new(
        Opts::new("awdt_hook_marks_total", "Measurement hook marks by point and role"),
        &["point", "role", "crypto", "variant"]
    ).expect("metric creation failed");

    /// Time between the start and stop marks of a bracketed interval
    pub static ref INTERVAL_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "awdt_interval_duration_seconds",
            "Duration of bracketed protocol intervals"
        ).buckets(exponential_buckets(0.00001, 2.0, 24).expect("bucket layout")),
        &["interval", "crypto", "variant", "scenario"]
    ).expect("metric creation failed");

    // =========================================================================
    // RUN METRICS
    // =========================================================================

    /// Coordinator runs by outcome
    pub static ref RUN_OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("awdt_run_outcomes_total", "Completed runs by action and outcome"),
        &["action", "outcome"]
    ).expect("metric creation failed");
}

/// Register all metrics with the crate registry. Calling it again is a no-op.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HOOK_MARKS.clone()),
        Box::new(INTERVAL_DURATION.clone()),
        Box::new(RUN_OUTCOMES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Count one finished coordinator run.
pub fn record_run_outcome(action: &str, outcome: &str) {
    RUN_OUTCOMES.with_label_values(&[action, outcome]).inc();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
