//! Measurement hook backed by Prometheus.
//!
//! Counts every mark and turns start/stop pairs into interval observations:
//!
//! ```text
//! TimerFirstPollEntered ──► TimerFirstPollExited   first_poll
//! PutTicketEntered      ──► PutTicketExited        put_ticket
//! RunStarted            ──► RunEnded               run
//! ```
//!
//! A stop mark without an open start is counted but observes nothing.

use std::collections::HashMap;
use std::time::Instant;

use awdt_types::{HookContext, HookPoint, MeasurementHook};
use parking_lot::Mutex;
use tracing::trace;

use crate::metrics::{HOOK_MARKS, INTERVAL_DURATION};

/// Interval bracketed by two hook points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    FirstPoll,
    PutTicket,
    Run,
}

impl Interval {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::FirstPoll => "first_poll",
            Interval::PutTicket => "put_ticket",
            Interval::Run => "run",
        }
    }

    /// Interval opened by `point`, if any.
    #[must_use]
    pub fn started_by(point: HookPoint) -> Option<Self> {
        match point {
            HookPoint::TimerFirstPollEntered => Some(Interval::FirstPoll),
            HookPoint::PutTicketEntered => Some(Interval::PutTicket),
            HookPoint::RunStarted => Some(Interval::Run),
            _ => None,
        }
    }

    /// Interval closed by `point`, if any.
    #[must_use]
    pub fn stopped_by(point: HookPoint) -> Option<Self> {
        match point {
            HookPoint::TimerFirstPollExited => Some(Interval::FirstPoll),
            HookPoint::PutTicketExited => Some(Interval::PutTicket),
            HookPoint::RunEnded => Some(Interval::Run),
            _ => None,
        }
    }
}

/// [`MeasurementHook`] recording into the crate registry.
#[derive(Debug, Default)]
pub struct PrometheusHook {
    open: Mutex<HashMap<Interval, Instant>>,
}

impl PrometheusHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of intervals started and not yet stopped.
    pub fn open_intervals(&self) -> usize {
        self.open.lock().len()
    }
}

impl MeasurementHook for PrometheusHook {
    fn mark(&self, point: HookPoint, context: &HookContext) {
        let crypto = context.crypto_mode.as_str();
        let variant = context.variant.as_str();
        HOOK_MARKS
            .with_label_values(&[point.as_str(), context.role.as_str(), crypto, variant])
            .inc();

        if let Some(interval) = Interval::started_by(point) {
            self.open.lock().insert(interval, Instant::now());
        } else if let Some(interval) = Interval::stopped_by(point) {
            let Some(started) = self.open.lock().remove(&interval) else {
                trace!(point = point.as_str(), "stop mark without a start");
                return;
            };
            let scenario = context
                .scenario
                .map_or_else(|| "none".to_string(), |s| s.id().to_string());
            let seconds = started.elapsed().as_secs_f64();
            INTERVAL_DURATION
                .with_label_values(&[interval.as_str(), crypto, variant, &scenario])
                .observe(seconds);
            trace!(interval = interval.as_str(), seconds, "interval observed");
        }
    }
}
