//! Where a benchmarking run ends, per scenario.
//!
//! The scenario never changes verification. It only decides which event
//! closes the run so a measurement can be bracketed.

use crate::entities::Scenario;

/// Run-ending points selected by a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunProfile {
    /// Server stops both roles after the first stored measurement.
    pub end_after_first_measurement: bool,
    /// Device stops once `Timer` applied the first deferral.
    pub end_after_deferral: bool,
    /// Server stops both roles after the first suppressed request.
    pub end_after_suppression: bool,
}

impl RunProfile {
    /// Profile of `scenario`. No scenario means the run only ends through
    /// the protocol itself (reset or watchdog expiry).
    #[must_use]
    pub fn for_scenario(scenario: Option<Scenario>) -> Self {
        match scenario.map(|s| s.id()) {
            Some(1 | 2 | 3 | 6 | 7 | 8) => Self {
                end_after_first_measurement: true,
                ..Self::default()
            },
            Some(4) => Self {
                end_after_deferral: true,
                ..Self::default()
            },
            Some(5) => Self {
                end_after_suppression: true,
                ..Self::default()
            },
            _ => Self::default(),
        }
    }
}
