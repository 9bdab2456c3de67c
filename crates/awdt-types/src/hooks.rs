//! # Measurement Hooks
//!
//! Fixed transitions where an external measurement collaborator may start or
//! stop a counter. The protocol calls [`MeasurementHook::mark`] and never
//! depends on what the collaborator does with it.

use crate::entities::{CryptoMode, Scenario, SignatureVariant};
use crate::envelope::Envelope;
use crate::roles::Role;

/// Transition being marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// `StagingArea` entered from `Boot` (boot received).
    StagingEntered,
    /// Server `Storage` finished writing a measurement.
    StorageExited,
    /// `Timer` starts its first poll after initialisation.
    TimerFirstPollEntered,
    /// `Timer` finished its first poll after initialisation.
    TimerFirstPollExited,
    /// `AWDT_PutTicket` entered.
    PutTicketEntered,
    /// `AWDT_PutTicket` handed the deferral to `Timer`.
    PutTicketExited,
    /// `BusinessLogic` renewal wakeup fired.
    RenewalWakeup,
    /// Server dropped a request from a compromised device.
    RequestSuppressed,
    /// Coordinator injected the entry envelope (boot or update sent).
    RunStarted,
    /// Coordinator observed the end of the run.
    RunEnded,
}

impl HookPoint {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPoint::StagingEntered => "staging_entered",
            HookPoint::StorageExited => "storage_exited",
            HookPoint::TimerFirstPollEntered => "timer_first_poll_entered",
            HookPoint::TimerFirstPollExited => "timer_first_poll_exited",
            HookPoint::PutTicketEntered => "put_ticket_entered",
            HookPoint::PutTicketExited => "put_ticket_exited",
            HookPoint::RenewalWakeup => "renewal_wakeup",
            HookPoint::RequestSuppressed => "request_suppressed",
            HookPoint::RunStarted => "run_started",
            HookPoint::RunEnded => "run_ended",
        }
    }
}

/// Who hit the hook and under which session selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookContext {
    pub role: Role,
    pub scenario: Option<Scenario>,
    pub crypto_mode: CryptoMode,
    pub variant: SignatureVariant,
}

impl HookContext {
    #[must_use]
    pub fn for_envelope(role: Role, envelope: &Envelope) -> Self {
        Self {
            role,
            scenario: envelope.scenario,
            crypto_mode: envelope.crypto_mode,
            variant: envelope.variant,
        }
    }
}

/// Receiver of hook marks.
pub trait MeasurementHook: Send + Sync {
    fn mark(&self, point: HookPoint, context: &HookContext);
}

/// Hook that ignores every mark.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl MeasurementHook for NoopHook {
    fn mark(&self, _point: HookPoint, _context: &HookContext) {}
}
