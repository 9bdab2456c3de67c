//! # Protocol Events
//!
//! Notable transitions of both roles, published on the bus for the
//! coordinator, metrics and tests. Handlers never read these; they only
//! route envelopes.

use std::fmt;

use awdt_types::{RequestType, Role, Timestamp};
use serde::{Deserialize, Serialize};

/// Which side of the boundary an event comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Device,
    Server,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Device => "device",
            Side::Server => "server",
        })
    }
}

/// Why the device reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetReason {
    /// An item from the server was staged; it is verified on the next boot.
    StagedForReboot,
    /// A verified update was applied.
    UpdateApplied,
    /// The watchdog deadline passed without a deferral.
    WatchdogExpired,
}

/// How a role's run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Device reset.
    Reset(ResetReason),
    /// The other role asked this one to stop.
    PeerShutdown,
    /// Run ended once the first deferral moved the deadline.
    DeferralApplied,
    /// Stopped from outside the protocol.
    Stopped,
    /// Nothing ended the run within the allowed time.
    TimedOut,
}

impl RunOutcome {
    #[must_use]
    pub fn is_reset(&self) -> bool {
        matches!(self, RunOutcome::Reset(_))
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Reset(ResetReason::StagedForReboot) => f.write_str("reset (staged for reboot)"),
            RunOutcome::Reset(ResetReason::UpdateApplied) => f.write_str("reset (update applied)"),
            RunOutcome::Reset(ResetReason::WatchdogExpired) => f.write_str("reset (watchdog expired)"),
            RunOutcome::PeerShutdown => f.write_str("peer shutdown"),
            RunOutcome::DeferralApplied => f.write_str("deferral applied"),
            RunOutcome::Stopped => f.write_str("stopped"),
            RunOutcome::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Why a verifier refused an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    InvalidSignature,
    NonceMismatch,
    StaleVersion,
}

/// All events that can be published to the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolEvent {
    // =========================================================================
    // DEVICE
    // =========================================================================
    /// An item from the server was written to the staging area.
    ItemStaged { item: String },

    /// A staged boot ticket passed verification.
    BootTicketAccepted { nonce: String },

    /// A ticket or update failed verification.
    ItemRejected { item: String, reason: RejectReason },

    /// A signed request left for the server.
    RequestSent { request_type: RequestType },

    /// Business logic and the sensor loop are running.
    BusinessLogicStarted,

    /// Watchdog countdown seeded from a boot ticket.
    WatchdogArmed { deadline: Timestamp },

    /// Deferral ticket moved the deadline.
    WatchdogDeferred { deadline: Timestamp },

    /// Deadline passed.
    WatchdogExpired { deadline: Timestamp, now: Timestamp },

    /// Update applied and version persisted.
    UpdateApplied { version: u64 },

    // =========================================================================
    // SERVER
    // =========================================================================
    /// A ticket or update was generated for the device.
    TicketIssued { item: String },

    /// A measurement reached the data sink.
    MeasurementStored { value: u32, timestamp: Timestamp },

    /// A message from a compromised device was dropped.
    RequestSuppressed { payload: String },

    // =========================================================================
    // LIFECYCLE
    // =========================================================================
    /// A handler instance shut itself down after an unrecoverable error.
    HandlerExited { side: Side, role: Role },

    /// A role finished its run.
    RunEnded { side: Side, outcome: RunOutcome },
}

impl ProtocolEvent {
    /// Topic this event belongs to.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ItemStaged { .. }
            | Self::BootTicketAccepted { .. }
            | Self::ItemRejected { .. }
            | Self::RequestSent { .. }
            | Self::BusinessLogicStarted
            | Self::WatchdogArmed { .. }
            | Self::WatchdogDeferred { .. }
            | Self::WatchdogExpired { .. }
            | Self::UpdateApplied { .. } => EventTopic::Device,
            Self::TicketIssued { .. }
            | Self::MeasurementStored { .. }
            | Self::RequestSuppressed { .. } => EventTopic::Server,
            Self::HandlerExited { .. } | Self::RunEnded { .. } => EventTopic::Lifecycle,
        }
    }

    /// Side that published the event.
    #[must_use]
    pub fn side(&self) -> Side {
        match self {
            Self::HandlerExited { side, .. } | Self::RunEnded { side, .. } => *side,
            other if other.topic() == EventTopic::Server => Side::Server,
            _ => Side::Device,
        }
    }
}

/// Event topics for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// All events (wildcard).
    All,
    /// Device state transitions.
    Device,
    /// Server issuance, storage and suppression.
    Server,
    /// Handler exits and run ends.
    Lifecycle,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include (empty = all).
    pub topics: Vec<EventTopic>,
    /// Restrict to one side.
    pub side: Option<Side>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics, side: None }
    }

    /// Narrow the filter to one side.
    #[must_use]
    pub fn from_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ProtocolEvent) -> bool {
        let topic_ok = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());
        let side_ok = self.side.map_or(true, |side| side == event.side());
        topic_ok && side_ok
    }
}
