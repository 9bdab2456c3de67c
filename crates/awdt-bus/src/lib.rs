//! # AWDT Bus - Event Bus and Station Runtime
//!
//! ## Stations
//!
//! Each device and server state runs as a station with private memory.
//! Stations coordinate only by passing envelopes; the runtime delivers them,
//! arms wakeups and carries the exit cascade.
//!
//! ```text
//! ┌──────────── device ────────────┐          ┌──────────── server ────────────┐
//! │ boot → staging_area → verifier │  parcel  │ verifier → gen_* → signer      │
//! │ timer  sensor  business_logic  │ ←──────→ │ storage                        │
//! └────────────────────────────────┘   link   └────────────────────────────────┘
//!                 │ publish()                          │ publish()
//!                 └──────────────→ Event Bus ←─────────┘
//!                                     │ subscribe()
//!                          coordinator, metrics, tests
//! ```
//!
//! ## Events
//!
//! [`ProtocolEvent`]s report transitions and run outcomes. Nothing on the
//! protocol path reads them back.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod clock;
pub mod errors;
pub mod events;
pub mod link;
pub mod publisher;
pub mod runtime;
pub mod station;
pub mod subscriber;

pub use clock::RuntimeClock;
pub use errors::BusError;
pub use events::{
    EventFilter, EventTopic, ProtocolEvent, RejectReason, ResetReason, RunOutcome, Side,
};
pub use link::{boundary_link, BoundaryFrame, LinkEnd};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use runtime::{spawn_role, RoleHandle, RoleRuntime};
pub use station::{Directive, Signal, Station, StationFactory, StationKind};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Frames buffered in each direction of the boundary link.
pub const DEFAULT_LINK_CAPACITY: usize = 64;
