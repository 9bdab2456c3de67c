//! # Stations
//!
//! A station is one role state running as its own unit of execution. It
//! sees one [`Signal`] at a time and answers with [`Directive`]s; the
//! runtime carries those out. Stations never call each other.
//!
//! | Kind | Instance | Memory |
//! |------|----------|--------|
//! | transient | fresh per delivery | none |
//! | persistent | one per run, own mailbox | private, survives wakeups |

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::time::Duration;

use awdt_types::{Envelope, Role};

use crate::events::{ProtocolEvent, RunOutcome};

/// What a station receives.
#[derive(Debug, Clone)]
pub enum Signal {
    /// Envelope handed over by another station (or the boundary).
    Message(Envelope),
    /// Scheduled wakeup armed by this station.
    Wakeup(Envelope),
    /// Stop; sent by the exit cascade.
    Exit,
}

/// What a station asks the runtime to do.
#[derive(Debug)]
pub enum Directive<K> {
    /// Deliver an envelope to another station of the same role.
    Send { to: K, envelope: Envelope },
    /// Post `Wakeup(envelope)` back to this station after `delay`.
    WakeupAfter { delay: Duration, envelope: Envelope },
    /// Serialize and hand the envelope to the other role.
    CrossBoundary(Envelope),
    /// Ask the other role to end its run.
    ShutdownPeer,
    /// Publish on the protocol event bus.
    Publish(ProtocolEvent),
    /// Shut this station instance down.
    ExitSelf,
    /// End the role's run: cascade `Exit`, then report `outcome`.
    Terminate(RunOutcome),
}

impl<K> Directive<K> {
    /// `Send` shorthand.
    pub fn send(to: K, envelope: Envelope) -> Self {
        Directive::Send { to, envelope }
    }
}

/// Closed set of states of one role.
pub trait StationKind: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static {
    /// Every state of the role.
    fn all() -> &'static [Self];

    /// State receiving envelopes that cross the boundary.
    fn ingress() -> Self;

    /// Whether the state keeps one instance with a mailbox for the whole run.
    fn is_persistent(&self) -> bool;

    /// Role name this state records in an envelope's history.
    fn role(&self) -> Role;
}

/// One state's behaviour.
pub trait Station<K: StationKind>: Send {
    fn handle(&mut self, signal: Signal) -> Vec<Directive<K>>;
}

/// Builds station instances for a role.
pub trait StationFactory<K: StationKind>: Send + Sync + 'static {
    fn create(&self, kind: K) -> Box<dyn Station<K>>;
}
