//! # Role Runtime
//!
//! Runs every station of one role and carries out their directives.
//!
//! ```text
//!               ┌────────────── RoleRuntime ───────────────┐
//!  boundary ──→ │ ingress ──→ transient (spawned per msg)  │ ──→ boundary
//!               │        └──→ persistent (mailbox)  ←─ wakeups
//!               └──────────────────────────────────────────┘
//! ```
//!
//! ## Termination
//!
//! `Terminate` claims the run once, sends `Exit` to every persistent
//! station, waits until each has stopped and only then publishes the
//! outcome. Signals posted after that point are dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use awdt_types::{Envelope, Parcel};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::BusError;
use crate::events::{ProtocolEvent, RunOutcome, Side};
use crate::link::{BoundaryFrame, LinkEnd};
use crate::publisher::EventPublisher;
use crate::station::{Directive, Signal, StationFactory, StationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

struct Inner<K: StationKind> {
    side: Side,
    factory: Arc<dyn StationFactory<K>>,
    inboxes: HashMap<K, mpsc::UnboundedSender<Signal>>,
    stopped: HashMap<K, watch::Receiver<bool>>,
    outbound: mpsc::Sender<BoundaryFrame>,
    bus: Arc<dyn EventPublisher>,
    terminating: AtomicBool,
    outcome: watch::Sender<Option<RunOutcome>>,
}

/// Shared handle the station tasks use to reach each other.
pub struct RoleRuntime<K: StationKind> {
    inner: Arc<Inner<K>>,
}

impl<K: StationKind> Clone for RoleRuntime<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Start every station of a role on the current tokio runtime.
pub fn spawn_role<K: StationKind>(
    side: Side,
    factory: Arc<dyn StationFactory<K>>,
    link: LinkEnd,
    bus: Arc<dyn EventPublisher>,
) -> RoleHandle<K> {
    let (outcome_tx, outcome_rx) = watch::channel(None);
    let (outbound, inbound) = link.split();

    let mut inboxes = HashMap::new();
    let mut stopped = HashMap::new();
    let mut mailboxes = Vec::new();
    for kind in K::all().iter().copied().filter(StationKind::is_persistent) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = watch::channel(false);
        inboxes.insert(kind, tx);
        stopped.insert(kind, done_rx);
        mailboxes.push((kind, rx, done_tx));
    }

    let runtime = RoleRuntime {
        inner: Arc::new(Inner {
            side,
            factory,
            inboxes,
            stopped,
            outbound,
            bus,
            terminating: AtomicBool::new(false),
            outcome: outcome_tx,
        }),
    };

    let mut tasks = Vec::with_capacity(mailboxes.len() + 1);
    for (kind, inbox, done) in mailboxes {
        tasks.push(tokio::spawn(runtime.clone().run_persistent(kind, inbox, done)));
    }
    tasks.push(tokio::spawn(runtime.clone().run_ingress(inbound)));

    info!(side = %side, persistent = tasks.len() - 1, "[{}] role runtime started", side);
    RoleHandle {
        runtime,
        outcome: outcome_rx,
        tasks,
    }
}

impl<K: StationKind> RoleRuntime<K> {
    fn is_terminating(&self) -> bool {
        self.inner.terminating.load(Ordering::Acquire)
    }

    fn deliver(&self, to: K, signal: Signal) {
        if self.is_terminating() {
            debug!(station = %to, "[{}] run ended, signal dropped", self.inner.side);
            return;
        }
        if let Some(inbox) = self.inner.inboxes.get(&to) {
            if inbox.send(signal).is_err() {
                debug!(station = %to, "[{}] station stopped, signal dropped", self.inner.side);
            }
            return;
        }
        let runtime = self.clone();
        tokio::spawn(async move { runtime.run_transient(to, signal).await });
    }

    async fn run_transient(self, kind: K, signal: Signal) {
        let directives = self.inner.factory.create(kind).handle(signal);
        self.apply(kind, directives).await;
    }

    async fn run_persistent(
        self,
        kind: K,
        mut inbox: mpsc::UnboundedReceiver<Signal>,
        done: watch::Sender<bool>,
    ) {
        let mut station = self.inner.factory.create(kind);
        while let Some(signal) = inbox.recv().await {
            let exiting = matches!(signal, Signal::Exit);
            let directives = station.handle(signal);
            let flow = self.apply(kind, directives).await;
            if exiting || flow == Flow::Exit {
                break;
            }
        }
        inbox.close();
        done.send_replace(true);
        debug!(station = %kind, "[{}] station stopped", self.inner.side);
    }

    async fn run_ingress(self, mut inbound: mpsc::Receiver<BoundaryFrame>) {
        let side = self.inner.side;
        let mut outcome = self.inner.outcome.subscribe();
        if outcome.borrow().is_some() {
            return;
        }

        loop {
            let frame = tokio::select! {
                frame = inbound.recv() => frame,
                _ = outcome.changed() => break,
            };
            match frame {
                None => break,
                Some(BoundaryFrame::Parcel(parcel)) => match parcel.open() {
                    Ok(envelope) => self.deliver(K::ingress(), Signal::Message(envelope)),
                    Err(e) => warn!(error = %e, "[{}] undecodable parcel dropped", side),
                },
                Some(BoundaryFrame::Shutdown) => {
                    info!("[{}] peer requested shutdown", side);
                    self.terminate(None, RunOutcome::PeerShutdown).await;
                    break;
                }
            }
        }
        debug!("[{}] ingress closed", side);
    }

    async fn apply(&self, from: K, directives: Vec<Directive<K>>) -> Flow {
        let side = self.inner.side;
        let mut flow = Flow::Continue;
        for directive in directives {
            match directive {
                Directive::Send { to, envelope } => self.deliver(to, Signal::Message(envelope)),
                Directive::WakeupAfter { delay, envelope } => {
                    self.schedule_wakeup(from, delay, envelope);
                }
                Directive::CrossBoundary(envelope) => self.cross(from, envelope).await,
                Directive::ShutdownPeer => {
                    if self.inner.outbound.send(BoundaryFrame::Shutdown).await.is_err() {
                        debug!("[{}/{}] link closed, shutdown not sent", side, from);
                    }
                }
                Directive::Publish(event) => {
                    self.inner.bus.publish(event).await;
                }
                Directive::ExitSelf => {
                    warn!("[{}/{}] handler exited", side, from);
                    self.inner
                        .bus
                        .publish(ProtocolEvent::HandlerExited {
                            side,
                            role: from.role(),
                        })
                        .await;
                    flow = Flow::Exit;
                }
                Directive::Terminate(outcome) => {
                    self.terminate(Some(from), outcome).await;
                    flow = Flow::Exit;
                }
            }
        }
        flow
    }

    fn schedule_wakeup(&self, station: K, delay: Duration, envelope: Envelope) {
        let runtime = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            runtime.deliver(station, Signal::Wakeup(envelope));
        });
    }

    async fn cross(&self, from: K, envelope: Envelope) {
        let side = self.inner.side;
        let parcel = match Parcel::seal(&envelope) {
            Ok(parcel) => parcel,
            Err(e) => {
                warn!(error = %e, "[{}/{}] envelope could not be sealed", side, from);
                return;
            }
        };
        if self.inner.outbound.send(BoundaryFrame::Parcel(parcel)).await.is_err() {
            debug!("[{}/{}] link closed, parcel dropped", side, from);
        }
    }

    async fn terminate(&self, from: Option<K>, outcome: RunOutcome) {
        let side = self.inner.side;
        if self.inner.terminating.swap(true, Ordering::AcqRel) {
            debug!(outcome = %outcome, "[{}] already terminating", side);
            return;
        }

        for (kind, inbox) in &self.inner.inboxes {
            if inbox.send(Signal::Exit).is_err() {
                debug!(station = %kind, "[{}] station already stopped", side);
            }
        }
        for (kind, stopped) in &self.inner.stopped {
            // The station issuing Terminate stops once this returns.
            if Some(*kind) == from {
                continue;
            }
            let mut stopped = stopped.clone();
            while !*stopped.borrow_and_update() {
                if stopped.changed().await.is_err() {
                    break;
                }
            }
        }

        self.inner.outcome.send_replace(Some(outcome));
        self.inner
            .bus
            .publish(ProtocolEvent::RunEnded { side, outcome })
            .await;
        info!(outcome = %outcome, "[{}] run ended", side);
    }
}

/// Owner's handle on a running role.
pub struct RoleHandle<K: StationKind> {
    runtime: RoleRuntime<K>,
    outcome: watch::Receiver<Option<RunOutcome>>,
    tasks: Vec<JoinHandle<()>>,
}

impl<K: StationKind> RoleHandle<K> {
    #[must_use]
    pub fn side(&self) -> Side {
        self.runtime.inner.side
    }

    /// Hand an envelope to one of the role's stations.
    pub fn inject(&self, to: K, envelope: Envelope) -> Result<(), BusError> {
        if self.runtime.is_terminating() {
            return Err(BusError::Terminated);
        }
        self.runtime.deliver(to, Signal::Message(envelope));
        Ok(())
    }

    /// Outcome, once the run has ended.
    #[must_use]
    pub fn outcome(&self) -> Option<RunOutcome> {
        *self.outcome.borrow()
    }

    /// Wait for the run to end.
    pub async fn wait(&mut self) -> RunOutcome {
        loop {
            let current = *self.outcome.borrow_and_update();
            if let Some(outcome) = current {
                return outcome;
            }
            if self.outcome.changed().await.is_err() {
                return RunOutcome::Stopped;
            }
        }
    }

    /// End the run from outside. No effect once it has ended.
    pub async fn stop(&self) {
        self.runtime.terminate(None, RunOutcome::Stopped).await;
    }

    /// Stop if still running, then wait for every station task.
    pub async fn shutdown(&mut self) -> RunOutcome {
        self.stop().await;
        let outcome = self.wait().await;
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "[{}] station task failed", self.runtime.inner.side);
            }
        }
        outcome
    }
}

impl<K: StationKind> Drop for RoleHandle<K> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventFilter;
    use crate::link::boundary_link;
    use crate::publisher::InMemoryEventBus;
    use crate::station::Station;
    use crate::subscriber::EventSubscriber;
    use awdt_types::{Addresses, Role, SessionProfile};
    use std::fmt;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Toy {
        Entry,
        Echo,
        Ticker,
        Stopper,
    }

    impl fmt::Display for Toy {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl StationKind for Toy {
        fn all() -> &'static [Self] {
            &[Toy::Entry, Toy::Echo, Toy::Ticker, Toy::Stopper]
        }

        fn ingress() -> Self {
            Toy::Entry
        }

        fn is_persistent(&self) -> bool {
            matches!(self, Toy::Ticker)
        }

        fn role(&self) -> Role {
            match self {
                Toy::Entry => Role::Device,
                Toy::Echo => Role::Signer,
                Toy::Ticker => Role::Timer,
                Toy::Stopper => Role::Shutdown,
            }
        }
    }

    struct ToyStation {
        kind: Toy,
        ticks: Arc<AtomicUsize>,
        exits: Arc<AtomicUsize>,
    }

    impl Station<Toy> for ToyStation {
        fn handle(&mut self, signal: Signal) -> Vec<Directive<Toy>> {
            match (self.kind, signal) {
                (Toy::Entry, Signal::Message(env)) => vec![Directive::send(Toy::Ticker, env)],
                (Toy::Echo, Signal::Message(env)) => vec![Directive::CrossBoundary(env)],
                (Toy::Ticker, Signal::Message(env)) => vec![Directive::WakeupAfter {
                    delay: Duration::from_millis(10),
                    envelope: env,
                }],
                (Toy::Ticker, Signal::Wakeup(env)) => {
                    let n = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
                    if n >= 3 {
                        vec![Directive::send(Toy::Stopper, env)]
                    } else {
                        vec![Directive::WakeupAfter {
                            delay: Duration::from_millis(10),
                            envelope: env,
                        }]
                    }
                }
                (Toy::Ticker, Signal::Exit) => {
                    self.exits.fetch_add(1, Ordering::SeqCst);
                    Vec::new()
                }
                (Toy::Stopper, Signal::Message(_)) => {
                    vec![Directive::Terminate(RunOutcome::DeferralApplied)]
                }
                _ => vec![Directive::ExitSelf],
            }
        }
    }

    struct ToyFactory {
        ticks: Arc<AtomicUsize>,
        exits: Arc<AtomicUsize>,
    }

    impl StationFactory<Toy> for ToyFactory {
        fn create(&self, kind: Toy) -> Box<dyn Station<Toy>> {
            Box::new(ToyStation {
                kind,
                ticks: Arc::clone(&self.ticks),
                exits: Arc::clone(&self.exits),
            })
        }
    }

    fn envelope() -> Envelope {
        Envelope::entry(Role::Boot, &SessionProfile::default(), Addresses::default())
    }

    fn toy_role(link: LinkEnd, bus: Arc<InMemoryEventBus>) -> (RoleHandle<Toy>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let exits = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(ToyFactory {
            ticks: Arc::clone(&ticks),
            exits: Arc::clone(&exits),
        });
        (spawn_role(Side::Device, factory, link, bus), ticks, exits)
    }

    #[tokio::test(start_paused = true)]
    async fn test_wakeups_rearm_until_terminate_cascades_exit() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut events = bus.subscribe(EventFilter::all());
        let (device_end, _server_end) = boundary_link(8);
        let (mut role, ticks, exits) = toy_role(device_end, bus);

        role.inject(Toy::Entry, envelope()).unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(1), role.wait())
            .await
            .expect("run should end");

        assert_eq!(outcome, RunOutcome::DeferralApplied);
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        // Exit reached the persistent station before the outcome was reported.
        assert_eq!(exits.load(Ordering::SeqCst), 1);
        assert!(events.drain().contains(&ProtocolEvent::RunEnded {
            side: Side::Device,
            outcome: RunOutcome::DeferralApplied
        }));
        assert!(matches!(role.inject(Toy::Entry, envelope()), Err(BusError::Terminated)));
    }

    #[tokio::test]
    async fn test_parcels_cross_and_garbage_is_dropped() {
        let bus = Arc::new(InMemoryEventBus::new());
        let (device_end, mut server_end) = boundary_link(8);
        let (mut role, _, _) = toy_role(device_end, bus);

        role.inject(Toy::Echo, envelope()).unwrap();
        let frame = tokio::time::timeout(Duration::from_secs(1), server_end.recv())
            .await
            .expect("parcel")
            .expect("frame");
        let BoundaryFrame::Parcel(parcel) = frame else {
            panic!("expected a parcel");
        };
        assert_eq!(parcel.open().unwrap().history(), &[Role::Boot]);

        server_end
            .send(BoundaryFrame::Parcel(Parcel {
                body: b"not json".to_vec(),
                addresses: Addresses::default(),
            }))
            .await
            .unwrap();
        server_end.send(BoundaryFrame::Shutdown).await.unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(1), role.wait())
            .await
            .expect("peer shutdown");
        assert_eq!(outcome, RunOutcome::PeerShutdown);
        assert_eq!(role.shutdown().await, RunOutcome::PeerShutdown);
    }

    #[tokio::test]
    async fn test_exit_self_publishes_handler_exit() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut events = bus.subscribe(EventFilter::all());
        let (device_end, _server_end) = boundary_link(8);
        let (mut role, _, _) = toy_role(device_end, Arc::clone(&bus));

        // A wakeup at a transient station is not something it handles.
        role.runtime.deliver(Toy::Echo, Signal::Wakeup(envelope()));
        let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("event")
            .expect("bus open");
        assert_eq!(
            event,
            ProtocolEvent::HandlerExited {
                side: Side::Device,
                role: Role::Signer
            }
        );

        assert_eq!(role.shutdown().await, RunOutcome::Stopped);
        assert_eq!(role.outcome(), Some(RunOutcome::Stopped));
    }
}
