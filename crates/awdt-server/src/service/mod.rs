//! # Server Service
//!
//! Binds the server states to the station runtime. Every state is
//! transient: a fresh instance handles each envelope and keeps nothing.

mod handlers;

use std::sync::Arc;

use awdt_bus::{Directive, Signal, Station, StationFactory, StationKind};
use awdt_crypto::CryptoOrchestrator;
use awdt_storage::{Clock, ObjectStore, SystemClock};
use awdt_types::{Envelope, HookContext, HookPoint, MeasurementHook, NoopHook, Role};
use tracing::{debug, error, warn};

use crate::domain::{IssuanceConfig, ServerError, ServerState};

pub(crate) type Directives = Vec<Directive<ServerState>>;

/// Collaborators shared by every server station.
pub struct ServerContext {
    pub(crate) issuance: IssuanceConfig,
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) crypto: CryptoOrchestrator,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) hook: Arc<dyn MeasurementHook>,
}

impl ServerContext {
    pub fn new(issuance: IssuanceConfig, store: Arc<dyn ObjectStore>, crypto: CryptoOrchestrator) -> Self {
        Self {
            issuance,
            store,
            crypto,
            clock: Arc::new(SystemClock),
            hook: Arc::new(NoopHook),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn MeasurementHook>) -> Self {
        self.hook = hook;
        self
    }

    #[must_use]
    pub fn crypto(&self) -> &CryptoOrchestrator {
        &self.crypto
    }
}

/// Builds server stations over one shared context.
pub struct ServerStations {
    ctx: Arc<ServerContext>,
}

impl ServerStations {
    pub fn new(ctx: Arc<ServerContext>) -> Self {
        Self { ctx }
    }
}

impl StationFactory<ServerState> for ServerStations {
    fn create(&self, kind: ServerState) -> Box<dyn Station<ServerState>> {
        Box::new(ServerStation {
            state: kind,
            ctx: Arc::clone(&self.ctx),
        })
    }
}

pub(crate) struct ServerStation {
    pub(crate) state: ServerState,
    pub(crate) ctx: Arc<ServerContext>,
}

impl ServerStation {
    fn on_message(&self, former: Option<Role>, env: Envelope) -> Directives {
        match self.state {
            ServerState::Ingress => self.ingress(former, env),
            ServerState::Verifier => self.verifier(former, env),
            ServerState::BootTicketGenerator => self.generate_boot_ticket(former, env),
            ServerState::UpdateGenerator => self.generate_update(former, env),
            ServerState::DeferralTicketGenerator => self.generate_def_ticket(former, env),
            ServerState::Storage => self.storage(former, env),
            ServerState::Signer => self.signer(former, env),
        }
    }

    pub(crate) fn unexpected(&self, former: Option<Role>, env: &Envelope) -> Directives {
        warn!(
            former = former.map_or("none", |r| r.as_str()),
            payload = env.payload_kind(),
            "[server/{}] unexpected message, exiting",
            self.state
        );
        vec![Directive::ExitSelf]
    }

    pub(crate) fn fail(&self, err: impl Into<ServerError>) -> Directives {
        let err = err.into();
        error!(error = %err, "[server/{}] handler failed, exiting", self.state);
        vec![Directive::ExitSelf]
    }

    pub(crate) fn mark(&self, point: HookPoint, env: &Envelope) {
        self.ctx
            .hook
            .mark(point, &HookContext::for_envelope(self.state.role(), env));
    }

    pub(crate) fn now(&self) -> u64 {
        self.ctx.clock.now()
    }
}

impl Station<ServerState> for ServerStation {
    fn handle(&mut self, signal: Signal) -> Directives {
        match signal {
            Signal::Message(mut env) => {
                let former = env.step(self.state.role());
                debug!(
                    former = former.map_or("none", |r| r.as_str()),
                    payload = env.payload_kind(),
                    "[server/{}] message received",
                    self.state
                );
                self.on_message(former, env)
            }
            Signal::Wakeup(_) => {
                warn!("[server/{}] unexpected wakeup ignored", self.state);
                Vec::new()
            }
            Signal::Exit => Vec::new(),
        }
    }
}
