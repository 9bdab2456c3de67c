//! # Device Service
//!
//! Binds the device states to the station runtime.
//!
//! Every handler records itself in the envelope's history, learns its former
//! role from the cursor and then dispatches on `(former, payload)`. A pair a
//! handler does not expect ends that handler instance.
//!
//! ## Handler Groups
//!
//! - `boot`: ingress, boot, staging, verification, downloads, patching, reset
//! - `liveness`: watchdog, deferral renewal, business logic and the sensor loop

mod boot;
mod liveness;

use std::sync::Arc;
use std::time::Duration;

use awdt_bus::{Directive, Signal, Station, StationFactory, StationKind};
use awdt_crypto::CryptoOrchestrator;
use awdt_storage::{Clock, ObjectStore, SystemClock};
use awdt_types::{Envelope, HookContext, HookPoint, MeasurementHook, NoopHook, Role};
use tracing::{debug, error, warn};

use crate::domain::{Countdown, DeviceError, DeviceState};
use crate::ports::{EntropySource, OsEntropy};

pub(crate) type Directives = Vec<Directive<DeviceState>>;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Device loop periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Period between two sensor readings.
    pub sensor_interval: Duration,
    /// Period between two deferral ticket requests.
    pub renewal_interval: Duration,
    /// Period between two watchdog polls.
    pub poll_interval: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sensor_interval: Duration::from_secs(10),
            renewal_interval: Duration::from_secs(10),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Collaborators shared by every device station.
pub struct DeviceContext {
    pub(crate) config: DeviceConfig,
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) crypto: CryptoOrchestrator,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) hook: Arc<dyn MeasurementHook>,
    pub(crate) entropy: Arc<dyn EntropySource>,
}

impl DeviceContext {
    /// Context with the system clock, OS randomness and no measurement hook.
    pub fn new(config: DeviceConfig, store: Arc<dyn ObjectStore>, crypto: CryptoOrchestrator) -> Self {
        Self {
            config,
            store,
            crypto,
            clock: Arc::new(SystemClock),
            hook: Arc::new(NoopHook),
            entropy: Arc::new(OsEntropy),
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
    pub fn with_entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = entropy;
        self
    }

    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    #[must_use]
    pub fn crypto(&self) -> &CryptoOrchestrator {
        &self.crypto
    }
}

// =============================================================================
// STATIONS
// =============================================================================

/// Builds device stations over one shared context.
pub struct DeviceStations {
    ctx: Arc<DeviceContext>,
}

impl DeviceStations {
    pub fn new(ctx: Arc<DeviceContext>) -> Self {
        Self { ctx }
    }
}

impl StationFactory<DeviceState> for DeviceStations {
    fn create(&self, kind: DeviceState) -> Box<dyn Station<DeviceState>> {
        Box::new(DeviceStation::new(kind, Arc::clone(&self.ctx)))
    }
}

/// Private memory of the `Timer` station.
#[derive(Debug, Default)]
pub(crate) struct TimerMemory {
    pub(crate) countdown: Option<Countdown>,
    pub(crate) polling: bool,
}

/// One device state bound to the shared context.
pub(crate) struct DeviceStation {
    pub(crate) state: DeviceState,
    pub(crate) ctx: Arc<DeviceContext>,
    pub(crate) timer: TimerMemory,
}

impl DeviceStation {
    pub(crate) fn new(state: DeviceState, ctx: Arc<DeviceContext>) -> Self {
        Self {
            state,
            ctx,
            timer: TimerMemory::default(),
        }
    }

    fn on_message(&mut self, former: Option<Role>, env: Envelope) -> Directives {
        match self.state {
            DeviceState::Ingress => self.ingress(former, env),
            DeviceState::Boot => self.boot(former, env),
            DeviceState::StagingArea => self.staging_area(former, env),
            DeviceState::Verifier => self.verifier(former, env),
            DeviceState::UpdateDownloader => self.update_downloader(former, env),
            DeviceState::Signer => self.signer(former, env),
            DeviceState::CorePatcher => self.core_patcher(former, env),
            DeviceState::Shutdown => self.shutdown(former, env),
            DeviceState::AwdtInit => self.awdt_init(former, env),
            DeviceState::AwdtGetNonce => self.awdt_get_nonce(former, env),
            DeviceState::AwdtPutTicket => self.awdt_put_ticket(former, env),
            DeviceState::Timer => self.timer(former, env),
            DeviceState::BusinessLogic => self.business_logic(former, env),
            DeviceState::Sensor => self.sensor(former, env),
        }
    }

    fn on_wakeup(&mut self, env: Envelope) -> Directives {
        match self.state {
            DeviceState::Timer => self.timer_poll(env),
            DeviceState::BusinessLogic => self.renewal_due(env),
            DeviceState::Sensor => self.sensor_due(env),
            other => {
                warn!("[device/{}] unexpected wakeup ignored", other);
                Vec::new()
            }
        }
    }

    // -------------------------------------------------------------------------
    // Shared helpers
    // -------------------------------------------------------------------------

    /// Routing failure: this instance stops.
    pub(crate) fn unexpected(&self, former: Option<Role>, env: &Envelope) -> Directives {
        warn!(
            former = former.map_or("none", |r| r.as_str()),
            payload = env.payload_kind(),
            "[device/{}] unexpected message, exiting",
            self.state
        );
        vec![Directive::ExitSelf]
    }

    /// Unrecoverable failure: this instance stops.
    pub(crate) fn fail(&self, err: impl Into<DeviceError>) -> Directives {
        let err = err.into();
        error!(error = %err, "[device/{}] handler failed, exiting", self.state);
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

impl Station<DeviceState> for DeviceStation {
    fn handle(&mut self, signal: Signal) -> Directives {
        match signal {
            Signal::Message(mut env) => {
                let former = env.step(self.state.role());
                debug!(
                    former = former.map_or("none", |r| r.as_str()),
                    payload = env.payload_kind(),
                    "[device/{}] message received",
                    self.state
                );
                self.on_message(former, env)
            }
            Signal::Wakeup(env) => self.on_wakeup(env),
            Signal::Exit => {
                debug!("[device/{}] exit", self.state);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use awdt_crypto::{provision_keys, CryptoPolicy, KeyOwner};
    use awdt_storage::{InMemoryStore, ManualClock};
    use awdt_types::{Addresses, SessionProfile};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Entropy with a fixed nonce and a counting sensor.
    pub struct FixedEntropy {
        pub nonce: String,
        reading: AtomicU32,
    }

    impl FixedEntropy {
        pub fn new(nonce: &str) -> Self {
            Self {
                nonce: nonce.to_string(),
                reading: AtomicU32::new(4),
            }
        }
    }

    impl EntropySource for FixedEntropy {
        fn nonce(&self) -> String {
            self.nonce.clone()
        }

        fn sensor_value(&self) -> u32 {
            self.reading.fetch_add(1, Ordering::SeqCst)
        }
    }

    pub struct Harness {
        pub store: Arc<InMemoryStore>,
        pub clock: Arc<ManualClock>,
        pub ctx: Arc<DeviceContext>,
        pub server: CryptoOrchestrator,
        pub profile: SessionProfile,
    }

    impl Harness {
        pub fn new(policy: CryptoPolicy) -> Self {
            let store = Arc::new(InMemoryStore::new());
            if !policy.mode().is_disabled() {
                provision_keys(store.as_ref(), policy.variant()).unwrap();
            }
            let clock = Arc::new(ManualClock::new(1_700_000_000));
            let device = CryptoOrchestrator::new(policy, KeyOwner::Device, store.clone());
            let server = CryptoOrchestrator::new(policy, KeyOwner::Server, store.clone());
            let ctx = DeviceContext::new(DeviceConfig::default(), store.clone(), device)
                .with_clock(clock.clone())
                .with_entropy(Arc::new(FixedEntropy::new("n0nce")));
            Self {
                store,
                clock,
                ctx: Arc::new(ctx),
                server,
                profile: SessionProfile {
                    crypto_mode: policy.mode(),
                    variant: policy.variant(),
                    hash_algo: policy.hash(),
                    scenario: None,
                },
            }
        }

        pub fn station(&self, state: DeviceState) -> DeviceStation {
            DeviceStation::new(state, Arc::clone(&self.ctx))
        }

        pub fn entry(&self, label: Role) -> Envelope {
            Envelope::entry(label, &self.profile, Addresses::default())
        }

        /// Envelope as it arrives from the server side, signed by the server.
        pub fn from_server(&self, payload: awdt_types::Payload) -> Envelope {
            let mut env = self.entry(Role::Boot);
            for role in [Role::Device, Role::UpdateDownloader, Role::Signer, Role::Device, Role::Server] {
                env.step(role);
            }
            env.set_payload(payload);
            self.server.sign_envelope(&mut env).unwrap();
            env
        }
    }

    /// Envelopes sent to `to` among `directives`.
    pub fn sent_to(directives: &[Directive<DeviceState>], to: DeviceState) -> Vec<Envelope> {
        directives
            .iter()
            .filter_map(|d| match d {
                Directive::Send { to: t, envelope } if *t == to => Some(envelope.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn exits(directives: &[Directive<DeviceState>]) -> bool {
        directives.iter().any(|d| matches!(d, Directive::ExitSelf))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use awdt_crypto::CryptoPolicy;

    #[test]
    fn test_exit_signal_produces_nothing() {
        let harness = Harness::new(CryptoPolicy::disabled());
        let mut station = harness.station(DeviceState::Timer);
        assert!(station.handle(Signal::Exit).is_empty());
    }

    #[test]
    fn test_wakeup_on_transient_station_is_ignored() {
        let harness = Harness::new(CryptoPolicy::disabled());
        let mut station = harness.station(DeviceState::Verifier);
        let env = harness.entry(Role::Boot);
        assert!(station.handle(Signal::Wakeup(env)).is_empty());
    }

    #[test]
    fn test_factory_builds_requested_state() {
        let harness = Harness::new(CryptoPolicy::disabled());
        let factory = DeviceStations::new(Arc::clone(&harness.ctx));
        let mut station = factory.create(DeviceState::Boot);
        // Boot only accepts the device ingress as former.
        let directives = station.handle(Signal::Message(harness.entry(Role::Boot)));
        assert!(exits(&directives));
    }
}
