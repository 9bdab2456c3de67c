//! # Coordinator
//!
//! Runs the device and the server side by side over one boundary link and
//! one shared store, and reboots the device after every reset.
//!
//! ```text
//!            ┌──────────── cycle ────────────┐
//! action ──► │ spawn device + server         │
//!            │ seed entry envelope           │──► device outcome
//!            │ wait (bounded by timeout)     │
//!            │ stop the server               │
//!            └───────────────────────────────┘
//!                 │ reset and reboots left
//!                 └──────────► next cycle with action = boot
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use awdt_bus::{boundary_link, EventPublisher, InMemoryEventBus, RunOutcome, RuntimeClock};
use awdt_crypto::{CryptoOrchestrator, KeyOwner};
use awdt_device::{spawn_device, DeviceContext, DeviceState, EntropySource, OsEntropy, BOOT_LABEL};
use awdt_server::{spawn_server, ServerContext, ServerState, PUSH_UPDATE_LABEL};
use awdt_storage::{Clock, FileSystemStore, InMemoryStore, ObjectStore, SystemClock};
use awdt_telemetry::record_run_outcome;
use awdt_types::{Addresses, Envelope, HookContext, HookPoint, MeasurementHook, NoopHook, Role};
use tokio::time::{timeout, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::NodeConfig;
use crate::errors::NodeResult;
use crate::setup::{ensure_keys, ScenarioSetup};

/// What starts a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Boot the device.
    Boot,
    /// Have the server push an update to a running device.
    PushUpdate,
}

impl Action {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Boot => "boot",
            Action::PushUpdate => "update",
        }
    }

    /// Role label seeded into the entry envelope.
    #[must_use]
    pub fn label(&self) -> Role {
        match self {
            Action::Boot => BOOT_LABEL,
            Action::PushUpdate => PUSH_UPDATE_LABEL,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One boot cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub action: Action,
    pub outcome: RunOutcome,
    pub elapsed: Duration,
}

/// A run: the first cycle plus every reboot it caused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub action: Action,
    pub cycles: Vec<CycleReport>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Outcome of the last cycle.
    #[must_use]
    pub fn outcome(&self) -> RunOutcome {
        self.cycles
            .last()
            .map_or(RunOutcome::Stopped, |cycle| cycle.outcome)
    }

    /// Resets the device went through.
    #[must_use]
    pub fn resets(&self) -> usize {
        self.cycles.iter().filter(|c| c.outcome.is_reset()).count()
    }
}

/// Owns configuration, store and event bus for a sequence of runs.
pub struct Coordinator {
    config: NodeConfig,
    store: Arc<dyn ObjectStore>,
    bus: Arc<InMemoryEventBus>,
    hook: Arc<dyn MeasurementHook>,
    entropy: Arc<dyn EntropySource>,
    clock: Option<Arc<dyn Clock>>,
}

impl Coordinator {
    pub fn new(config: NodeConfig, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            config,
            store,
            bus: Arc::new(InMemoryEventBus::new()),
            hook: Arc::new(NoopHook),
            entropy: Arc::new(OsEntropy),
            clock: None,
        }
    }

    /// Coordinator over the store its configuration names.
    pub fn open(config: NodeConfig) -> NodeResult<Self> {
        let store: Arc<dyn ObjectStore> = if config.storage.in_memory {
            Arc::new(InMemoryStore::new())
        } else {
            Arc::new(FileSystemStore::open(config.storage.base_dir.clone())?)
        };
        Ok(Self::new(config, store))
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

    /// Fixed time source. By default each run counts seconds on the tokio
    /// clock from the current system time.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Bus carrying the protocol events of every run.
    #[must_use]
    pub fn events(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    /// Execute `action`, then reboot after each reset while reboots remain.
    pub async fn run(&self, action: Action) -> NodeResult<RunReport> {
        let run_id = Uuid::new_v4();
        let clock = self
            .clock
            .clone()
            .unwrap_or_else(|| Arc::new(RuntimeClock::starting_at(SystemClock.now())));
        let started = Instant::now();

        ensure_keys(self.store.as_ref(), &self.config.crypto)?;
        if let Some(scenario) = self.config.run.scenario.filter(|_| self.config.run.prepare_scenario) {
            let server = self.orchestrator(KeyOwner::Server);
            ScenarioSetup {
                store: self.store.as_ref(),
                server: &server,
                entropy: self.entropy.as_ref(),
                profile: self.config.session_profile(),
                issuance: self.config.protocol.issuance(),
                now: clock.now(),
            }
            .prepare(scenario)?;
        }

        info!(
            run_id = %run_id,
            action = %action,
            crypto = %self.config.crypto.mode(),
            variant = %self.config.crypto.variant(),
            scenario = ?self.config.run.scenario.map(|s| s.id()),
            "[node] run started"
        );

        let mut cycles = Vec::new();
        let mut next = action;
        loop {
            let cycle = self.cycle(next, &clock).await?;
            cycles.push(cycle);
            if !cycle.outcome.is_reset() {
                break;
            }
            if cycles.len() > self.config.run.reboots as usize {
                warn!(resets = cycles.len(), "[node] reboot budget exhausted");
                break;
            }
            info!(outcome = %cycle.outcome, "[node] device reset, rebooting");
            next = Action::Boot;
        }

        let report = RunReport {
            run_id,
            action,
            cycles,
            elapsed: started.elapsed(),
        };
        record_run_outcome(action.as_str(), &report.outcome().to_string());
        info!(
            run_id = %run_id,
            outcome = %report.outcome(),
            cycles = report.cycles.len(),
            events = self.bus.events_published(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "[node] run finished"
        );
        Ok(report)
    }

    /// One boot cycle: both roles up, entry seeded, device outcome awaited.
    async fn cycle(&self, action: Action, clock: &Arc<dyn Clock>) -> NodeResult<CycleReport> {
        let profile = self.config.session_profile();
        let entry = Envelope::entry(action.label(), &profile, Addresses::default());
        let hook_ctx = HookContext::for_envelope(action.label(), &entry);

        let device_ctx = DeviceContext::new(
            self.config.protocol.device(),
            Arc::clone(&self.store),
            self.orchestrator(KeyOwner::Device),
        )
        .with_clock(Arc::clone(clock))
        .with_hook(Arc::clone(&self.hook))
        .with_entropy(Arc::clone(&self.entropy));
        let server_ctx = ServerContext::new(
            self.config.protocol.issuance(),
            Arc::clone(&self.store),
            self.orchestrator(KeyOwner::Server),
        )
        .with_clock(Arc::clone(clock))
        .with_hook(Arc::clone(&self.hook));

        let (device_end, server_end) = boundary_link(self.config.run.link_capacity);
        let bus: Arc<dyn EventPublisher> = self.bus.clone();
        let mut device = spawn_device(Arc::new(device_ctx), device_end, Arc::clone(&bus));
        let mut server = spawn_server(Arc::new(server_ctx), server_end, bus);

        let started = Instant::now();
        self.hook.mark(HookPoint::RunStarted, &hook_ctx);
        match action {
            Action::Boot => device.inject(DeviceState::Ingress, entry)?,
            Action::PushUpdate => server.inject(ServerState::Ingress, entry)?,
        }

        let outcome = match timeout(self.config.run.timeout, device.wait()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    timeout_secs = self.config.run.timeout.as_secs(),
                    "[node] nothing ended the cycle in time"
                );
                RunOutcome::TimedOut
            }
        };
        self.hook.mark(HookPoint::RunEnded, &hook_ctx);
        let elapsed = started.elapsed();

        server.shutdown().await;
        device.shutdown().await;

        info!(action = %action, outcome = %outcome, "[node] cycle ended");
        Ok(CycleReport {
            action,
            outcome,
            elapsed,
        })
    }

    fn orchestrator(&self, owner: KeyOwner) -> CryptoOrchestrator {
        CryptoOrchestrator::new(self.config.crypto, owner, Arc::clone(&self.store))
    }
}
