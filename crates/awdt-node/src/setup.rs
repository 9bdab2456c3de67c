//! # Run Setup
//!
//! Key provisioning and the preconditions a benchmarking scenario expects
//! to find when the device boots:
//!
//! | Scenario | Staging area | Compromised flag |
//! |----------|--------------|------------------|
//! | 1, 8 | empty | cleared |
//! | 2 | boot ticket answering a stale challenge | cleared |
//! | 3, 4 | valid boot ticket | cleared |
//! | 5 | empty | set |
//! | 6 | update with a stale version | cleared |
//! | 7 | update one version above the device | cleared |

use awdt_crypto::{provision_keys, CryptoOrchestrator, CryptoPolicy, KeyLocator, KeyOwner};
use awdt_device::EntropySource;
use awdt_server::{issue_boot_ticket, issue_update, set_compromised, IssuanceConfig};
use awdt_storage::layout::{
    DEVICE_SECURE_STORAGE, NONCE_FILE, STAGED_BOOT_TICKET, STAGED_UPDATE, STAGING_AREA, VERSION_FILE,
};
use awdt_storage::ObjectStore;
use awdt_types::{Addresses, Envelope, Payload, Role, Scenario, SessionProfile, Timestamp, WireDocument};
use tracing::info;

use crate::errors::NodeResult;

/// Nonce no device ever issues.
pub const STALE_NONCE: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Provision device and server keys for the policy's variant unless both
/// private keys are already stored. Returns whether keys were generated.
pub fn ensure_keys(store: &dyn ObjectStore, policy: &CryptoPolicy) -> NodeResult<bool> {
    if policy.mode().is_disabled() {
        return Ok(false);
    }
    let mut present = true;
    for owner in [KeyOwner::Device, KeyOwner::Server] {
        let (path, key) = KeyLocator::new(owner, policy.variant()).private_key();
        present &= store.exists(path, &key)?;
    }
    if present {
        return Ok(false);
    }
    provision_keys(store, policy.variant())?;
    info!(variant = %policy.variant(), "[node] keys provisioned");
    Ok(true)
}

/// Everything the scenario preparation needs from the coordinator.
pub struct ScenarioSetup<'a> {
    pub store: &'a dyn ObjectStore,
    pub server: &'a CryptoOrchestrator,
    pub entropy: &'a dyn EntropySource,
    pub profile: SessionProfile,
    pub issuance: IssuanceConfig,
    pub now: Timestamp,
}

impl ScenarioSetup<'_> {
    /// Arrange staging and the compromised flag for `scenario`.
    pub fn prepare(&self, scenario: Scenario) -> NodeResult<()> {
        set_compromised(self.store, scenario.id() == 5)?;
        self.clear_staging()?;
        match scenario.id() {
            2 => self.stage_boot_ticket(false)?,
            3 | 4 => self.stage_boot_ticket(true)?,
            6 => self.stage_update(false)?,
            7 => self.stage_update(true)?,
            _ => {}
        }
        info!(scenario = scenario.id(), "[node] scenario prepared");
        Ok(())
    }

    fn clear_staging(&self) -> NodeResult<()> {
        for key in [STAGED_UPDATE, STAGED_BOOT_TICKET] {
            match self.store.delete(STAGING_AREA, key) {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Stage a server-signed boot ticket. A valid one answers the nonce the
    /// device recorded; an invalid one answers a challenge it never made.
    fn stage_boot_ticket(&self, valid: bool) -> NodeResult<()> {
        let nonce = self.entropy.nonce();
        self.store
            .put(DEVICE_SECURE_STORAGE, NONCE_FILE, nonce.as_bytes())?;
        let answered = if valid { nonce.as_str() } else { STALE_NONCE };
        let ticket = issue_boot_ticket(answered, self.now, &self.issuance);
        self.stage(STAGED_BOOT_TICKET, Payload::BootTicket(ticket))
    }

    /// Stage a server-signed update. A valid one is one version above the
    /// device; an invalid one repeats the installed version.
    fn stage_update(&self, valid: bool) -> NodeResult<()> {
        let installed = self.store.read_version(DEVICE_SECURE_STORAGE, VERSION_FILE)?;
        let mut update = issue_update(installed, self.now);
        if !valid {
            update.version = installed;
        }
        self.stage(STAGED_UPDATE, Payload::Update(update))
    }

    fn stage(&self, key: &str, payload: Payload) -> NodeResult<()> {
        let mut envelope = Envelope::entry(Role::Server, &self.profile, Addresses::default());
        envelope.set_payload(payload);
        self.server.sign_envelope(&mut envelope)?;
        self.store
            .put(STAGING_AREA, key, &WireDocument::encode(&envelope)?)?;
        Ok(())
    }
}
