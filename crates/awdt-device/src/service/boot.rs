//! Boot path: ingress routing, staging, verification, downloads, patching
//! and reset.

use awdt_bus::{Directive, ProtocolEvent, RejectReason, ResetReason, RunOutcome};
use awdt_storage::layout::{
    DEVICE_SECURE_STORAGE, NONCE_FILE, STAGED_BOOT_TICKET, STAGED_UPDATE, STAGING_AREA, VERSION_FILE,
};
use awdt_types::{Envelope, HookPoint, Payload, Request, RequestType, Role, WireDocument};
use tracing::{debug, info, warn};

use super::{DeviceStation, Directives};
use crate::domain::{reconcile, staging_key, DeviceResult, DeviceState, Reconciled};

impl DeviceStation {
    /// Device ingress: entry labels, server replies, outbound parcels.
    pub(super) fn ingress(&self, former: Option<Role>, env: Envelope) -> Directives {
        match (former, env.payload.as_ref()) {
            (Some(Role::Boot), _) => vec![Directive::send(DeviceState::Boot, env)],
            (Some(Role::Server), Some(Payload::DefTicket(_))) => {
                vec![Directive::send(DeviceState::Verifier, env)]
            }
            (Some(Role::Server), _) => vec![Directive::send(DeviceState::StagingArea, env)],
            (Some(Role::Signer), _) => vec![Directive::CrossBoundary(env)],
            _ => self.unexpected(former, &env),
        }
    }

    pub(super) fn boot(&self, former: Option<Role>, env: Envelope) -> Directives {
        match former {
            Some(Role::Device) => {
                info!("[device/boot] booting");
                vec![Directive::send(DeviceState::StagingArea, env)]
            }
            _ => self.unexpected(former, &env),
        }
    }

    // -------------------------------------------------------------------------
    // Staging area
    // -------------------------------------------------------------------------

    pub(super) fn staging_area(&self, former: Option<Role>, env: Envelope) -> Directives {
        match former {
            Some(Role::Boot) => self.load_staged(env),
            Some(Role::Device) => self.stage(env),
            _ => self.unexpected(former, &env),
        }
    }

    fn load_staged(&self, mut env: Envelope) -> Directives {
        self.mark(HookPoint::StagingEntered, &env);
        match reconcile(self.ctx.store.as_ref(), &env.addresses) {
            Reconciled::Pending { key, staged } => {
                info!(item = key, "[device/staging_area] staged item found, verifying");
                env.payload = staged.payload;
                env.signature = staged.signature;
                vec![Directive::send(DeviceState::Verifier, env)]
            }
            Reconciled::Empty => {
                info!("[device/staging_area] nothing staged, requesting a boot ticket");
                env.set_payload(Payload::empty_boot_ticket());
                vec![Directive::send(DeviceState::UpdateDownloader, env)]
            }
        }
    }

    /// Persist an item received from the server and reset to verify it.
    fn stage(&self, env: Envelope) -> Directives {
        let Some(key) = staging_key(env.payload.as_ref()) else {
            return self.unexpected(Some(Role::Device), &env);
        };
        if let Err(e) = self.persist_staged(key, &env) {
            return self.fail(e);
        }

        info!(item = key, "[device/staging_area] item staged, resetting");
        vec![
            Directive::Publish(ProtocolEvent::ItemStaged {
                item: key.to_string(),
            }),
            Directive::send(DeviceState::Shutdown, env),
        ]
    }

    fn persist_staged(&self, key: &str, env: &Envelope) -> DeviceResult<()> {
        let bytes = WireDocument::encode(env)?;
        self.ctx.store.put(STAGING_AREA, key, &bytes)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Verifier
    // -------------------------------------------------------------------------

    pub(super) fn verifier(&self, former: Option<Role>, env: Envelope) -> Directives {
        match (former, env.payload.as_ref()) {
            (Some(Role::StagingArea), Some(Payload::Update(update))) => {
                let version = update.version;
                self.verify_update(env, version)
            }
            (Some(Role::StagingArea), Some(Payload::BootTicket(ticket))) => {
                let nonce = ticket.nonce.clone();
                self.verify_boot_ticket(env, nonce)
            }
            (Some(Role::Device), Some(Payload::DefTicket(ticket))) => {
                let nonce = ticket.nonce.clone();
                self.verify_def_ticket(env, nonce)
            }
            _ => self.unexpected(former, &env),
        }
    }

    fn verify_update(&self, env: Envelope, version: u64) -> Directives {
        match self.update_verdict(&env, version) {
            Ok(None) => {
                info!(version, "[device/verifier] update accepted");
                vec![Directive::send(DeviceState::CorePatcher, env)]
            }
            Ok(Some(reason)) => self.reject(env, STAGED_UPDATE, reason, Payload::empty_update()),
            Err(e) => self.fail(e),
        }
    }

    fn verify_boot_ticket(&self, env: Envelope, nonce: String) -> Directives {
        match self.ticket_verdict(&env, &nonce) {
            Ok(None) => {
                info!("[device/verifier] boot ticket accepted");
                vec![
                    Directive::Publish(ProtocolEvent::BootTicketAccepted { nonce }),
                    Directive::send(DeviceState::AwdtInit, env.clone()),
                    Directive::send(DeviceState::BusinessLogic, env),
                ]
            }
            Ok(Some(reason)) => {
                self.reject(env, STAGED_BOOT_TICKET, reason, Payload::empty_boot_ticket())
            }
            Err(e) => self.fail(e),
        }
    }

    /// An invalid deferral ticket is dropped; the watchdog keeps running.
    fn verify_def_ticket(&self, env: Envelope, nonce: String) -> Directives {
        match self.ticket_verdict(&env, &nonce) {
            Ok(None) => {
                debug!("[device/verifier] deferral ticket accepted");
                vec![Directive::send(DeviceState::AwdtPutTicket, env)]
            }
            Ok(Some(reason)) => {
                warn!(?reason, "[device/verifier] deferral ticket dropped");
                vec![Directive::Publish(ProtocolEvent::ItemRejected {
                    item: "defticket".to_string(),
                    reason,
                })]
            }
            Err(e) => self.fail(e),
        }
    }

    /// `None` when the update may be applied.
    fn update_verdict(&self, env: &Envelope, version: u64) -> DeviceResult<Option<RejectReason>> {
        if !self.ctx.crypto.verify_envelope(env)? {
            return Ok(Some(RejectReason::InvalidSignature));
        }
        if env.crypto_mode.is_disabled() {
            return Ok(None);
        }
        let stored = self.ctx.store.read_version(DEVICE_SECURE_STORAGE, VERSION_FILE)?;
        Ok((version != stored.saturating_add(1)).then_some(RejectReason::StaleVersion))
    }

    /// `None` when the ticket answers this device's last challenge.
    fn ticket_verdict(&self, env: &Envelope, nonce: &str) -> DeviceResult<Option<RejectReason>> {
        if !self.ctx.crypto.verify_envelope(env)? {
            return Ok(Some(RejectReason::InvalidSignature));
        }
        if env.crypto_mode.is_disabled() {
            return Ok(None);
        }
        if !self.nonce_matches(nonce)? {
            return Ok(Some(RejectReason::NonceMismatch));
        }
        self.consume_nonce()?;
        Ok(None)
    }

    /// A challenge answers one ticket only. The emptied file never matches.
    fn consume_nonce(&self) -> DeviceResult<()> {
        self.ctx.store.put(DEVICE_SECURE_STORAGE, NONCE_FILE, b"")?;
        Ok(())
    }

    /// Compare against the last nonce this device issued. No issued nonce
    /// never matches.
    fn nonce_matches(&self, received: &str) -> DeviceResult<bool> {
        match self.ctx.store.get_string(DEVICE_SECURE_STORAGE, NONCE_FILE) {
            Ok(stored) => Ok(!received.is_empty() && stored.trim() == received),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the staged item and ask the server for a fresh one.
    fn reject(
        &self,
        mut env: Envelope,
        key: &'static str,
        reason: RejectReason,
        placeholder: Payload,
    ) -> Directives {
        warn!(item = key, ?reason, "[device/verifier] staged item rejected");
        if let Err(e) = self.ctx.store.delete(STAGING_AREA, key) {
            warn!(item = key, error = %e, "[device/verifier] rejected item could not be removed");
        }
        env.set_payload(placeholder);
        vec![
            Directive::Publish(ProtocolEvent::ItemRejected {
                item: key.to_string(),
                reason,
            }),
            Directive::send(DeviceState::UpdateDownloader, env),
        ]
    }

    // -------------------------------------------------------------------------
    // Downloads and signing
    // -------------------------------------------------------------------------

    pub(super) fn update_downloader(&self, former: Option<Role>, env: Envelope) -> Directives {
        let missing = env.payload.as_ref().and_then(Payload::missing_item);
        match (former, missing) {
            (Some(Role::Verifier | Role::StagingArea), Some(request_type)) => {
                self.request_fresh(env, request_type)
            }
            _ => self.unexpected(former, &env),
        }
    }

    /// Issue and persist a fresh nonce, then send a signed request for
    /// `request_type` to the server.
    pub(super) fn request_fresh(&self, mut env: Envelope, request_type: RequestType) -> Directives {
        let nonce = self.ctx.entropy.nonce();
        if let Err(e) = self.ctx.store.put(DEVICE_SECURE_STORAGE, NONCE_FILE, nonce.as_bytes()) {
            return self.fail(e);
        }
        info!(%request_type, "[device/{}] requesting", self.state);
        env.set_payload(Payload::Request(Request {
            request_type,
            timestamp: self.now(),
            nonce,
        }));
        vec![
            Directive::Publish(ProtocolEvent::RequestSent { request_type }),
            Directive::send(DeviceState::Signer, env),
        ]
    }

    pub(super) fn signer(&self, former: Option<Role>, mut env: Envelope) -> Directives {
        match former {
            Some(Role::Sensor | Role::UpdateDownloader | Role::AwdtGetNonce) => {
                if let Err(e) = self.ctx.crypto.sign_envelope(&mut env) {
                    return self.fail(e);
                }
                vec![Directive::send(DeviceState::Ingress, env)]
            }
            _ => self.unexpected(former, &env),
        }
    }

    // -------------------------------------------------------------------------
    // Patching and reset
    // -------------------------------------------------------------------------

    pub(super) fn core_patcher(&self, former: Option<Role>, env: Envelope) -> Directives {
        let version = match (former, env.payload.as_ref()) {
            (Some(Role::Verifier), Some(Payload::Update(update))) => update.version,
            _ => return self.unexpected(former, &env),
        };
        if let Err(e) = self.ctx.store.write_version(DEVICE_SECURE_STORAGE, VERSION_FILE, version) {
            return self.fail(e);
        }
        if let Err(e) = self.ctx.store.delete(STAGING_AREA, STAGED_UPDATE) {
            warn!(error = %e, "[device/core_patcher] applied update could not be unstaged");
        }
        info!(version, "[device/core_patcher] update applied, resetting");
        vec![
            Directive::Publish(ProtocolEvent::UpdateApplied { version }),
            Directive::send(DeviceState::Shutdown, env),
        ]
    }

    pub(super) fn shutdown(&self, former: Option<Role>, env: Envelope) -> Directives {
        let reason = match former {
            Some(Role::Timer) => ResetReason::WatchdogExpired,
            Some(Role::CorePatcher) => ResetReason::UpdateApplied,
            Some(Role::StagingArea) => ResetReason::StagedForReboot,
            _ => return self.unexpected(former, &env),
        };
        info!(reason = ?reason, "[device/shutdown] device reset");
        vec![Directive::Terminate(RunOutcome::Reset(reason))]
    }
}
