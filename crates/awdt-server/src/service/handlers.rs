//! Server handlers.
//!
//! ```text
//! device ──→ server ──→ verifier ─┬─ request(bootticket) ──→ gen_bootticket ─┐
//!                                 ├─ request(update) ─────→ gen_update ─────┤
//!                                 ├─ request(defticket) ──→ gen_defticket ──┼──→ signer ──→ server ──→ device
//!                                 └─ measured_data ───────→ storage         │
//! send_update ──→ server ─────────────────────────────────→ gen_update ─────┘
//! ```

use awdt_bus::{Directive, ProtocolEvent};
use awdt_storage::layout::{SERVER_SECURE_STORAGE, VERSION_FILE};
use awdt_types::{Envelope, HookPoint, Payload, RequestType, Role, RunProfile, WireDocument};
use tracing::{debug, info, warn};

use super::{Directives, ServerStation};
use crate::domain::{
    append_measurement, is_compromised, issue_boot_ticket, issue_def_ticket, issue_update,
    ServerState,
};

impl ServerStation {
    /// Server ingress: pushed updates, device traffic, outbound parcels.
    pub(super) fn ingress(&self, former: Option<Role>, env: Envelope) -> Directives {
        match former {
            Some(Role::PushUpdate) => {
                info!("[server] pushing an update");
                vec![Directive::send(ServerState::UpdateGenerator, env)]
            }
            Some(Role::Device) => vec![Directive::send(ServerState::Verifier, env)],
            Some(Role::Signer) => vec![Directive::CrossBoundary(env)],
            _ => self.unexpected(former, &env),
        }
    }

    pub(super) fn verifier(&self, former: Option<Role>, env: Envelope) -> Directives {
        if former != Some(Role::Server) {
            return self.unexpected(former, &env);
        }
        match self.ctx.crypto.verify_envelope(&env) {
            Ok(true) => {}
            Ok(false) => {
                warn!(payload = env.payload_kind(), "[server/verifier] invalid signature, exiting");
                return vec![Directive::ExitSelf];
            }
            Err(e) => return self.fail(e),
        }

        let generator = match env.payload.as_ref() {
            Some(Payload::Request(request)) => match request.request_type {
                RequestType::BootTicket => ServerState::BootTicketGenerator,
                RequestType::Update => ServerState::UpdateGenerator,
                RequestType::DefTicket => ServerState::DeferralTicketGenerator,
            },
            Some(Payload::MeasuredData(_)) => ServerState::Storage,
            _ => return self.unexpected(former, &env),
        };

        if is_compromised(self.ctx.store.as_ref()) {
            return self.suppress(env);
        }
        debug!(to = %generator, "[server/verifier] verified");
        vec![Directive::send(generator, env)]
    }

    /// Drop traffic from a flagged device without answering.
    fn suppress(&self, env: Envelope) -> Directives {
        let payload = env.payload_kind();
        warn!(payload, "[server/verifier] device flagged compromised, dropping");
        self.mark(HookPoint::RequestSuppressed, &env);

        let mut out = vec![Directive::Publish(ProtocolEvent::RequestSuppressed {
            payload: payload.to_string(),
        })];
        let is_request = matches!(env.payload, Some(Payload::Request(_)));
        if is_request && RunProfile::for_scenario(env.scenario).end_after_suppression {
            out.push(Directive::ShutdownPeer);
        }
        out
    }

    // -------------------------------------------------------------------------
    // Generators
    // -------------------------------------------------------------------------

    pub(super) fn generate_boot_ticket(&self, former: Option<Role>, mut env: Envelope) -> Directives {
        let nonce = match (former, env.payload.as_ref()) {
            (Some(Role::Verifier), Some(Payload::Request(request))) => request.nonce.clone(),
            _ => return self.unexpected(former, &env),
        };
        let ticket = issue_boot_ticket(&nonce, self.now(), &self.ctx.issuance);
        let item = ticket.ticket_ref.clone();
        env.set_payload(Payload::BootTicket(ticket));
        self.keep_audit_copy(&item, &env);
        self.issued(item, env)
    }

    pub(super) fn generate_update(&self, former: Option<Role>, mut env: Envelope) -> Directives {
        match former {
            Some(Role::Verifier | Role::Server) => {}
            _ => return self.unexpected(former, &env),
        }
        let released = match self.ctx.store.read_version(SERVER_SECURE_STORAGE, VERSION_FILE) {
            Ok(version) => version,
            Err(e) => return self.fail(e),
        };
        let update = issue_update(released, self.now());
        let item = update.payload_ref.clone();
        info!(version = update.version, kind = %update.update_kind, "[server/gen_update] update issued");
        env.set_payload(Payload::Update(update));
        self.keep_audit_copy(&item, &env);
        self.issued(item, env)
    }

    pub(super) fn generate_def_ticket(&self, former: Option<Role>, mut env: Envelope) -> Directives {
        let nonce = match (former, env.payload.as_ref()) {
            (Some(Role::Verifier), Some(Payload::Request(request))) => request.nonce.clone(),
            _ => return self.unexpected(former, &env),
        };
        env.set_payload(Payload::DefTicket(issue_def_ticket(
            &nonce,
            self.now(),
            &self.ctx.issuance,
        )));
        self.issued("defticket".to_string(), env)
    }

    fn issued(&self, item: String, env: Envelope) -> Directives {
        debug!(item = %item, "[server/{}] issued", self.state);
        vec![
            Directive::Publish(ProtocolEvent::TicketIssued { item }),
            Directive::send(ServerState::Signer, env),
        ]
    }

    /// Best-effort copy of issued items for later audit.
    fn keep_audit_copy(&self, item: &str, env: &Envelope) {
        let stored = WireDocument::encode(env)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                self.ctx
                    .store
                    .put(SERVER_SECURE_STORAGE, item, &bytes)
                    .map_err(|e| e.to_string())
            });
        if let Err(reason) = stored {
            warn!(item, reason = %reason, "[server/{}] audit copy not written", self.state);
        }
    }

    // -------------------------------------------------------------------------
    // Storage and signing
    // -------------------------------------------------------------------------

    pub(super) fn storage(&self, former: Option<Role>, env: Envelope) -> Directives {
        let data = match (former, env.payload.as_ref()) {
            (Some(Role::Verifier), Some(Payload::MeasuredData(data))) => data.clone(),
            _ => return self.unexpected(former, &env),
        };
        if let Err(e) = append_measurement(self.ctx.store.as_ref(), &data) {
            return self.fail(e);
        }
        self.mark(HookPoint::StorageExited, &env);
        debug!(value = data.value, "[server/storage] measurement stored");

        let mut out = vec![Directive::Publish(ProtocolEvent::MeasurementStored {
            value: data.value,
            timestamp: data.timestamp,
        })];
        if RunProfile::for_scenario(env.scenario).end_after_first_measurement {
            info!("[server/storage] first measurement stored, ending run");
            out.push(Directive::ShutdownPeer);
        }
        out
    }

    pub(super) fn signer(&self, former: Option<Role>, mut env: Envelope) -> Directives {
        match former {
            Some(Role::BootTicketGenerator | Role::UpdateGenerator | Role::DeferralTicketGenerator) => {
                if let Err(e) = self.ctx.crypto.sign_envelope(&mut env) {
                    return self.fail(e);
                }
                vec![Directive::send(ServerState::Ingress, env)]
            }
            _ => self.unexpected(former, &env),
        }
    }
}
