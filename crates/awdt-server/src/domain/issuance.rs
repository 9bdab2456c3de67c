//! # Issuance
//!
//! Builders for what the server hands out. Tickets echo the nonce of the
//! request they answer; updates carry the server's release version plus one.

use awdt_types::{BootTicket, DefTicket, Timestamp, Update};
use rand::seq::SliceRandom;

/// Update kinds the server rolls out.
pub const UPDATE_KINDS: [&str; 5] = [
    "LZ_updatedownloader_update",
    "LZ_cpatcher_update",
    "business_logic_update",
    "config_update",
    "LZ_core_update",
];

/// Issuance parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuanceConfig {
    /// Watchdog budget granted by a boot ticket.
    pub counter_init_seconds: u64,
    /// Extension granted by a deferral ticket.
    pub deferral_seconds: u64,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            counter_init_seconds: 25,
            deferral_seconds: 25,
        }
    }
}

#[must_use]
pub fn issue_boot_ticket(nonce: &str, now: Timestamp, config: &IssuanceConfig) -> BootTicket {
    BootTicket {
        ticket_ref: format!("bootticket_{now}"),
        nonce: nonce.to_string(),
        issued_at: now,
        counter_init_seconds: config.counter_init_seconds,
    }
}

#[must_use]
pub fn issue_def_ticket(nonce: &str, now: Timestamp, config: &IssuanceConfig) -> DefTicket {
    DefTicket {
        nonce: nonce.to_string(),
        deferral_seconds: config.deferral_seconds,
        issued_at: now,
    }
}

/// Update one version above `released`, of a randomly picked kind.
#[must_use]
pub fn issue_update(released: u64, now: Timestamp) -> Update {
    let kind = UPDATE_KINDS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(UPDATE_KINDS[0]);
    Update {
        update_kind: kind.to_string(),
        payload_ref: format!("update_{now}"),
        version: released.saturating_add(1),
        issued_at: now,
    }
}
