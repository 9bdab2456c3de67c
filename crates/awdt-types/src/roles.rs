//! # Role Names
//!
//! Closed set of names that may appear in an envelope's history.
//!
//! `Verifier` and `Signer` exist on both sides of the boundary under the same
//! name. A handler always knows which side it runs on, so the shared name
//! never makes a former-role check ambiguous.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A role (state handler or entry label) recorded in an envelope's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    // Entry labels seeded by the coordinator.
    Boot,
    #[serde(rename = "send_update")]
    PushUpdate,

    // Ingress handlers, one per side.
    Device,
    Server,

    // Device states.
    StagingArea,
    Verifier,
    UpdateDownloader,
    #[serde(rename = "awdt_init")]
    AwdtInit,
    #[serde(rename = "awdt_getnonce")]
    AwdtGetNonce,
    #[serde(rename = "awdt_putticket")]
    AwdtPutTicket,
    Timer,
    BusinessLogic,
    Sensor,
    Signer,
    CorePatcher,
    Shutdown,

    // Server states.
    #[serde(rename = "gen_bootticket")]
    BootTicketGenerator,
    #[serde(rename = "gen_update")]
    UpdateGenerator,
    #[serde(rename = "gen_defticket")]
    DeferralTicketGenerator,
    Storage,
}

impl Role {
    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Boot => "boot",
            Role::PushUpdate => "send_update",
            Role::Device => "device",
            Role::Server => "server",
            Role::StagingArea => "staging_area",
            Role::Verifier => "verifier",
            Role::UpdateDownloader => "update_downloader",
            Role::AwdtInit => "awdt_init",
            Role::AwdtGetNonce => "awdt_getnonce",
            Role::AwdtPutTicket => "awdt_putticket",
            Role::Timer => "timer",
            Role::BusinessLogic => "business_logic",
            Role::Sensor => "sensor",
            Role::Signer => "signer",
            Role::CorePatcher => "core_patcher",
            Role::Shutdown => "shutdown",
            Role::BootTicketGenerator => "gen_bootticket",
            Role::UpdateGenerator => "gen_update",
            Role::DeferralTicketGenerator => "gen_defticket",
            Role::Storage => "storage",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
