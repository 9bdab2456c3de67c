//! Server states.

use std::fmt;

use awdt_bus::StationKind;
use awdt_types::Role;

/// Every handler of the server role. All are transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerState {
    /// Receives entry envelopes and everything crossing from the device.
    Ingress,
    Verifier,
    BootTicketGenerator,
    UpdateGenerator,
    DeferralTicketGenerator,
    Storage,
    Signer,
}

impl ServerState {
    pub const ALL: [ServerState; 7] = [
        ServerState::Ingress,
        ServerState::Verifier,
        ServerState::BootTicketGenerator,
        ServerState::UpdateGenerator,
        ServerState::DeferralTicketGenerator,
        ServerState::Storage,
        ServerState::Signer,
    ];
}

impl StationKind for ServerState {
    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn ingress() -> Self {
        ServerState::Ingress
    }

    fn is_persistent(&self) -> bool {
        false
    }

    fn role(&self) -> Role {
        match self {
            ServerState::Ingress => Role::Server,
            ServerState::Verifier => Role::Verifier,
            ServerState::BootTicketGenerator => Role::BootTicketGenerator,
            ServerState::UpdateGenerator => Role::UpdateGenerator,
            ServerState::DeferralTicketGenerator => Role::DeferralTicketGenerator,
            ServerState::Storage => Role::Storage,
            ServerState::Signer => Role::Signer,
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_persistent_states() {
        assert!(ServerState::ALL.iter().all(|s| !s.is_persistent()));
        assert_eq!(ServerState::ingress().to_string(), "server");
        assert_eq!(ServerState::DeferralTicketGenerator.to_string(), "gen_defticket");
    }
}
