//! Device states.

use std::fmt;

use awdt_bus::StationKind;
use awdt_types::Role;

/// Every handler of the device role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceState {
    /// Receives entry envelopes and everything crossing from the server.
    Ingress,
    Boot,
    StagingArea,
    Verifier,
    UpdateDownloader,
    AwdtInit,
    AwdtGetNonce,
    AwdtPutTicket,
    Timer,
    BusinessLogic,
    Sensor,
    Signer,
    CorePatcher,
    Shutdown,
}

impl DeviceState {
    pub const ALL: [DeviceState; 14] = [
        DeviceState::Ingress,
        DeviceState::Boot,
        DeviceState::StagingArea,
        DeviceState::Verifier,
        DeviceState::UpdateDownloader,
        DeviceState::AwdtInit,
        DeviceState::AwdtGetNonce,
        DeviceState::AwdtPutTicket,
        DeviceState::Timer,
        DeviceState::BusinessLogic,
        DeviceState::Sensor,
        DeviceState::Signer,
        DeviceState::CorePatcher,
        DeviceState::Shutdown,
    ];
}

impl StationKind for DeviceState {
    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn ingress() -> Self {
        DeviceState::Ingress
    }

    /// Timer, sensor and business logic keep memory across wakeups.
    fn is_persistent(&self) -> bool {
        matches!(
            self,
            DeviceState::Timer | DeviceState::BusinessLogic | DeviceState::Sensor
        )
    }

    fn role(&self) -> Role {
        match self {
            DeviceState::Ingress => Role::Device,
            DeviceState::Boot => Role::Boot,
            DeviceState::StagingArea => Role::StagingArea,
            DeviceState::Verifier => Role::Verifier,
            DeviceState::UpdateDownloader => Role::UpdateDownloader,
            DeviceState::AwdtInit => Role::AwdtInit,
            DeviceState::AwdtGetNonce => Role::AwdtGetNonce,
            DeviceState::AwdtPutTicket => Role::AwdtPutTicket,
            DeviceState::Timer => Role::Timer,
            DeviceState::BusinessLogic => Role::BusinessLogic,
            DeviceState::Sensor => Role::Sensor,
            DeviceState::Signer => Role::Signer,
            DeviceState::CorePatcher => Role::CorePatcher,
            DeviceState::Shutdown => Role::Shutdown,
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_are_unique() {
        let mut roles: Vec<Role> = DeviceState::ALL.iter().map(StationKind::role).collect();
        roles.sort_by_key(|r| r.as_str());
        roles.dedup();
        assert_eq!(roles.len(), DeviceState::ALL.len());
    }

    #[test]
    fn test_persistent_states() {
        let persistent: Vec<_> = DeviceState::ALL
            .iter()
            .filter(|s| s.is_persistent())
            .collect();
        assert_eq!(persistent.len(), 3);
        assert_eq!(DeviceState::ingress().role(), Role::Device);
    }
}
