//! Server role wiring onto the station runtime.

use std::sync::Arc;

use awdt_bus::{spawn_role, EventPublisher, LinkEnd, RoleHandle, Side};
use awdt_types::Role;
use tracing::info;

use crate::domain::ServerState;
use crate::service::{ServerContext, ServerStations};

/// Start the server role. Inject a `send_update` entry envelope into
/// [`ServerState::Ingress`] to push an update.
pub fn spawn_server(
    ctx: Arc<ServerContext>,
    link: LinkEnd,
    bus: Arc<dyn EventPublisher>,
) -> RoleHandle<ServerState> {
    match ctx.crypto().metadata() {
        Some(meta) => info!(
            family = %meta.family,
            algorithm = meta.algorithm,
            security_level = meta.security_level,
            "[server] crypto provider ready"
        ),
        None => info!("[server] running without signatures"),
    }
    spawn_role(Side::Server, Arc::new(ServerStations::new(ctx)), link, bus)
}

/// Label the coordinator seeds into a pushed-update envelope.
pub const PUSH_UPDATE_LABEL: Role = Role::PushUpdate;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IssuanceConfig;
    use awdt_bus::{boundary_link, BoundaryFrame, InMemoryEventBus};
    use awdt_crypto::{CryptoOrchestrator, CryptoPolicy, KeyOwner};
    use awdt_storage::InMemoryStore;
    use awdt_types::{Addresses, Envelope, Payload, SessionProfile};
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_pushed_update_crosses_to_device() {
        let store = Arc::new(InMemoryStore::new());
        let crypto = CryptoOrchestrator::new(CryptoPolicy::disabled(), KeyOwner::Server, store.clone());
        let ctx = Arc::new(ServerContext::new(IssuanceConfig::default(), store, crypto));
        let (mut device_end, server_end) = boundary_link(8);
        let mut server = spawn_server(ctx, server_end, Arc::new(InMemoryEventBus::new()));

        let profile = SessionProfile {
            crypto_mode: awdt_types::CryptoMode::None,
            variant: awdt_types::SignatureVariant::Unsigned,
            hash_algo: awdt_types::HashAlgorithm::None,
            scenario: None,
        };
        server
            .inject(
                ServerState::Ingress,
                Envelope::entry(PUSH_UPDATE_LABEL, &profile, Addresses::default()),
            )
            .unwrap();

        let frame = timeout(Duration::from_secs(5), device_end.recv())
            .await
            .unwrap()
            .unwrap();
        let BoundaryFrame::Parcel(parcel) = frame else {
            panic!("expected a parcel");
        };
        assert!(matches!(parcel.open().unwrap().payload, Some(Payload::Update(_))));

        device_end.send(BoundaryFrame::Shutdown).await.unwrap();
        let outcome = timeout(Duration::from_secs(5), server.wait()).await.unwrap();
        assert_eq!(outcome, awdt_bus::RunOutcome::PeerShutdown);
    }
}
