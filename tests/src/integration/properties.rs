//! # Protocol Properties
//!
//! Cross-role guarantees checked on full runs:
//!
//! - only a ticket answering the device's latest challenge is accepted
//! - tampered or foreign-scheme items never pass verification
//! - an installed update version is never accepted again
//! - a device the server stops answering resets at its deadline
//! - disabled crypto skips freshness and version checks
//! - a file-backed store keeps the same layout on disk

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use awdt_bus::{ProtocolEvent, RejectReason, ResetReason, RunOutcome};
    use awdt_crypto::{CryptoOrchestrator, CryptoPolicy, KeyOwner};
    use awdt_device::OsEntropy;
    use awdt_node::{ensure_keys, Action, Coordinator, NodeConfig, ScenarioSetup};
    use awdt_server::set_compromised;
    use awdt_storage::layout::{
        DEVICE_SECURE_STORAGE, MEASURED_DATA_FILE, NONCE_FILE, SERVER_DATA_STORAGE,
        STAGED_BOOT_TICKET, STAGED_UPDATE, STAGING_AREA, VERSION_FILE,
    };
    use awdt_storage::{InMemoryStore, ObjectStore};
    use awdt_types::{Addresses, Payload, WireDocument};

    use crate::integration::support::*;

    /// Arrange scenario `id` by hand so a test can alter the result before
    /// the coordinator runs.
    fn prepare(store: &Arc<InMemoryStore>, config: &NodeConfig, id: u8) {
        ensure_keys(store.as_ref(), &config.crypto).unwrap();
        let shared: Arc<dyn ObjectStore> = store.clone();
        let server = CryptoOrchestrator::new(config.crypto, KeyOwner::Server, shared);
        ScenarioSetup {
            store: store.as_ref(),
            server: &server,
            entropy: &OsEntropy,
            profile: config.session_profile(),
            issuance: config.protocol.issuance(),
            now: 1_700_000_000,
        }
        .prepare(awdt_node::config::scenario(id).unwrap())
        .unwrap();
    }

    /// Run settings that leave the staging area as the test arranged it.
    fn manual(policy: CryptoPolicy, id: Option<u8>, reboots: u32) -> NodeConfig {
        let mut config = config(policy, id);
        config.run.prepare_scenario = false;
        config.run.reboots = reboots;
        config
    }

    fn rejected(events: &[ProtocolEvent], wanted: RejectReason) -> bool {
        events
            .iter()
            .any(|e| matches!(e, ProtocolEvent::ItemRejected { reason, .. } if *reason == wanted))
    }

    // =========================================================================
    // FRESHNESS
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_accepted_ticket_consumes_its_challenge() {
        let (coordinator, store, mut events) = coordinator(config(ed25519(), Some(1)));

        coordinator.run(Action::Boot).await.unwrap();

        let accepted: Vec<String> = events
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                ProtocolEvent::BootTicketAccepted { nonce } => Some(nonce),
                _ => None,
            })
            .collect();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].len(), 64);
        // No renewal ran before the first measurement ended the run.
        let recorded = store.get_string(DEVICE_SECURE_STORAGE, NONCE_FILE).unwrap();
        assert!(recorded.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tampered_ticket_is_rejected() {
        let config = manual(p256(), Some(3), 1);
        let (coordinator, store, mut events) = coordinator(config.clone());
        prepare(&store, &config, 3);

        let bytes = store.get(STAGING_AREA, STAGED_BOOT_TICKET).unwrap();
        let mut staged = WireDocument::decode(&bytes, Addresses::default()).unwrap();
        let Some(Payload::BootTicket(ticket)) = staged.payload.as_mut() else {
            panic!("expected a staged boot ticket");
        };
        ticket.counter_init_seconds = 3_600;
        store
            .put(STAGING_AREA, STAGED_BOOT_TICKET, &WireDocument::encode(&staged).unwrap())
            .unwrap();

        let report = coordinator.run(Action::Boot).await.unwrap();

        let events = events.drain();
        assert!(rejected(&events, RejectReason::InvalidSignature));
        assert_eq!(report.cycles[0].outcome, RunOutcome::Reset(ResetReason::StagedForReboot));
        assert_eq!(report.outcome(), RunOutcome::PeerShutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticket_from_another_scheme_is_rejected() {
        let config = manual(p256(), Some(3), 1);
        let (coordinator, store, mut events) = coordinator(config.clone());
        // Staged and signed under Ed25519, verified under P-256.
        prepare(&store, &manual(ed25519(), Some(3), 1), 3);

        let report = coordinator.run(Action::Boot).await.unwrap();

        let events = events.drain();
        assert!(rejected(&events, RejectReason::InvalidSignature));
        assert_eq!(report.outcome(), RunOutcome::PeerShutdown);
    }

    // =========================================================================
    // MONOTONIC VERSIONS
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_installed_update_is_not_accepted_twice() {
        let config = manual(ed25519(), Some(7), 0);
        let (coordinator, store, mut events) = coordinator(config.clone());
        prepare(&store, &config, 7);
        let captured = store.get(STAGING_AREA, STAGED_UPDATE).unwrap();

        let first = coordinator.run(Action::Boot).await.unwrap();
        assert_eq!(first.outcome(), RunOutcome::Reset(ResetReason::UpdateApplied));
        assert_eq!(store.read_version(DEVICE_SECURE_STORAGE, VERSION_FILE).unwrap(), 1);
        events.drain();

        // Replay the update that was just installed.
        store.put(STAGING_AREA, STAGED_UPDATE, &captured).unwrap();
        let second = coordinator.run(Action::Boot).await.unwrap();

        let events = events.drain();
        assert!(rejected(&events, RejectReason::StaleVersion));
        assert!(!events.iter().any(|e| matches!(e, ProtocolEvent::UpdateApplied { .. })));
        assert_eq!(second.outcome(), RunOutcome::Reset(ResetReason::StagedForReboot));
        assert_eq!(store.read_version(DEVICE_SECURE_STORAGE, VERSION_FILE).unwrap(), 1);
    }

    // =========================================================================
    // WATCHDOG
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_device_resets_at_deadline() {
        // No scenario: nothing but the watchdog may end the run.
        let config = manual(ed25519(), None, 0);
        let (coordinator, store, mut events) = coordinator(config.clone());
        prepare(&store, &manual(ed25519(), None, 0), 3);
        set_compromised(store.as_ref(), true).unwrap();

        let report = coordinator.run(Action::Boot).await.unwrap();

        assert_eq!(report.outcome(), RunOutcome::Reset(ResetReason::WatchdogExpired));
        let events = events.drain();
        let armed = events.iter().find_map(|e| match e {
            ProtocolEvent::WatchdogArmed { deadline } => Some(*deadline),
            _ => None,
        });
        let expired = events.iter().find_map(|e| match e {
            ProtocolEvent::WatchdogExpired { deadline, now } => Some((*deadline, *now)),
            _ => None,
        });
        let (deadline, now) = expired.unwrap();
        assert_eq!(Some(deadline), armed);
        assert!(now > deadline);
        assert!(now <= deadline + 2, "expiry noticed within one poll interval");
        assert!(events.iter().any(|e| matches!(e, ProtocolEvent::RequestSuppressed { .. })));
        assert!(!events.iter().any(|e| matches!(e, ProtocolEvent::WatchdogDeferred { .. })));
    }

    // =========================================================================
    // DISABLED CRYPTO
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_disabled_crypto_accepts_stale_ticket() {
        let (coordinator, _store, mut events) = coordinator(config(CryptoPolicy::disabled(), Some(2)));

        let report = coordinator.run(Action::Boot).await.unwrap();

        assert_eq!(report.cycles.len(), 1);
        assert_eq!(report.outcome(), RunOutcome::PeerShutdown);
        assert!(!events
            .drain()
            .iter()
            .any(|e| matches!(e, ProtocolEvent::ItemRejected { .. })));
    }

    // =========================================================================
    // FILE-BACKED STORE
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_file_store_run_writes_expected_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(ed25519(), Some(3));
        config.storage.in_memory = false;
        config.storage.base_dir = dir.path().join("memory");

        let coordinator = Coordinator::open(config).unwrap();
        let report = coordinator.run(Action::Boot).await.unwrap();

        assert_eq!(report.outcome(), RunOutcome::PeerShutdown);
        let base = dir.path().join("memory");
        let measured =
            std::fs::read_to_string(base.join(SERVER_DATA_STORAGE).join(MEASURED_DATA_FILE)).unwrap();
        assert_eq!(measured.lines().count(), 1);
        assert!(base.join(DEVICE_SECURE_STORAGE).join(NONCE_FILE).is_file());
        assert!(base.join(DEVICE_SECURE_STORAGE).join("device_priv_key.ed25519").is_file());
        assert!(!base.join(STAGING_AREA).join(STAGED_BOOT_TICKET).exists());
    }
}
