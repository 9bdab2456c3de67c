//! # Benchmarking Scenarios End To End
//!
//! Each test prepares one scenario, runs the coordinator and checks the
//! sequence of boot cycles plus the protocol events that mark its path:
//!
//! | Scenario | Cycles |
//! |----------|--------|
//! | 1 empty staging | staged-for-reboot, measurement |
//! | 2 invalid ticket | rejected + staged-for-reboot, measurement |
//! | 3 valid ticket | measurement |
//! | 4 deferral | deferral applied |
//! | 5 compromised | suppressed |
//! | 6 invalid update | staged, applied, staged, measurement |
//! | 7 valid update | applied, staged, measurement |
//! | 8 server push | staged, applied, staged, measurement |

#[cfg(test)]
mod tests {
    use awdt_bus::{ProtocolEvent, RejectReason, ResetReason, RunOutcome};
    use awdt_node::{Action, RunReport};
    use awdt_storage::layout::{
        DEVICE_SECURE_STORAGE, MEASURED_DATA_FILE, SERVER_DATA_STORAGE, STAGED_BOOT_TICKET,
        STAGED_UPDATE, STAGING_AREA, VERSION_FILE,
    };
    use awdt_storage::ObjectStore;

    use crate::integration::support::*;

    const STAGED: RunOutcome = RunOutcome::Reset(ResetReason::StagedForReboot);
    const APPLIED: RunOutcome = RunOutcome::Reset(ResetReason::UpdateApplied);

    fn outcomes(report: &RunReport) -> Vec<RunOutcome> {
        report.cycles.iter().map(|c| c.outcome).collect()
    }

    fn measurement_lines(store: &dyn ObjectStore) -> Vec<String> {
        store
            .get_string(SERVER_DATA_STORAGE, MEASURED_DATA_FILE)
            .map(|text| text.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    // =========================================================================
    // BOOT TICKET SCENARIOS
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_scenario_1_empty_staging_requests_ticket_then_runs() {
        let (coordinator, store, mut events) = coordinator(config(ed25519(), Some(1)));

        let report = coordinator.run(Action::Boot).await.unwrap();

        assert_eq!(outcomes(&report), vec![STAGED, RunOutcome::PeerShutdown]);
        let events = events.drain();
        assert_eq!(
            count(&events, |e| matches!(e, ProtocolEvent::ItemStaged { item } if item == "bootticket")),
            1
        );
        assert_eq!(count(&events, |e| matches!(e, ProtocolEvent::BootTicketAccepted { .. })), 1);
        assert!(count(&events, |e| matches!(e, ProtocolEvent::BusinessLogicStarted)) >= 1);

        // Tickets are single use.
        assert!(!store.exists(STAGING_AREA, STAGED_BOOT_TICKET).unwrap());
        let lines = measurement_lines(store.as_ref());
        assert!(!lines.is_empty());
        let (value, timestamp) = lines[0].split_once(';').unwrap();
        assert!((4..=14).contains(&value.parse::<u32>().unwrap()));
        assert!(timestamp.parse::<u64>().unwrap() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_2_invalid_ticket_is_rejected_and_replaced() {
        let (coordinator, store, mut events) = coordinator(config(p256(), Some(2)));

        let report = coordinator.run(Action::Boot).await.unwrap();

        assert_eq!(outcomes(&report), vec![STAGED, RunOutcome::PeerShutdown]);
        let events = events.drain();
        assert!(events.iter().any(|e| matches!(
            e,
            ProtocolEvent::ItemRejected { item, reason: RejectReason::NonceMismatch } if item == "bootticket"
        )));
        assert_eq!(count(&events, |e| matches!(e, ProtocolEvent::BootTicketAccepted { .. })), 1);
        assert!(!measurement_lines(store.as_ref()).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_3_valid_ticket_reaches_business_logic() {
        let (coordinator, store, mut events) = coordinator(config(ml_dsa(), Some(3)));

        let report = coordinator.run(Action::Boot).await.unwrap();

        assert_eq!(outcomes(&report), vec![RunOutcome::PeerShutdown]);
        let events = events.drain();
        assert_eq!(count(&events, |e| matches!(e, ProtocolEvent::WatchdogArmed { .. })), 1);
        assert_eq!(count(&events, |e| matches!(e, ProtocolEvent::ItemRejected { .. })), 0);
        assert!(events.iter().any(|e| matches!(
            e,
            ProtocolEvent::MeasurementStored { value, .. } if (4..=14).contains(value)
        )));
        assert_eq!(measurement_lines(store.as_ref()).len(), 1);
    }

    // =========================================================================
    // LIVENESS SCENARIOS
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_scenario_4_first_deferral_ends_run() {
        let (coordinator, _store, mut events) = coordinator(config(ed25519(), Some(4)));

        let report = coordinator.run(Action::Boot).await.unwrap();

        assert_eq!(outcomes(&report), vec![RunOutcome::DeferralApplied]);
        let events = events.drain();
        let armed = events.iter().find_map(|e| match e {
            ProtocolEvent::WatchdogArmed { deadline } => Some(*deadline),
            _ => None,
        });
        let deferred = events.iter().find_map(|e| match e {
            ProtocolEvent::WatchdogDeferred { deadline } => Some(*deadline),
            _ => None,
        });
        let (armed, deferred) = (armed.unwrap(), deferred.unwrap());
        // Renewal fires after 10 s and grants 25 s from then.
        assert_eq!(deferred, armed + 10);
        assert_eq!(count(&events, |e| matches!(e, ProtocolEvent::WatchdogExpired { .. })), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_5_compromised_device_is_ignored() {
        let (coordinator, store, mut events) = coordinator(config(ed25519(), Some(5)));

        let report = coordinator.run(Action::Boot).await.unwrap();

        assert_eq!(outcomes(&report), vec![RunOutcome::PeerShutdown]);
        let events = events.drain();
        assert!(events.iter().any(|e| matches!(
            e,
            ProtocolEvent::RequestSuppressed { payload } if payload == "request"
        )));
        assert_eq!(count(&events, |e| matches!(e, ProtocolEvent::TicketIssued { .. })), 0);
        assert!(measurement_lines(store.as_ref()).is_empty());
    }

    // =========================================================================
    // UPDATE SCENARIOS
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_scenario_6_stale_update_is_replaced_by_fresh_one() {
        let (coordinator, store, mut events) = coordinator(config(p256(), Some(6)));

        let report = coordinator.run(Action::Boot).await.unwrap();

        assert_eq!(
            outcomes(&report),
            vec![STAGED, APPLIED, STAGED, RunOutcome::PeerShutdown]
        );
        let events = events.drain();
        assert!(events.iter().any(|e| matches!(
            e,
            ProtocolEvent::ItemRejected { item, reason: RejectReason::StaleVersion } if item == "update"
        )));
        assert!(events.iter().any(|e| matches!(e, ProtocolEvent::UpdateApplied { version: 1 })));
        assert_eq!(store.read_version(DEVICE_SECURE_STORAGE, VERSION_FILE).unwrap(), 1);
        assert!(!store.exists(STAGING_AREA, STAGED_UPDATE).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_7_valid_update_is_applied_once() {
        let (coordinator, store, mut events) = coordinator(config(ed25519(), Some(7)));

        let report = coordinator.run(Action::Boot).await.unwrap();

        assert_eq!(outcomes(&report), vec![APPLIED, STAGED, RunOutcome::PeerShutdown]);
        assert_eq!(report.resets(), 2);
        let events = events.drain();
        assert_eq!(count(&events, |e| matches!(e, ProtocolEvent::UpdateApplied { .. })), 1);
        assert_eq!(store.read_version(DEVICE_SECURE_STORAGE, VERSION_FILE).unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_8_server_push_is_staged_then_applied() {
        let (coordinator, store, _events) = coordinator(config(ml_dsa(), Some(8)));

        let report = coordinator.run(Action::PushUpdate).await.unwrap();

        assert_eq!(
            outcomes(&report),
            vec![STAGED, APPLIED, STAGED, RunOutcome::PeerShutdown]
        );
        assert_eq!(report.cycles[0].action, Action::PushUpdate);
        assert!(report.cycles[1..].iter().all(|c| c.action == Action::Boot));
        assert_eq!(store.read_version(DEVICE_SECURE_STORAGE, VERSION_FILE).unwrap(), 1);
        assert_eq!(measurement_lines(store.as_ref()).len(), 1);
    }
}
