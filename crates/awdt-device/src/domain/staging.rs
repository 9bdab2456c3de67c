//! # Staging Area Reconciliation
//!
//! Items from the server are staged first and verified on the next boot, so
//! a reset between receipt and verification loses nothing.
//!
//! On boot the highest-priority staged item is loaded:
//!
//! 1. `update`
//! 2. `bootticket`
//!
//! Anything that cannot be listed, read or decoded, or whose payload does not
//! match its key, counts as absent. Reconciliation never fails.

use awdt_storage::layout::{STAGED_BOOT_TICKET, STAGED_UPDATE, STAGING_AREA};
use awdt_storage::ObjectStore;
use awdt_types::{Addresses, Envelope, Payload, WireDocument};
use tracing::warn;

/// Outcome of inspecting the staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// A staged item to verify. `staged` is the envelope as it was received.
    Pending { key: &'static str, staged: Envelope },
    /// Nothing usable is staged.
    Empty,
}

/// Inspect the staging area.
///
/// A corrupt item is removed (best-effort) so the next boot does not trip over
/// it again.
pub fn reconcile(store: &dyn ObjectStore, addresses: &Addresses) -> Reconciled {
    let keys = match store.list(STAGING_AREA) {
        Ok(keys) => keys,
        Err(e) => {
            warn!(error = %e, "[device/staging_area] staging area unreadable, treating as empty");
            return Reconciled::Empty;
        }
    };

    let Some(key) = [STAGED_UPDATE, STAGED_BOOT_TICKET]
        .into_iter()
        .find(|wanted| keys.iter().any(|k| k == wanted))
    else {
        return Reconciled::Empty;
    };

    match load(store, key, addresses) {
        Ok(staged) => Reconciled::Pending { key, staged },
        Err(reason) => {
            warn!(key, reason = %reason, "[device/staging_area] staged item is corrupt, discarding");
            if let Err(e) = store.delete(STAGING_AREA, key) {
                warn!(key, error = %e, "[device/staging_area] corrupt item could not be removed");
            }
            Reconciled::Empty
        }
    }
}

fn load(store: &dyn ObjectStore, key: &str, addresses: &Addresses) -> Result<Envelope, String> {
    let bytes = store.get(STAGING_AREA, key).map_err(|e| e.to_string())?;
    let staged = WireDocument::decode(&bytes, addresses.clone()).map_err(|e| e.to_string())?;
    let matches_key = matches!(
        (key, &staged.payload),
        (STAGED_UPDATE, Some(Payload::Update(_))) | (STAGED_BOOT_TICKET, Some(Payload::BootTicket(_)))
    );
    if matches_key {
        Ok(staged)
    } else {
        Err(format!("payload {} stored under {key}", staged.payload_kind()))
    }
}

/// Staging key for a received payload, if it is stageable.
#[must_use]
pub fn staging_key(payload: Option<&Payload>) -> Option<&'static str> {
    match payload {
        Some(Payload::Update(_)) => Some(STAGED_UPDATE),
        Some(Payload::BootTicket(_)) => Some(STAGED_BOOT_TICKET),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awdt_storage::InMemoryStore;
    use awdt_types::{BootTicket, Role, SessionProfile, Update};

    fn staged(payload: Payload) -> Vec<u8> {
        let mut env = Envelope::entry(Role::Server, &SessionProfile::default(), Addresses::default());
        env.set_payload(payload);
        env.signature = "abcd".into();
        WireDocument::encode(&env).unwrap()
    }

    fn ticket() -> Payload {
        Payload::BootTicket(BootTicket {
            ticket_ref: "bootticket_1".into(),
            nonce: "abc".into(),
            issued_at: 1,
            counter_init_seconds: 25,
        })
    }

    fn update() -> Payload {
        Payload::Update(Update {
            update_kind: "config_update".into(),
            payload_ref: "update_1".into(),
            version: 1,
            issued_at: 1,
        })
    }

    #[test]
    fn test_empty_staging() {
        let store = InMemoryStore::new();
        assert_eq!(reconcile(&store, &Addresses::default()), Reconciled::Empty);
    }

    #[test]
    fn test_update_has_priority() {
        let store = InMemoryStore::new();
        store.put(STAGING_AREA, STAGED_BOOT_TICKET, &staged(ticket())).unwrap();
        store.put(STAGING_AREA, STAGED_UPDATE, &staged(update())).unwrap();

        let Reconciled::Pending { key, staged } = reconcile(&store, &Addresses::default()) else {
            panic!("expected a pending item");
        };
        assert_eq!(key, STAGED_UPDATE);
        assert_eq!(staged.payload, Some(update()));
        assert_eq!(staged.signature, "abcd");
    }

    #[test]
    fn test_corrupt_item_is_absent_and_removed() {
        let store = InMemoryStore::new();
        store.put(STAGING_AREA, STAGED_BOOT_TICKET, b"{ not json").unwrap();

        assert_eq!(reconcile(&store, &Addresses::default()), Reconciled::Empty);
        assert!(!store.exists(STAGING_AREA, STAGED_BOOT_TICKET).unwrap());
    }

    #[test]
    fn test_payload_under_wrong_key_is_corrupt() {
        let store = InMemoryStore::new();
        store.put(STAGING_AREA, STAGED_UPDATE, &staged(ticket())).unwrap();
        assert_eq!(reconcile(&store, &Addresses::default()), Reconciled::Empty);
    }

    #[test]
    fn test_unrelated_files_are_ignored() {
        let store = InMemoryStore::new();
        store.put(STAGING_AREA, "notes.txt", b"hello").unwrap();
        assert_eq!(reconcile(&store, &Addresses::default()), Reconciled::Empty);
        assert!(store.exists(STAGING_AREA, "notes.txt").unwrap());
    }

    #[test]
    fn test_staging_key() {
        assert_eq!(staging_key(Some(&update())), Some(STAGED_UPDATE));
        assert_eq!(staging_key(Some(&ticket())), Some(STAGED_BOOT_TICKET));
        assert_eq!(staging_key(None), None);
    }
}
