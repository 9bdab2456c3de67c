//! Cross-role integration tests and their shared fixtures.

pub mod properties;
pub mod scenarios;

#[cfg(test)]
pub(crate) mod support {
    use std::sync::Arc;

    use awdt_bus::{EventFilter, EventSubscriber, ProtocolEvent, Subscription};
    use awdt_crypto::CryptoPolicy;
    use awdt_node::{config::scenario, Coordinator, NodeConfig};
    use awdt_storage::{InMemoryStore, ObjectStore};
    use awdt_types::{CryptoMode, HashAlgorithm, SignatureVariant};

    pub fn ed25519() -> CryptoPolicy {
        CryptoPolicy::new(CryptoMode::Classical, SignatureVariant::Ed25519, HashAlgorithm::None).unwrap()
    }

    pub fn p256() -> CryptoPolicy {
        CryptoPolicy::new(CryptoMode::Classical, SignatureVariant::Secp256r1, HashAlgorithm::Sha256).unwrap()
    }

    pub fn ml_dsa() -> CryptoPolicy {
        CryptoPolicy::new(CryptoMode::PostQuantum, SignatureVariant::MlDsa44, HashAlgorithm::None).unwrap()
    }

    pub fn config(policy: CryptoPolicy, id: Option<u8>) -> NodeConfig {
        let mut config = NodeConfig::default();
        config.crypto = policy;
        config.storage.in_memory = true;
        config.run.scenario = id.map(|id| scenario(id).unwrap());
        config
    }

    /// Coordinator over a fresh in-memory store, plus a subscription that
    /// sees every event of its runs.
    pub fn coordinator(config: NodeConfig) -> (Coordinator, Arc<InMemoryStore>, Subscription) {
        let store = Arc::new(InMemoryStore::new());
        let shared: Arc<dyn ObjectStore> = store.clone();
        let coordinator = Coordinator::new(config, shared);
        let events = coordinator.events().subscribe(EventFilter::all());
        (coordinator, store, events)
    }

    pub fn count(events: &[ProtocolEvent], predicate: impl Fn(&ProtocolEvent) -> bool) -> usize {
        events.iter().filter(|e| predicate(e)).count()
    }
}
