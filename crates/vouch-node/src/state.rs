//! Shared state accessible from HTTP handlers.

use std::sync::Arc;
use std::time::Instant;

use vouch_core::{Clock, EngineConfig, EventBus, SystemClock};
use vouch_registry::{CredentialStatusRegistry, DidRegistry, LocalDidResolver, LocalStatusResolver};
use vouch_verifier::VerificationEngine;

use crate::storage::EventStore;

pub struct NodeState {
    pub dids: Arc<DidRegistry>,
    pub statuses: Arc<CredentialStatusRegistry>,
    pub engine: VerificationEngine,
    pub events: EventBus,
    /// Persistent event log. `None` when persistence is disabled.
    pub store: Option<Arc<EventStore>>,
    pub start_time: Instant,
}

impl NodeState {
    pub fn new(engine_config: EngineConfig, events: EventBus, store: Option<Arc<EventStore>>) -> Self {
        Self::with_clock(engine_config, events, store, Arc::new(SystemClock))
    }

    /// Registries and engine share one clock and one event bus.
    pub fn with_clock(
        engine_config: EngineConfig,
        events: EventBus,
        store: Option<Arc<EventStore>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let dids = Arc::new(DidRegistry::new(clock.clone(), events.clone()));
        let statuses = Arc::new(CredentialStatusRegistry::new(clock.clone(), events.clone()));
        let engine = VerificationEngine::new(
            Arc::new(LocalDidResolver::new(dids.clone())),
            Arc::new(LocalStatusResolver::new(statuses.clone())),
            engine_config,
        )
        .with_clock(clock);

        Self {
            dids,
            statuses,
            engine,
            events,
            store,
            start_time: Instant::now(),
        }
    }
}
