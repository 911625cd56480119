//! Shared fixtures for the Vouch integration tests.
//!
//! A `Deployment` wires both registries, the local resolvers and a
//! verification engine to one manual clock and one event bus, the way the
//! node does.

use std::sync::Arc;

use vouch_core::{EngineConfig, EventBus, ManualClock};
use vouch_crypto::KeyPair;
use vouch_registry::{
    CredentialStatusRegistry, DidContent, DidRegistry, LocalDidResolver, LocalStatusResolver,
};
use vouch_verifier::{CredentialIssuer, HolderPresenter, VerificationEngine};

/// 2023-11-14T22:13:20Z
pub const GENESIS: u64 = 1_700_000_000;

pub struct Deployment {
    pub clock: Arc<ManualClock>,
    pub events: EventBus,
    pub dids: Arc<DidRegistry>,
    pub statuses: Arc<CredentialStatusRegistry>,
    pub engine: VerificationEngine,
}

impl Deployment {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let clock = Arc::new(ManualClock::new(GENESIS));
        let events = EventBus::default();
        let dids = Arc::new(DidRegistry::new(clock.clone(), events.clone()));
        let statuses = Arc::new(CredentialStatusRegistry::new(clock.clone(), events.clone()));
        let engine = VerificationEngine::new(
            Arc::new(LocalDidResolver::new(dids.clone())),
            Arc::new(LocalStatusResolver::new(statuses.clone())),
            config,
        )
        .with_clock(clock.clone());

        Self {
            clock,
            events,
            dids,
            statuses,
            engine,
        }
    }

    /// Register `did:test:<address>`, controlled by `address`, with a fresh
    /// Ed25519 key. Returns the DID and its signing key.
    pub fn register(&self, address: &str) -> (String, KeyPair) {
        let did = format!("did:test:{}", address);
        let keypair = KeyPair::generate();
        let content = DidContent::with_ed25519_key(&did, &keypair.public_key());
        if let Err(e) = self.dids.create_did(address, &did, content) {
            panic!("registering {} failed: {}", did, e);
        }
        (did, keypair)
    }

    /// Issuer acting for `address`, registering its DID on the way.
    pub fn issuer(&self, address: &str) -> CredentialIssuer {
        let (did, keypair) = self.register(address);
        CredentialIssuer::new(did, address, keypair, self.statuses.clone())
            .with_clock(self.clock.clone())
    }

    /// Holder acting for `address`, registering its DID on the way.
    pub fn holder(&self, address: &str) -> HolderPresenter {
        let (did, keypair) = self.register(address);
        HolderPresenter::new(did, keypair)
    }
}

impl Default for Deployment {
    fn default() -> Self {
        Self::new()
    }
}
