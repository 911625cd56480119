//! The Vouch node orchestrator.
//!
//! Opens the event log, builds the registries and verification engine,
//! persists audit events in a background task and serves the HTTP API.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use vouch_core::{AuditEvent, EventBus};

use crate::config::VouchConfig;
use crate::state::NodeState;
use crate::storage::EventStore;

pub struct VouchNode {
    config: VouchConfig,
    /// Shared state, set by `start`.
    node_state: Option<Arc<NodeState>>,
    /// Background event writer, set by `start` when persistence is enabled.
    event_writer: Option<JoinHandle<()>>,
}

impl VouchNode {
    pub fn new(config: VouchConfig) -> Self {
        Self {
            config,
            node_state: None,
            event_writer: None,
        }
    }

    /// Open storage, build shared state and start the event writer.
    pub fn start(&mut self) -> Result<()> {
        tracing::info!("starting Vouch node");

        let events = EventBus::new(self.config.events.capacity);

        let store = if self.config.storage.persist_events {
            let path = self.config.events_path();
            let store = Arc::new(EventStore::open(&path)?);
            tracing::info!(path = %path.display(), "event log opened");
            self.event_writer = Some(spawn_event_writer(events.subscribe(), store.clone()));
            Some(store)
        } else {
            tracing::info!("event persistence disabled");
            None
        };

        let state = NodeState::new(self.config.engine.clone(), events, store);
        self.node_state = Some(Arc::new(state));
        Ok(())
    }

    /// Serve the HTTP API until `shutdown` resolves.
    pub async fn run(
        &self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let state = self
            .node_state
            .clone()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;
        let addr = self.config.api_addr()?;
        crate::api::start_api_server(addr, state, shutdown).await
    }

    /// Drop shared state so the event bus closes, then wait for the writer
    /// to drain.
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("shutting down Vouch node");
        self.node_state = None;
        if let Some(writer) = self.event_writer.take() {
            writer.await?;
        }
        Ok(())
    }
}

fn spawn_event_writer(
    mut rx: broadcast::Receiver<AuditEvent>,
    store: Arc<EventStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(e) = store.append(&event) {
                        tracing::error!(error = %e, subject = %event.subject, "failed to persist audit event");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(missed = n, "event writer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("event bus closed");
                    break;
                }
            }
        }
    })
}
