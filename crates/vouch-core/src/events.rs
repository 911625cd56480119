//! Audit events published by registry writes for off-chain indexers.
//!
//! Every committed write publishes exactly one event. Failed writes publish
//! nothing. Delivery to subscribers is best effort: a lagging subscriber
//! loses the oldest events, the registry itself never blocks on it.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::credential_state::CredentialStatus;
use crate::types::Timestamp;

/// Default number of events buffered per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuditEventKind {
    DidCreated,
    DidUpdated,
    DidDeactivated,
    ControllerAdded { controller: String },
    ControllerRemoved { controller: String },
    CredentialIssued { expires_at: Timestamp },
    CredentialStatusUpdated {
        previous: CredentialStatus,
        status: CredentialStatus,
        reason: String,
    },
    CredentialRevoked { reason: String },
    CredentialSuspended { reason: String },
    CredentialReactivated { reason: String },
}

impl AuditEventKind {
    /// Event name as indexed off-chain.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DidCreated => "DIDCreated",
            Self::DidUpdated => "DIDUpdated",
            Self::DidDeactivated => "DIDDeactivated",
            Self::ControllerAdded { .. } => "ControllerAdded",
            Self::ControllerRemoved { .. } => "ControllerRemoved",
            Self::CredentialIssued { .. } => "CredentialIssued",
            Self::CredentialStatusUpdated { .. } => "CredentialStatusUpdated",
            Self::CredentialRevoked { .. } => "CredentialRevoked",
            Self::CredentialSuspended { .. } => "CredentialSuspended",
            Self::CredentialReactivated { .. } => "CredentialReactivated",
        }
    }
}

/// A single audit record: identifier, actor and timestamp of a committed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique, time-ordered event id.
    pub id: Uuid,
    pub kind: AuditEventKind,
    /// DID or credential id the write applied to.
    pub subject: String,
    /// Identity that performed the write.
    pub actor: String,
    pub timestamp: Timestamp,
}

impl AuditEvent {
    pub fn new(
        kind: AuditEventKind,
        subject: impl Into<String>,
        actor: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            subject: subject.into(),
            actor: actor.into(),
            timestamp,
        }
    }
}

/// In-process broadcast bus for audit events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AuditEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: AuditEvent) {
        tracing::debug!(
            event = event.kind.name(),
            subject = %event.subject,
            actor = %event.actor,
            "audit event"
        );
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
