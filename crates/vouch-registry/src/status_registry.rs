use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use vouch_core::{
    AuditEvent, AuditEventKind, Clock, CredentialStateMachine, CredentialStatus, EventBus,
    StateError, SystemClock, Timestamp, NEVER_EXPIRES,
};

use crate::error::RegistryError;

const ISSUED_REASON: &str = "issued";

/// One entry of the append-only status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub status: CredentialStatus,
    pub timestamp: Timestamp,
    pub actor: String,
    pub reason: String,
}

/// Full status record of a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub credential_id: String,
    pub issuer: String,
    /// Stored status. Never `Expired`; expiry is computed on read.
    pub status: CredentialStatus,
    pub issued_at: Timestamp,
    pub updated_at: Timestamp,
    /// 0 means the credential never expires.
    pub expires_at: Timestamp,
    pub reason: String,
    pub history: Vec<StatusHistoryEntry>,
}

impl StatusRecord {
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at != NEVER_EXPIRES && now > self.expires_at
    }

    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.status == CredentialStatus::Active && !self.is_expired_at(now)
    }
}

/// Result of `check_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCheck {
    pub status: CredentialStatus,
    pub is_valid: bool,
    pub expires_at: Timestamp,
}

/// Result of `batch_check_status`: parallel arrays in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStatus {
    pub statuses: Vec<CredentialStatus>,
    pub valid: Vec<bool>,
}

/// Which operation requested a status change. Decides the audit event and
/// the extra precondition of reactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusChange {
    Update,
    Revoke,
    Suspend,
    Reactivate,
}

impl StatusChange {
    fn event(
        self,
        previous: CredentialStatus,
        status: CredentialStatus,
        reason: &str,
    ) -> AuditEventKind {
        let reason = reason.to_string();
        match self {
            Self::Update => AuditEventKind::CredentialStatusUpdated {
                previous,
                status,
                reason,
            },
            Self::Revoke => AuditEventKind::CredentialRevoked { reason },
            Self::Suspend => AuditEventKind::CredentialSuspended { reason },
            Self::Reactivate => AuditEventKind::CredentialReactivated { reason },
        }
    }
}

/// Per-credential lifecycle registry. Only the issuer of a credential may
/// change its status; records are never deleted and history only grows.
pub struct CredentialStatusRegistry {
    records: DashMap<String, StatusRecord>,
    /// issuer → credential ids in issuance order
    by_issuer: DashMap<String, Vec<String>>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl CredentialStatusRegistry {
    pub fn new(clock: Arc<dyn Clock>, events: EventBus) -> Self {
        Self {
            records: DashMap::new(),
            by_issuer: DashMap::new(),
            clock,
            events,
        }
    }

    /// Register a credential as `Active`. The caller becomes its issuer.
    /// `expires_at` may lie in the past; such a credential is simply never valid.
    pub fn issue_credential(
        &self,
        caller: &str,
        id: &str,
        expires_at: Timestamp,
    ) -> Result<StatusRecord, RegistryError> {
        if id.trim().is_empty() {
            return Err(RegistryError::InvalidArgument(
                "credential id must not be empty".into(),
            ));
        }
        if caller.trim().is_empty() {
            return Err(RegistryError::InvalidArgument(
                "caller must not be empty".into(),
            ));
        }

        let now = self.clock.now();
        let record = match self.records.entry(id.to_string()) {
            Entry::Occupied(_) => return Err(RegistryError::AlreadyExists(id.to_string())),
            Entry::Vacant(slot) => {
                let record = StatusRecord {
                    credential_id: id.to_string(),
                    issuer: caller.to_string(),
                    status: CredentialStatus::Active,
                    issued_at: now,
                    updated_at: now,
                    expires_at,
                    reason: String::new(),
                    history: vec![StatusHistoryEntry {
                        status: CredentialStatus::Active,
                        timestamp: now,
                        actor: caller.to_string(),
                        reason: ISSUED_REASON.to_string(),
                    }],
                };
                self.by_issuer
                    .entry(caller.to_string())
                    .or_default()
                    .push(id.to_string());
                let _guard = slot.insert(record.clone());
                tracing::info!(credential = %id, issuer = caller, expires_at, "credential issued");
                self.events.publish(AuditEvent::new(
                    AuditEventKind::CredentialIssued { expires_at },
                    id,
                    caller,
                    now,
                ));
                record
            }
        };
        Ok(record)
    }

    /// Move a credential to `status`, subject to the lifecycle rules.
    pub fn update_status(
        &self,
        caller: &str,
        id: &str,
        status: CredentialStatus,
        reason: &str,
    ) -> Result<StatusRecord, RegistryError> {
        self.change_status(caller, id, status, reason, StatusChange::Update)
    }

    pub fn revoke_credential(
        &self,
        caller: &str,
        id: &str,
        reason: &str,
    ) -> Result<StatusRecord, RegistryError> {
        self.change_status(caller, id, CredentialStatus::Revoked, reason, StatusChange::Revoke)
    }

    pub fn suspend_credential(
        &self,
        caller: &str,
        id: &str,
        reason: &str,
    ) -> Result<StatusRecord, RegistryError> {
        self.change_status(
            caller,
            id,
            CredentialStatus::Suspended,
            reason,
            StatusChange::Suspend,
        )
    }

    /// Bring a suspended credential back to `Active`. Fails for any other
    /// current status.
    pub fn reactivate_credential(
        &self,
        caller: &str,
        id: &str,
        reason: &str,
    ) -> Result<StatusRecord, RegistryError> {
        self.change_status(
            caller,
            id,
            CredentialStatus::Active,
            reason,
            StatusChange::Reactivate,
        )
    }

    /// Current status and validity. Expiry is evaluated against the clock.
    pub fn check_status(&self, id: &str) -> Result<StatusCheck, RegistryError> {
        let record = self
            .records
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let check = StatusCheck {
            status: record.status,
            is_valid: record.is_valid_at(self.clock.now()),
            expires_at: record.expires_at,
        };
        tracing::debug!(credential = %id, status = %check.status, valid = check.is_valid, "status checked");
        Ok(check)
    }

    /// Statuses of many credentials in input order. Unknown ids read as
    /// revoked and invalid.
    pub fn batch_check_status(&self, ids: &[String]) -> BatchStatus {
        let now = self.clock.now();
        let mut batch = BatchStatus {
            statuses: Vec::with_capacity(ids.len()),
            valid: Vec::with_capacity(ids.len()),
        };
        for id in ids {
            match self.records.get(id) {
                Some(record) => {
                    batch.statuses.push(record.status);
                    batch.valid.push(record.is_valid_at(now));
                }
                None => {
                    batch.statuses.push(CredentialStatus::Revoked);
                    batch.valid.push(false);
                }
            }
        }
        batch
    }

    /// Full history, oldest first. Empty for unknown ids.
    pub fn get_status_history(&self, id: &str) -> Vec<StatusHistoryEntry> {
        self.records
            .get(id)
            .map(|record| record.history.clone())
            .unwrap_or_default()
    }

    /// Every credential id issued by `issuer`, in issuance order.
    pub fn get_credentials_by_issuer(&self, issuer: &str) -> Vec<String> {
        self.by_issuer
            .get(issuer)
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    pub fn get_record(&self, id: &str) -> Option<StatusRecord> {
        self.records.get(id).map(|record| record.clone())
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn change_status(
        &self,
        caller: &str,
        id: &str,
        target: CredentialStatus,
        reason: &str,
        change: StatusChange,
    ) -> Result<StatusRecord, RegistryError> {
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        if record.issuer != caller {
            tracing::warn!(credential = %id, caller, "rejected status change from non-issuer");
            return Err(RegistryError::unauthorized(caller, id));
        }

        let previous = record.status;
        if change == StatusChange::Reactivate && previous != CredentialStatus::Suspended {
            return Err(StateError::InvalidTransition {
                from: previous,
                to: target,
            }
            .into());
        }
        if previous == target {
            return Err(StateError::NoOp { status: previous }.into());
        }

        let now = self.clock.now();
        if record.is_expired_at(now) {
            return Err(StateError::Expired {
                id: id.to_string(),
                expires_at: record.expires_at,
            }
            .into());
        }

        let status = CredentialStateMachine::transition(previous, target)?;
        record.status = status;
        record.updated_at = now;
        record.reason = reason.to_string();
        record.history.push(StatusHistoryEntry {
            status,
            timestamp: now,
            actor: caller.to_string(),
            reason: reason.to_string(),
        });

        tracing::info!(
            credential = %id,
            caller,
            from = %previous,
            to = %status,
            reason,
            "credential status changed"
        );
        // Published under the entry guard: event order is commit order.
        self.events
            .publish(AuditEvent::new(change.event(previous, status, reason), id, caller, now));
        Ok(record.clone())
    }
}

impl Default for CredentialStatusRegistry {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), EventBus::default())
    }
}
