use std::fmt;

use crate::error::StateError;

/// Lifecycle status of a credential as tracked by the status registry.
///
/// `Expired` exists for wire compatibility only. Expiry is evaluated lazily
/// from `expires_at` and is never stored as a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CredentialStatus {
    /// Credential is in good standing.
    Active,
    /// Credential has been permanently revoked. Final state.
    Revoked,
    /// Credential is temporarily suspended.
    Suspended,
    /// Credential has expired.
    Expired,
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Revoked => write!(f, "Revoked"),
            Self::Suspended => write!(f, "Suspended"),
            Self::Expired => write!(f, "Expired"),
        }
    }
}

/// Validates status changes requested by an issuer.
///
/// Valid transitions:
/// - Active → Revoked
/// - Active → Suspended
/// - Suspended → Active
/// - Suspended → Revoked
///
/// `Revoked` is terminal and `Expired` is never an explicit target.
pub struct CredentialStateMachine;

impl CredentialStateMachine {
    /// Attempt a transition to `target`.
    /// Returns the new status on success.
    pub fn transition(
        current: CredentialStatus,
        target: CredentialStatus,
    ) -> Result<CredentialStatus, StateError> {
        if current == target {
            return Err(StateError::NoOp { status: current });
        }

        match (current, target) {
            (CredentialStatus::Active, CredentialStatus::Revoked)
            | (CredentialStatus::Active, CredentialStatus::Suspended)
            | (CredentialStatus::Suspended, CredentialStatus::Active)
            | (CredentialStatus::Suspended, CredentialStatus::Revoked) => {}
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current,
                    to: target,
                })
            }
        }

        tracing::debug!(
            from = %current,
            to = %target,
            "credential status transition"
        );

        Ok(target)
    }
}
