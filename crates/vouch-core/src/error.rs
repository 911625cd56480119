use std::fmt;

use crate::credential_state::CredentialStatus;
use crate::types::Timestamp;

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid DID format: {0}")]
    InvalidDid(String),
}

/// A write was rejected because of the current state of the record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("credential is already {status}")]
    NoOp { status: CredentialStatus },

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: CredentialStatus,
        to: CredentialStatus,
    },

    #[error("credential {id} expired at {expires_at} and can no longer change status")]
    Expired { id: String, expires_at: Timestamp },

    #[error("cannot remove the last controller of {did}")]
    LastController { did: String },
}

/// Error taxonomy shared by every registry operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Malformed or empty input.
    InvalidArgument,
    /// Duplicate identifier.
    AlreadyExists,
    /// Unknown DID or credential.
    NotFound,
    /// Caller is not a controller / issuer.
    Unauthorized,
    /// No-op transition, invalid source state, expired credential, last controller.
    StateError,
    /// Backing store or transport unreachable. Safe to retry on reads only.
    InfrastructureError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "InvalidArgument"),
            Self::AlreadyExists => write!(f, "AlreadyExists"),
            Self::NotFound => write!(f, "NotFound"),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::StateError => write!(f, "StateError"),
            Self::InfrastructureError => write!(f, "InfrastructureError"),
        }
    }
}
