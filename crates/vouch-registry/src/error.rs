use vouch_core::{ErrorKind, StateError};

/// Registry operation errors. Writes fail atomically: an error leaves no
/// partial state and publishes no event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{caller} is not authorized to modify {target}")]
    Unauthorized { caller: String, target: String },

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::State(_) => ErrorKind::StateError,
            Self::Infrastructure(_) => ErrorKind::InfrastructureError,
        }
    }

    /// Only infrastructure failures are transient. Callers must still only
    /// retry idempotent reads.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Infrastructure(_))
    }

    pub(crate) fn unauthorized(caller: &str, target: &str) -> Self {
        Self::Unauthorized {
            caller: caller.to_string(),
            target: target.to_string(),
        }
    }
}
