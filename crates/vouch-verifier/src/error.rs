use vouch_core::ErrorKind;
use vouch_crypto::CryptoError;
use vouch_registry::RegistryError;

/// Errors of the issuer helpers and of direct status lookups. Credential and
/// presentation verification never fail; they report through
/// `VerificationResult`.
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl VerifierError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Registry(e) => e.kind(),
            Self::Infrastructure(_) => ErrorKind::InfrastructureError,
            Self::Crypto(_) | Self::InvalidCredential(_) | Self::Serialization(_) => {
                ErrorKind::InvalidArgument
            }
        }
    }
}
