use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// `expires_at` value meaning the credential never expires.
pub const NEVER_EXPIRES: Timestamp = 0;

/// Decentralized Identifier.
/// Format: `did:<method>:<method-specific-id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Did(pub String);

impl Did {
    /// Parse a DID URI, rejecting anything without a method and identifier.
    pub fn parse(uri: impl Into<String>) -> Result<Self, CoreError> {
        let uri = uri.into();
        if !uri.starts_with("did:") {
            return Err(CoreError::InvalidDid(format!(
                "DID must start with 'did:', got: {}",
                uri
            )));
        }
        let parts: Vec<&str> = uri.splitn(3, ':').collect();
        if parts.len() < 3 || parts[1].is_empty() || parts[2].is_empty() {
            return Err(CoreError::InvalidDid(format!(
                "DID must have format 'did:<method>:<identifier>', got: {}",
                uri
            )));
        }
        Ok(Self(uri))
    }

    /// Strip a fragment or query (`did:x:y#keys-1` → `did:x:y`) from a DID URL.
    pub fn from_url(url: &str) -> Result<Self, CoreError> {
        let end = url.find(['#', '?']).unwrap_or(url.len());
        Self::parse(&url[..end])
    }

    /// Get the full DID URI.
    pub fn uri(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
