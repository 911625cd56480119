use serde::{Deserialize, Serialize};

pub const INVALID_CREDENTIAL_STRUCTURE: &str = "Invalid credential structure";
pub const CREDENTIAL_EXPIRED: &str = "Credential has expired";
pub const ISSUER_NOT_FOUND: &str = "Issuer DID not found";
pub const CREDENTIAL_REVOKED: &str = "Credential has been revoked or is invalid";
pub const STATUS_UNVERIFIED: &str = "Could not verify credential status";
pub const PROOF_INVALID: &str = "Credential proof is invalid";
pub const PROOF_MISSING: &str = "Credential has no proof";
pub const INVALID_PRESENTATION_STRUCTURE: &str = "Invalid presentation structure";
pub const HOLDER_NOT_RESOLVED: &str = "Could not resolve holder DID";
pub const DISCLOSURE_INVALID: &str = "Selective disclosure is invalid";

/// Outcome of verifying a credential or presentation.
///
/// `errors` invalidate, `warnings` do not. `valid` is true iff `errors` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl VerificationResult {
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Set `valid` from the collected errors.
    pub(crate) fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

/// "<n> of <m> credentials failed verification"
pub(crate) fn failed_credentials(failed: usize, total: usize) -> String {
    format!("{} of {} credentials failed verification", failed, total)
}
