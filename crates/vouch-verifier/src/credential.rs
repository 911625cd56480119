//! Read access to the JSON shapes of credentials and presentations.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::VerifierError;
use crate::proof::Proof;

pub const CREDENTIALS_CONTEXT_V1: &str = "https://www.w3.org/2018/credentials/v1";
pub const VERIFIABLE_CREDENTIAL: &str = "VerifiableCredential";
pub const VERIFIABLE_PRESENTATION: &str = "VerifiablePresentation";
pub const STATUS_REGISTRY_TYPE: &str = "VouchStatusRegistry";

/// Fields of a credential the engine needs, pulled out once.
#[derive(Debug, Clone)]
pub struct CredentialView {
    pub id: Option<String>,
    /// `None` when the issuer is neither a DID string nor an object with an `id`.
    pub issuer: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
    pub status_id: Option<String>,
    pub proof: Option<Value>,
}

impl CredentialView {
    /// Structural check: `@context`, `type` and `issuer` present,
    /// `expirationDate` RFC 3339. An issuer without a usable DID is left for
    /// issuer resolution to reject.
    pub fn parse(credential: &Value) -> Result<Self, VerifierError> {
        let map = credential
            .as_object()
            .ok_or_else(|| invalid("credential must be a JSON object"))?;

        for field in ["@context", "type", "issuer"] {
            if map.get(field).map_or(true, Value::is_null) {
                return Err(invalid(&format!("missing {}", field)));
            }
        }

        let issuer = issuer_did(&map["issuer"]).map(str::to_string);

        let expiration = match map.get("expirationDate") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(parse_date(raw)?),
        };

        let status_id = map
            .get("credentialStatus")
            .and_then(|status| status.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            id: map.get("id").and_then(Value::as_str).map(str::to_string),
            issuer,
            expiration,
            status_id,
            proof: map.get("proof").filter(|p| !p.is_null()).cloned(),
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|exp| exp < now)
    }
}

/// The issuer DID of a credential: a plain string or `{ "id": ... }`.
pub fn issuer_did(issuer: &Value) -> Option<&str> {
    match issuer {
        Value::String(did) if !did.is_empty() => Some(did),
        Value::Object(map) => map.get("id").and_then(Value::as_str).filter(|id| !id.is_empty()),
        _ => None,
    }
}

/// Decode an embedded proof. Malformed proofs surface as `None`.
pub fn parse_proof(raw: &Value) -> Option<Proof> {
    serde_json::from_value(raw.clone()).ok()
}

fn parse_date(raw: &Value) -> Result<DateTime<Utc>, VerifierError> {
    let text = raw
        .as_str()
        .ok_or_else(|| invalid("expirationDate must be a string"))?;
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| invalid(&format!("expirationDate {}: {}", text, e)))
}

fn invalid(reason: &str) -> VerifierError {
    VerifierError::InvalidCredential(reason.to_string())
}
