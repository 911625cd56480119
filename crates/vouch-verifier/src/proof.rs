//! Document proofs.
//!
//! The signed payload is the canonical JSON of the document without its
//! `proof` member: object keys sorted, no insignificant whitespace.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vouch_crypto::{sign, verify, KeyPair, PublicKey, Signature};

use crate::error::VerifierError;

pub const ED25519_SIGNATURE_2020: &str = "Ed25519Signature2020";
pub const ASSERTION_METHOD: &str = "assertionMethod";

/// Proof attached to a credential or presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: String,
    /// Key used, e.g. `did:test:0xA#keys-1`.
    pub verification_method: String,
    pub proof_purpose: String,
    /// Hex-encoded signature.
    pub proof_value: String,
}

/// Signs payloads and checks proofs against a public key.
pub trait ProofService: Send + Sync {
    fn sign(&self, payload: &[u8], key: &KeyPair, verification_method: &str) -> Proof;

    fn verify(&self, payload: &[u8], proof: &Proof, key: &PublicKey) -> bool;
}

/// Ed25519 proofs with hex signatures.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519ProofService;

impl ProofService for Ed25519ProofService {
    fn sign(&self, payload: &[u8], key: &KeyPair, verification_method: &str) -> Proof {
        Proof {
            proof_type: ED25519_SIGNATURE_2020.to_string(),
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            verification_method: verification_method.to_string(),
            proof_purpose: ASSERTION_METHOD.to_string(),
            proof_value: sign(payload, key).to_hex(),
        }
    }

    fn verify(&self, payload: &[u8], proof: &Proof, key: &PublicKey) -> bool {
        if proof.proof_type != ED25519_SIGNATURE_2020 {
            tracing::debug!(proof_type = %proof.proof_type, "unsupported proof type");
            return false;
        }
        match Signature::from_hex(&proof.proof_value) {
            Ok(signature) => verify(payload, &signature, key).is_ok(),
            Err(e) => {
                tracing::debug!(error = %e, "malformed proof value");
                false
            }
        }
    }
}

/// Canonical signing payload of a JSON document, `proof` excluded.
pub fn canonical_payload(document: &Value) -> Result<Vec<u8>, VerifierError> {
    let mut unsigned = document.clone();
    if let Some(map) = unsigned.as_object_mut() {
        map.remove("proof");
    }
    // serde_json's default map is ordered by key at every level
    Ok(serde_json::to_vec(&unsigned)?)
}

/// Sign `document` in place, replacing any existing proof.
pub fn attach_proof(
    service: &dyn ProofService,
    document: &mut Value,
    key: &KeyPair,
    verification_method: &str,
) -> Result<Proof, VerifierError> {
    let payload = canonical_payload(document)?;
    let proof = service.sign(&payload, key, verification_method);
    let map = document.as_object_mut().ok_or_else(|| {
        VerifierError::InvalidCredential("document must be a JSON object".into())
    })?;
    map.insert("proof".to_string(), serde_json::to_value(&proof)?);
    Ok(proof)
}
