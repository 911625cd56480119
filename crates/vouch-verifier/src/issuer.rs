use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use uuid::Uuid;
use vouch_core::{Clock, SystemClock, Timestamp, NEVER_EXPIRES};
use vouch_crypto::{DisclosureProof, KeyPair, SelectiveDisclosure};
use vouch_registry::CredentialStatusRegistry;

use crate::credential::{
    CREDENTIALS_CONTEXT_V1, STATUS_REGISTRY_TYPE, VERIFIABLE_CREDENTIAL, VERIFIABLE_PRESENTATION,
};
use crate::error::VerifierError;
use crate::proof::{attach_proof, Ed25519ProofService, ProofService};

/// What to put into a new credential.
#[derive(Debug, Clone)]
pub struct CredentialRequest {
    /// Credential id. Generated as `urn:uuid:<v7>` when absent.
    pub id: Option<String>,
    /// Types besides `VerifiableCredential`.
    pub types: Vec<String>,
    pub subject: Value,
    /// Unix seconds. `None` never expires.
    pub expires_at: Option<Timestamp>,
}

impl CredentialRequest {
    pub fn new(subject: Value) -> Self {
        Self {
            id: None,
            types: Vec::new(),
            subject,
            expires_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_type(mut self, credential_type: impl Into<String>) -> Self {
        self.types.push(credential_type.into());
        self
    }

    pub fn expires_at(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Issues signed credentials and registers their status.
///
/// The status record is owned by `address`, the identity that controls the
/// issuer DID, so later revocation has to come from the same identity.
pub struct CredentialIssuer {
    did: String,
    address: String,
    keypair: KeyPair,
    key_id: String,
    status_registry: Arc<CredentialStatusRegistry>,
    proofs: Arc<dyn ProofService>,
    clock: Arc<dyn Clock>,
}

impl CredentialIssuer {
    pub fn new(
        did: impl Into<String>,
        address: impl Into<String>,
        keypair: KeyPair,
        status_registry: Arc<CredentialStatusRegistry>,
    ) -> Self {
        let did = did.into();
        Self {
            key_id: format!("{}#keys-1", did),
            did,
            address: address.into(),
            keypair,
            status_registry,
            proofs: Arc::new(Ed25519ProofService),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = key_id.into();
        self
    }

    pub fn with_proof_service(mut self, proofs: Arc<dyn ProofService>) -> Self {
        self.proofs = proofs;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    /// Build, sign and register a credential.
    pub fn issue(&self, request: CredentialRequest) -> Result<Value, VerifierError> {
        let id = request
            .id
            .unwrap_or_else(|| format!("urn:uuid:{}", Uuid::now_v7()));
        if id.trim().is_empty() {
            return Err(VerifierError::InvalidCredential(
                "credential id must not be empty".into(),
            ));
        }

        let mut types = vec![VERIFIABLE_CREDENTIAL.to_string()];
        types.extend(
            request
                .types
                .into_iter()
                .filter(|t| t != VERIFIABLE_CREDENTIAL),
        );

        let issuance_date = rfc3339(self.clock.now())?;
        let mut credential = json!({
            "@context": [CREDENTIALS_CONTEXT_V1],
            "id": id,
            "type": types,
            "issuer": self.did,
            "issuanceDate": issuance_date,
            "credentialSubject": request.subject,
            "credentialStatus": { "id": id, "type": STATUS_REGISTRY_TYPE },
        });
        if let Some(expires_at) = request.expires_at {
            credential["expirationDate"] = Value::String(rfc3339(expires_at)?);
        }

        attach_proof(self.proofs.as_ref(), &mut credential, &self.keypair, &self.key_id)?;
        self.status_registry.issue_credential(
            &self.address,
            &id,
            request.expires_at.unwrap_or(NEVER_EXPIRES),
        )?;

        tracing::info!(issuer = %self.did, credential_id = %id, "credential signed and registered");
        Ok(credential)
    }

    /// Issue a credential whose subject carries only a commitment root over
    /// `attributes`. The returned disclosure state goes to the holder.
    pub fn issue_selective(
        &self,
        request: CredentialRequest,
        subject_id: &str,
        attributes: &[(&str, &str)],
    ) -> Result<(Value, SelectiveDisclosure), VerifierError> {
        let mut disclosure = SelectiveDisclosure::new();
        for (name, value) in attributes {
            disclosure.add_attribute(*name, *value);
        }

        let request = CredentialRequest {
            subject: json!({
                "id": subject_id,
                "commitmentRoot": hex::encode(disclosure.commitment_root()),
            }),
            ..request
        };
        Ok((self.issue(request)?, disclosure))
    }
}

/// Wraps credentials into presentations signed by the holder.
pub struct HolderPresenter {
    did: String,
    keypair: KeyPair,
    key_id: String,
    proofs: Arc<dyn ProofService>,
}

impl HolderPresenter {
    pub fn new(did: impl Into<String>, keypair: KeyPair) -> Self {
        let did = did.into();
        Self {
            key_id: format!("{}#keys-1", did),
            did,
            keypair,
            proofs: Arc::new(Ed25519ProofService),
        }
    }

    pub fn with_proof_service(mut self, proofs: Arc<dyn ProofService>) -> Self {
        self.proofs = proofs;
        self
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    pub fn present(&self, credentials: Vec<Value>) -> Result<Value, VerifierError> {
        let mut presentation = json!({
            "@context": [CREDENTIALS_CONTEXT_V1],
            "type": [VERIFIABLE_PRESENTATION],
            "holder": self.did,
            "verifiableCredential": credentials,
        });
        attach_proof(self.proofs.as_ref(), &mut presentation, &self.keypair, &self.key_id)?;
        Ok(presentation)
    }

    /// Reveal `reveal` out of the attributes of a selective credential,
    /// signed for the verifier request identified by `nonce`.
    pub fn disclose(
        &self,
        attributes: &SelectiveDisclosure,
        reveal: &[&str],
        nonce: &[u8; 32],
    ) -> Result<DisclosureProof, VerifierError> {
        Ok(attributes.disclose(reveal, nonce, &self.keypair, &self.key_id)?)
    }
}

fn rfc3339(ts: Timestamp) -> Result<String, VerifierError> {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .ok_or_else(|| VerifierError::InvalidCredential(format!("timestamp out of range: {}", ts)))
}
