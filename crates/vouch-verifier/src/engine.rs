//! Verification engine.
//!
//! A credential runs through a fixed pipeline and stops at the first error:
//! structure, expiration, issuer resolution, status, proof. Status lookups
//! that cannot be completed degrade to a warning; everything the registries
//! answer definitively is honored. Presentations and batches fan out over
//! the same pipeline and keep input order.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use vouch_core::{Clock, Did, EngineConfig, SystemClock};
use vouch_crypto::hashing::decode_32;
use vouch_crypto::DisclosureProof;
use vouch_registry::{DidDocument, DidResolver, RegistryError, StatusCheck, StatusResolver};

use crate::credential::{issuer_did, parse_proof, CredentialView};
use crate::error::VerifierError;
use crate::proof::{canonical_payload, Ed25519ProofService, ProofService};
use crate::result::{self, VerificationResult};
use crate::retry::retry_read;

pub struct VerificationEngine {
    dids: Arc<dyn DidResolver>,
    statuses: Arc<dyn StatusResolver>,
    proofs: Arc<dyn ProofService>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl VerificationEngine {
    pub fn new(
        dids: Arc<dyn DidResolver>,
        statuses: Arc<dyn StatusResolver>,
        config: EngineConfig,
    ) -> Self {
        Self {
            dids,
            statuses,
            proofs: Arc::new(Ed25519ProofService),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_proof_service(mut self, proofs: Arc<dyn ProofService>) -> Self {
        self.proofs = proofs;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Verify a single credential.
    pub async fn verify_credential(&self, credential: &Value) -> VerificationResult {
        let mut result = VerificationResult {
            credential_id: credential
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string),
            ..Default::default()
        };

        let view = match CredentialView::parse(credential) {
            Ok(view) => view,
            Err(e) => {
                tracing::debug!(error = %e, "credential failed structural check");
                result.error(result::INVALID_CREDENTIAL_STRUCTURE);
                return result.finish();
            }
        };
        result.issuer = view.issuer.clone();

        if view.is_expired_at(self.now()) {
            result.error(result::CREDENTIAL_EXPIRED);
            return result.finish();
        }

        let Some(issuer_id) = view.issuer.as_deref() else {
            tracing::debug!("credential issuer carries no DID");
            result.error(result::ISSUER_NOT_FOUND);
            return result.finish();
        };
        let issuer = match self.resolve(issuer_id).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!(issuer = issuer_id, error = %e, "issuer resolution failed");
                result.error(result::ISSUER_NOT_FOUND);
                return result.finish();
            }
        };

        if let Some(status_id) = &view.status_id {
            match self.status(status_id).await {
                Ok(check) if !check.is_valid => {
                    result.error(result::CREDENTIAL_REVOKED);
                    return result.finish();
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(credential = %status_id, error = %e, "credential status unavailable");
                    result.warn(result::STATUS_UNVERIFIED);
                }
            }
        }

        match &view.proof {
            Some(raw) => {
                if !self.proof_holds(credential, raw, &issuer) {
                    self.proof_failure(&mut result);
                }
            }
            None => result.warn(result::PROOF_MISSING),
        }

        let result = result.finish();
        tracing::debug!(
            credential = ?result.credential_id,
            valid = result.valid,
            warnings = result.warnings.len(),
            "credential verified"
        );
        result
    }

    /// Verify a presentation and every credential embedded in it.
    pub async fn verify_presentation(&self, presentation: &Value) -> VerificationResult {
        let mut result = VerificationResult::default();

        let credentials = match presentation_credentials(presentation) {
            Some(credentials) => credentials,
            None => {
                result.error(result::INVALID_PRESENTATION_STRUCTURE);
                return result.finish();
            }
        };

        let holder = presentation.get("holder").and_then(issuer_did);
        result.holder = holder.map(str::to_string);

        let outcomes = join_all(credentials.iter().map(|vc| self.verify_credential(vc))).await;
        let failed: Vec<&VerificationResult> = outcomes.iter().filter(|r| !r.valid).collect();
        if !failed.is_empty() {
            result.error(result::failed_credentials(failed.len(), outcomes.len()));
            for outcome in &failed {
                result.errors.extend(outcome.errors.iter().cloned());
            }
        }

        let proof = presentation.get("proof").filter(|p| !p.is_null());
        if let (Some(raw), Some(holder)) = (proof, holder) {
            match self.resolve(holder).await {
                Ok(doc) => {
                    if !self.proof_holds(presentation, raw, &doc) {
                        self.proof_failure(&mut result);
                    }
                }
                Err(e) => {
                    tracing::debug!(holder, error = %e, "holder resolution failed");
                    result.warn(result::HOLDER_NOT_RESOLVED);
                }
            }
        }

        let result = result.finish();
        tracing::debug!(
            holder = ?result.holder,
            credentials = outcomes.len(),
            valid = result.valid,
            "presentation verified"
        );
        result
    }

    /// Verify independent credentials. Results follow input order.
    pub async fn verify_batch(&self, credentials: &[Value]) -> Vec<VerificationResult> {
        join_all(credentials.iter().map(|vc| self.verify_credential(vc))).await
    }

    /// Verify a credential together with a selective disclosure of its
    /// committed attributes, signed by the credential subject and bound to
    /// the verifier's `nonce`.
    pub async fn verify_disclosure(
        &self,
        credential: &Value,
        disclosure: &DisclosureProof,
        nonce: &[u8; 32],
    ) -> VerificationResult {
        let mut result = self.verify_credential(credential).await;
        if !result.valid {
            return result;
        }

        if let Err(reason) = self.disclosure_holds(credential, disclosure, nonce).await {
            tracing::debug!(credential = ?result.credential_id, %reason, "selective disclosure rejected");
            result.error(result::DISCLOSURE_INVALID);
        }
        result.finish()
    }

    /// Status of a credential straight from the status registry. Every
    /// failure, including an unknown id, is reported as infrastructure.
    pub async fn check_credential_status(
        &self,
        credential_id: &str,
    ) -> Result<StatusCheck, VerifierError> {
        self.status(credential_id).await.map_err(|e| {
            tracing::warn!(credential = credential_id, error = %e, "status check failed");
            VerifierError::Infrastructure("failed to check credential status".into())
        })
    }

    fn now(&self) -> DateTime<Utc> {
        i64::try_from(self.clock.now())
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    async fn resolve(&self, did: &str) -> Result<DidDocument, RegistryError> {
        self.read("resolve_did", self.config.resolve_timeout(), || {
            self.dids.resolve(did)
        })
        .await
    }

    async fn status(&self, credential_id: &str) -> Result<StatusCheck, RegistryError> {
        self.read("check_status", self.config.status_timeout(), || {
            self.statuses.check_status(credential_id)
        })
        .await
    }

    /// One registry read: every attempt is bounded by `limit`, transient
    /// failures and timeouts are retried with backoff.
    async fn read<T, F, Fut>(
        &self,
        operation: &'static str,
        limit: Duration,
        f: F,
    ) -> Result<T, RegistryError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, RegistryError>>,
    {
        retry_read(
            operation,
            self.config.max_read_retries,
            self.config.retry_base_delay(),
            || {
                let attempt = f();
                async move {
                    tokio::time::timeout(limit, attempt)
                        .await
                        .unwrap_or_else(|_| {
                            Err(RegistryError::Infrastructure(format!(
                                "{} timed out after {:?}",
                                operation, limit
                            )))
                        })
                }
            },
        )
        .await
    }

    /// Check `raw` as a proof over `document` by a key of `signer`.
    fn proof_holds(&self, document: &Value, raw: &Value, signer: &DidDocument) -> bool {
        let Some(proof) = parse_proof(raw) else {
            tracing::debug!(signer = %signer.id, "malformed proof");
            return false;
        };
        match Did::from_url(&proof.verification_method) {
            Ok(did) if did.uri() == signer.id => {}
            _ => {
                tracing::debug!(signer = %signer.id, method = %proof.verification_method, "verification method outside signer DID");
                return false;
            }
        }
        let descriptor = signer
            .find_public_key(&proof.verification_method)
            .or_else(|| signer.primary_public_key());
        let Some(key) = descriptor.and_then(|d| d.public_key().ok()) else {
            tracing::debug!(signer = %signer.id, method = %proof.verification_method, "no usable verification key");
            return false;
        };
        match canonical_payload(document) {
            Ok(payload) => self.proofs.verify(&payload, &proof, &key),
            Err(e) => {
                tracing::debug!(error = %e, "payload canonicalization failed");
                false
            }
        }
    }

    async fn disclosure_holds(
        &self,
        credential: &Value,
        disclosure: &DisclosureProof,
        nonce: &[u8; 32],
    ) -> Result<(), String> {
        let root = credential
            .pointer("/credentialSubject/commitmentRoot")
            .and_then(Value::as_str)
            .ok_or("credential carries no commitment root")?;
        let root = decode_32(root).map_err(|e| e.to_string())?;
        let subject = credential
            .pointer("/credentialSubject/id")
            .and_then(Value::as_str)
            .ok_or("credential names no subject")?;

        match Did::from_url(&disclosure.verification_method) {
            Ok(did) if did.uri() == subject => {}
            _ => {
                return Err(format!(
                    "{} is not a key of subject {}",
                    disclosure.verification_method, subject
                ))
            }
        }
        let holder = self.resolve(subject).await.map_err(|e| e.to_string())?;
        let key = holder
            .find_public_key(&disclosure.verification_method)
            .ok_or_else(|| format!("{} has no key {}", subject, disclosure.verification_method))?
            .public_key()
            .map_err(|e| e.to_string())?;
        disclosure.verify(&root, nonce, &key).map_err(|e| e.to_string())
    }

    fn proof_failure(&self, result: &mut VerificationResult) {
        if self.config.strict_proofs {
            result.error(result::PROOF_INVALID);
        } else {
            result.warn(result::PROOF_INVALID);
        }
    }
}

fn presentation_credentials(presentation: &Value) -> Option<&Vec<Value>> {
    let map = presentation.as_object()?;
    if map.get("@context").map_or(true, Value::is_null) {
        return None;
    }
    map.get("verifiableCredential")?.as_array()
}
