//! Integration test: issuer → registries → holder → verifier.
//!
//! Exercises vouch-registry, vouch-verifier and vouch-crypto together over a
//! shared clock and event bus.

use serde_json::json;
use vouch_core::{AuditEventKind, CredentialStatus, EngineConfig, StateError};
use vouch_crypto::presentation_nonce;
use vouch_integration_tests::{Deployment, GENESIS};
use vouch_registry::{DidContent, RegistryError};
use vouch_verifier::result::{
    CREDENTIAL_EXPIRED, CREDENTIAL_REVOKED, DISCLOSURE_INVALID, HOLDER_NOT_RESOLVED,
    ISSUER_NOT_FOUND, PROOF_INVALID,
};
use vouch_verifier::{CredentialRequest, HolderPresenter};

// =========================================================================
// Revocation
// =========================================================================

#[tokio::test]
async fn test_revoked_credential_fails_verification() {
    let deployment = Deployment::new();
    let issuer = deployment.issuer("0xA");

    let vc = issuer
        .issue(CredentialRequest::new(json!({ "id": "did:test:0xB" })).with_id("cred:1"))
        .expect("issuance should succeed");

    let before = deployment.engine.verify_credential(&vc).await;
    assert!(before.valid, "{:?}", before);

    deployment
        .statuses
        .revoke_credential("0xA", "cred:1", "key leaked")
        .expect("issuer may revoke");

    let after = deployment.engine.verify_credential(&vc).await;
    let summary = json!({ "valid": after.valid, "errors": after.errors });
    assert_eq!(
        summary,
        json!({ "valid": false, "errors": ["Credential has been revoked or is invalid"] })
    );
    assert!(after.warnings.is_empty());

    let record = deployment.statuses.get_record("cred:1").unwrap();
    assert_eq!(record.status, CredentialStatus::Revoked);
    assert_eq!(record.reason, "key leaked");
}

#[tokio::test]
async fn test_only_the_issuing_address_can_revoke() {
    let deployment = Deployment::new();
    let issuer = deployment.issuer("0xA");
    issuer
        .issue(CredentialRequest::new(json!({})).with_id("cred:1"))
        .unwrap();

    // Becoming a controller of the issuer DID does not confer revocation rights
    deployment
        .dids
        .add_controller("0xA", "did:test:0xA", "0xB")
        .unwrap();
    let err = deployment
        .statuses
        .revoke_credential("0xB", "cred:1", "hostile")
        .unwrap_err();
    assert!(matches!(err, RegistryError::Unauthorized { .. }));
    assert_eq!(deployment.statuses.get_status_history("cred:1").len(), 1);
}

#[tokio::test]
async fn test_suspension_round_trip() {
    let deployment = Deployment::new();
    let issuer = deployment.issuer("0xA");
    let vc = issuer
        .issue(CredentialRequest::new(json!({})).with_id("cred:1"))
        .unwrap();

    deployment
        .statuses
        .suspend_credential("0xA", "cred:1", "under review")
        .unwrap();
    let suspended = deployment.engine.verify_credential(&vc).await;
    assert_eq!(suspended.errors, vec![CREDENTIAL_REVOKED]);

    deployment
        .statuses
        .reactivate_credential("0xA", "cred:1", "cleared")
        .unwrap();
    assert!(deployment.engine.verify_credential(&vc).await.valid);

    let history: Vec<CredentialStatus> = deployment
        .statuses
        .get_status_history("cred:1")
        .into_iter()
        .map(|entry| entry.status)
        .collect();
    assert_eq!(
        history,
        vec![
            CredentialStatus::Active,
            CredentialStatus::Suspended,
            CredentialStatus::Active
        ]
    );
}

// =========================================================================
// Expiry and issuer lifecycle
// =========================================================================

#[tokio::test]
async fn test_expiry_is_evaluated_lazily() {
    let deployment = Deployment::new();
    let issuer = deployment.issuer("0xA");
    let vc = issuer
        .issue(
            CredentialRequest::new(json!({}))
                .with_id("cred:short")
                .expires_at(GENESIS + 60),
        )
        .unwrap();
    assert!(deployment.engine.verify_credential(&vc).await.valid);

    deployment.clock.advance(61);

    let result = deployment.engine.verify_credential(&vc).await;
    assert_eq!(result.errors, vec![CREDENTIAL_EXPIRED]);

    // The stored status never changes on its own; validity does
    let check = deployment.statuses.check_status("cred:short").unwrap();
    assert_eq!(check.status, CredentialStatus::Active);
    assert!(!check.is_valid);
    assert_eq!(check.expires_at, GENESIS + 60);

    let err = deployment
        .statuses
        .revoke_credential("0xA", "cred:short", "too late")
        .unwrap_err();
    assert!(matches!(err, RegistryError::State(StateError::Expired { .. })));
}

#[tokio::test]
async fn test_deactivated_issuer_invalidates_credentials() {
    let deployment = Deployment::new();
    let issuer = deployment.issuer("0xA");
    let vc = issuer
        .issue(CredentialRequest::new(json!({})).with_id("cred:1"))
        .unwrap();

    deployment.dids.deactivate_did("0xA", "did:test:0xA").unwrap();

    let result = deployment.engine.verify_credential(&vc).await;
    assert_eq!(result.errors, vec![ISSUER_NOT_FOUND]);
    assert!(deployment.dids.did_exists("did:test:0xA"));
}

#[tokio::test]
async fn test_key_rotation_invalidates_old_signatures() {
    let deployment = Deployment::new();
    let issuer = deployment.issuer("0xA");
    let vc = issuer
        .issue(CredentialRequest::new(json!({})).with_id("cred:1"))
        .unwrap();

    let rotated = vouch_crypto::KeyPair::generate();
    deployment
        .dids
        .update_did(
            "0xA",
            "did:test:0xA",
            DidContent::with_ed25519_key("did:test:0xA", &rotated.public_key()),
        )
        .unwrap();

    let strict = deployment.engine.verify_credential(&vc).await;
    assert_eq!(strict.errors, vec![PROOF_INVALID]);

    let lenient = Deployment::with_config(EngineConfig {
        strict_proofs: false,
        ..Default::default()
    });
    let issuer = lenient.issuer("0xA");
    let vc = issuer
        .issue(CredentialRequest::new(json!({})).with_id("cred:1"))
        .unwrap();
    lenient
        .dids
        .update_did(
            "0xA",
            "did:test:0xA",
            DidContent::with_ed25519_key("did:test:0xA", &rotated.public_key()),
        )
        .unwrap();
    let result = lenient.engine.verify_credential(&vc).await;
    assert!(result.valid);
    assert_eq!(result.warnings, vec![PROOF_INVALID]);
}

// =========================================================================
// Presentations and batches
// =========================================================================

#[tokio::test]
async fn test_presentation_reports_failed_credentials() {
    let deployment = Deployment::new();
    let issuer = deployment.issuer("0xA");
    let holder = deployment.holder("0xB");

    let good = issuer
        .issue(CredentialRequest::new(json!({ "id": holder.did() })).with_id("cred:good"))
        .unwrap();
    let bad = issuer
        .issue(CredentialRequest::new(json!({ "id": holder.did() })).with_id("cred:bad"))
        .unwrap();
    deployment
        .statuses
        .revoke_credential("0xA", "cred:bad", "superseded")
        .unwrap();

    let vp = holder.present(vec![good.clone()]).unwrap();
    let result = deployment.engine.verify_presentation(&vp).await;
    assert!(result.valid, "{:?}", result);
    assert_eq!(result.holder.as_deref(), Some("did:test:0xB"));

    let vp = holder.present(vec![good, bad]).unwrap();
    let result = deployment.engine.verify_presentation(&vp).await;
    assert!(!result.valid);
    assert_eq!(
        result.errors,
        vec![
            "1 of 2 credentials failed verification".to_string(),
            CREDENTIAL_REVOKED.to_string()
        ]
    );
}

#[tokio::test]
async fn test_presentation_from_unregistered_holder() {
    let deployment = Deployment::new();
    let issuer = deployment.issuer("0xA");
    let vc = issuer
        .issue(CredentialRequest::new(json!({})).with_id("cred:1"))
        .unwrap();

    let stranger = HolderPresenter::new("did:test:0xC", vouch_crypto::KeyPair::generate());
    let vp = stranger.present(vec![vc]).unwrap();

    let result = deployment.engine.verify_presentation(&vp).await;
    assert!(result.valid);
    assert_eq!(result.warnings, vec![HOLDER_NOT_RESOLVED]);
}

#[tokio::test]
async fn test_batch_results_follow_input_order() {
    let deployment = Deployment::new();
    let issuer = deployment.issuer("0xA");

    let credentials: Vec<_> = (0..5)
        .map(|i| {
            issuer
                .issue(CredentialRequest::new(json!({})).with_id(format!("cred:{}", i)))
                .unwrap()
        })
        .collect();
    deployment
        .statuses
        .revoke_credential("0xA", "cred:3", "lost")
        .unwrap();

    let results = deployment.engine.verify_batch(&credentials).await;
    let ids: Vec<_> = results
        .iter()
        .map(|r| r.credential_id.clone().unwrap())
        .collect();
    assert_eq!(ids, vec!["cred:0", "cred:1", "cred:2", "cred:3", "cred:4"]);
    let valid: Vec<bool> = results.iter().map(|r| r.valid).collect();
    assert_eq!(valid, vec![true, true, true, false, true]);

    let batch = deployment.statuses.batch_check_status(&[
        "cred:3".to_string(),
        "cred:4".to_string(),
        "cred:missing".to_string(),
    ]);
    assert_eq!(
        batch.statuses,
        vec![
            CredentialStatus::Revoked,
            CredentialStatus::Active,
            CredentialStatus::Revoked
        ]
    );
    assert_eq!(batch.valid, vec![false, true, false]);
}

// =========================================================================
// Selective disclosure
// =========================================================================

#[tokio::test]
async fn test_selective_disclosure_flow() {
    let deployment = Deployment::new();
    let issuer = deployment.issuer("0xA");
    let holder = deployment.holder("0xB");

    let (vc, attributes) = issuer
        .issue_selective(
            CredentialRequest::new(serde_json::Value::Null)
                .with_id("cred:kyc")
                .with_type("KycCredential"),
            "did:test:0xB",
            &[("country", "BR"), ("date_of_birth", "1995-03-15"), ("kyc_level", "3")],
        )
        .unwrap();

    // Verifier asks for the country only, with a fresh nonce
    let nonce = presentation_nonce();
    let proof = holder.disclose(&attributes, &["country"], &nonce).unwrap();
    assert_eq!(proof.revealed["country"].value, "BR");
    assert_eq!(proof.hidden_commitments.len(), 2);

    let result = deployment.engine.verify_disclosure(&vc, &proof, &nonce).await;
    assert!(result.valid, "{:?}", result);

    let mut lied = proof.clone();
    lied.revealed.get_mut("country").unwrap().value = "US".into();
    let result = deployment.engine.verify_disclosure(&vc, &lied, &nonce).await;
    assert_eq!(result.errors, vec![DISCLOSURE_INVALID]);

    // A captured disclosure cannot answer another verifier's request
    let second_request = presentation_nonce();
    let mut replayed = proof.clone();
    replayed.nonce = hex::encode(second_request);
    let result = deployment
        .engine
        .verify_disclosure(&vc, &replayed, &second_request)
        .await;
    assert_eq!(result.errors, vec![DISCLOSURE_INVALID]);

    deployment
        .statuses
        .revoke_credential("0xA", "cred:kyc", "kyc expired")
        .unwrap();
    let result = deployment.engine.verify_disclosure(&vc, &proof, &nonce).await;
    assert_eq!(result.errors, vec![CREDENTIAL_REVOKED]);
}

// =========================================================================
// Audit trail
// =========================================================================

#[tokio::test]
async fn test_every_successful_write_emits_one_event() {
    let deployment = Deployment::new();
    let mut rx = deployment.events.subscribe();

    let issuer = deployment.issuer("0xA");
    issuer
        .issue(CredentialRequest::new(json!({})).with_id("cred:1"))
        .unwrap();
    deployment
        .statuses
        .suspend_credential("0xA", "cred:1", "review")
        .unwrap();
    // Rejected writes leave no trace
    assert!(deployment
        .statuses
        .suspend_credential("0xA", "cred:1", "again")
        .is_err());
    assert!(deployment
        .statuses
        .revoke_credential("0xB", "cred:1", "hostile")
        .is_err());
    deployment
        .statuses
        .revoke_credential("0xA", "cred:1", "fraud")
        .unwrap();

    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        names.push(event.kind.name());
        if let AuditEventKind::CredentialRevoked { reason } = &event.kind {
            assert_eq!(reason, "fraud");
            assert_eq!(event.actor, "0xA");
            assert_eq!(event.subject, "cred:1");
        }
    }
    assert_eq!(
        names,
        vec![
            AuditEventKind::DidCreated.name(),
            AuditEventKind::CredentialIssued { expires_at: 0 }.name(),
            AuditEventKind::CredentialSuspended {
                reason: String::new()
            }
            .name(),
            AuditEventKind::CredentialRevoked {
                reason: String::new()
            }
            .name(),
        ]
    );
}
