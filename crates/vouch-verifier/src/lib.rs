//! Vouch Verifier
//!
//! Turns the registries into a judgment on credentials and presentations:
//! - Proof service: Ed25519 proofs over canonical JSON payloads
//! - Credential issuer and holder helpers that produce signed documents
//! - Verification engine: structure, expiry, issuer resolution, status and
//!   proof checks folded into a `VerificationResult`

pub mod credential;
pub mod engine;
pub mod error;
pub mod issuer;
pub mod proof;
pub mod result;
mod retry;

pub use engine::VerificationEngine;
pub use error::VerifierError;
pub use issuer::{CredentialIssuer, CredentialRequest, HolderPresenter};
pub use proof::{canonical_payload, Ed25519ProofService, Proof, ProofService};
pub use result::VerificationResult;
