//! Selective disclosure of credential attributes.
//!
//! The holder keeps every attribute value with its commitment nonce. The
//! issuer signs the commitment root. To present, the holder reveals a subset
//! (value + nonce), hands over only the commitments of the rest and signs
//! the whole disclosure together with the verifier's presentation nonce. The
//! verifier checks that signature, rebuilds every commitment, recomputes the
//! root over all of them sorted by attribute name and compares it with the
//! signed root.

use std::collections::BTreeMap;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::hashing::{commitment_root, decode_32, Commitment, Hash};
use crate::keys::{KeyPair, PublicKey};
use crate::signing::{sign, verify, Signature};

const DISCLOSURE_DOMAIN: &[u8] = b"vouch-disclosure-v1";

/// Holder-side attribute set with per-attribute nonces.
#[derive(Debug, Clone, Default)]
pub struct SelectiveDisclosure {
    attributes: BTreeMap<String, (String, [u8; 32], Commitment)>,
}

/// A revealed attribute as sent to the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedAttribute {
    pub value: String,
    /// Hex-encoded commitment nonce.
    pub nonce: String,
}

/// What a selective-disclosure presentation must contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclosureProof {
    /// Attribute name → revealed value and nonce.
    pub revealed: BTreeMap<String, RevealedAttribute>,
    /// Attribute name → hex commitment of every hidden attribute.
    pub hidden_commitments: BTreeMap<String, String>,
    /// Hex root over all commitments, sorted by attribute name.
    pub commitment_root: String,
    /// Hex presentation nonce binding the disclosure to one verifier request.
    pub nonce: String,
    /// DID URL of the holder key that signed the disclosure.
    pub verification_method: String,
    /// Hex Ed25519 signature of the holder over the disclosure digest.
    pub signature: String,
}

impl SelectiveDisclosure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit to an attribute value, replacing any previous value.
    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> Commitment {
        let name = name.into();
        let value = value.into();
        let (commitment, nonce) = Commitment::commit(&name, value.as_bytes());
        self.attributes.insert(name, (value, nonce, commitment));
        commitment
    }

    pub fn commitment_for(&self, name: &str) -> Option<Commitment> {
        self.attributes.get(name).map(|(_, _, c)| *c)
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Root the issuer signs over.
    pub fn commitment_root(&self) -> Hash {
        let leaves: Vec<(&str, Commitment)> = self
            .attributes
            .iter()
            .map(|(name, (_, _, c))| (name.as_str(), *c))
            .collect();
        commitment_root(&leaves)
    }

    /// Build a disclosure revealing exactly `reveal`, bound to
    /// `presentation_nonce` and signed by `holder` under `verification_method`.
    pub fn disclose(
        &self,
        reveal: &[&str],
        presentation_nonce: &[u8; 32],
        holder: &KeyPair,
        verification_method: &str,
    ) -> Result<DisclosureProof, CryptoError> {
        if let Some(unknown) = reveal.iter().find(|n| !self.attributes.contains_key(**n)) {
            return Err(CryptoError::InvalidInput(format!(
                "unknown attribute: {}",
                unknown
            )));
        }

        let mut revealed = BTreeMap::new();
        let mut hidden_commitments = BTreeMap::new();
        for (name, (value, nonce, commitment)) in &self.attributes {
            if reveal.contains(&name.as_str()) {
                revealed.insert(
                    name.clone(),
                    RevealedAttribute {
                        value: value.clone(),
                        nonce: hex::encode(nonce),
                    },
                );
            } else {
                hidden_commitments.insert(name.clone(), commitment.to_hex());
            }
        }

        let mut proof = DisclosureProof {
            revealed,
            hidden_commitments,
            commitment_root: hex::encode(self.commitment_root()),
            nonce: hex::encode(presentation_nonce),
            verification_method: verification_method.to_string(),
            signature: String::new(),
        };
        proof.signature = sign(&proof.digest()?, holder).to_hex();
        Ok(proof)
    }
}

/// Generate a fresh presentation nonce for a verifier request.
pub fn presentation_nonce() -> [u8; 32] {
    let mut nonce = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

impl DisclosureProof {
    /// Digest the holder signs: root, nonce, verification method and every
    /// revealed and hidden entry, each length-prefixed.
    pub fn digest(&self) -> Result<Hash, CryptoError> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(DISCLOSURE_DOMAIN);
        hasher.update(&decode_32(&self.commitment_root)?);
        hasher.update(&decode_32(&self.nonce)?);
        update_prefixed(&mut hasher, self.verification_method.as_bytes());

        hasher.update(&(self.revealed.len() as u64).to_be_bytes());
        for (name, attr) in &self.revealed {
            update_prefixed(&mut hasher, name.as_bytes());
            update_prefixed(&mut hasher, attr.value.as_bytes());
            hasher.update(&decode_32(&attr.nonce)?);
        }
        hasher.update(&(self.hidden_commitments.len() as u64).to_be_bytes());
        for (name, commitment) in &self.hidden_commitments {
            update_prefixed(&mut hasher, name.as_bytes());
            hasher.update(&decode_32(commitment)?);
        }
        Ok(*hasher.finalize().as_bytes())
    }

    /// Check the disclosure against the issuer-signed root, the verifier's
    /// nonce and the key of the holder it claims to come from.
    pub fn verify(
        &self,
        signed_root: &Hash,
        expected_nonce: &[u8; 32],
        holder_key: &PublicKey,
    ) -> Result<(), CryptoError> {
        let signature = Signature::from_hex(&self.signature)?;
        verify(&self.digest()?, &signature, holder_key).map_err(|_| {
            CryptoError::DisclosureMismatch("holder signature does not cover the disclosure".into())
        })?;

        if decode_32(&self.nonce)? != *expected_nonce {
            return Err(CryptoError::DisclosureMismatch(
                "presentation nonce does not match the request".into(),
            ));
        }
        if decode_32(&self.commitment_root)? != *signed_root {
            return Err(CryptoError::DisclosureMismatch(
                "commitment root differs from the signed root".into(),
            ));
        }
        if let Some(name) = self
            .revealed
            .keys()
            .find(|n| self.hidden_commitments.contains_key(*n))
        {
            return Err(CryptoError::DisclosureMismatch(format!(
                "attribute {} is both revealed and hidden",
                name
            )));
        }

        let mut all: BTreeMap<&str, Commitment> = BTreeMap::new();
        for (name, attr) in &self.revealed {
            let nonce = decode_32(&attr.nonce)?;
            all.insert(
                name,
                Commitment::commit_with_nonce(name, attr.value.as_bytes(), &nonce),
            );
        }
        for (name, hex_commitment) in &self.hidden_commitments {
            all.insert(name, Commitment::from_hex(hex_commitment)?);
        }

        let leaves: Vec<(&str, Commitment)> = all.into_iter().collect();
        if commitment_root(&leaves) != *signed_root {
            tracing::debug!(
                revealed = self.revealed.len(),
                hidden = self.hidden_commitments.len(),
                "selective disclosure root mismatch"
            );
            return Err(CryptoError::DisclosureMismatch(
                "disclosed attributes do not match the committed set".into(),
            ));
        }
        Ok(())
    }
}

fn update_prefixed(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
