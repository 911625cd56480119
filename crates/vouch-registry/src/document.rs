use serde::{Deserialize, Serialize};
use vouch_core::Timestamp;
use vouch_crypto::{CryptoError, PublicKey};

/// Default JSON-LD context of a DID document.
pub const DID_CONTEXT_V1: &str = "https://www.w3.org/ns/did/v1";

/// Public key descriptor within a DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyDescriptor {
    /// Key identifier (e.g., "did:test:0xA#keys-1").
    pub id: String,
    /// Key type (e.g., "Ed25519VerificationKey2020").
    #[serde(rename = "type")]
    pub key_type: String,
    /// Identity that controls this key.
    pub controller: String,
    /// Base58-encoded key material.
    pub public_key_base58: String,
}

impl PublicKeyDescriptor {
    /// Describe an Ed25519 key as `<did>#keys-<index>`.
    pub fn ed25519(did: &str, index: usize, key: &PublicKey) -> Self {
        Self {
            id: format!("{}#keys-{}", did, index),
            key_type: "Ed25519VerificationKey2020".to_string(),
            controller: did.to_string(),
            public_key_base58: key.to_bs58(),
        }
    }

    /// Decode the key material.
    pub fn public_key(&self) -> Result<PublicKey, CryptoError> {
        PublicKey::from_bs58(&self.public_key_base58)
    }
}

/// Service endpoint in a DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
}

/// Mutable fields of a DID document, supplied on create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidContent {
    #[serde(rename = "@context", default)]
    pub contexts: Vec<String>,
    #[serde(default, alias = "publicKey")]
    pub public_keys: Vec<PublicKeyDescriptor>,
    #[serde(default, alias = "service")]
    pub services: Vec<ServiceEndpoint>,
}

impl DidContent {
    /// Content with the default context and a single Ed25519 key.
    pub fn with_ed25519_key(did: &str, key: &PublicKey) -> Self {
        Self {
            contexts: vec![DID_CONTEXT_V1.to_string()],
            public_keys: vec![PublicKeyDescriptor::ed25519(did, 1, key)],
            services: Vec::new(),
        }
    }

    pub fn add_service(mut self, service_type: &str, endpoint: &str, did: &str) -> Self {
        let idx = self.services.len() + 1;
        self.services.push(ServiceEndpoint {
            id: format!("{}#service-{}", did, idx),
            service_type: service_type.to_string(),
            service_endpoint: endpoint.to_string(),
        });
        self
    }
}

/// Resolved DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    /// Current controllers, sorted.
    pub controller: Vec<String>,
    #[serde(rename = "publicKey")]
    pub public_keys: Vec<PublicKeyDescriptor>,
    #[serde(rename = "service")]
    pub services: Vec<ServiceEndpoint>,
    pub created: Timestamp,
    pub updated: Timestamp,
    pub active: bool,
}

impl DidDocument {
    /// Find a key by its full id (`did#keys-1`) or bare fragment (`keys-1`).
    pub fn find_public_key(&self, key_id: &str) -> Option<&PublicKeyDescriptor> {
        self.public_keys.iter().find(|k| {
            k.id == key_id
                || k
                    .id
                    .rsplit_once('#')
                    .is_some_and(|(_, fragment)| fragment == key_id.trim_start_matches('#'))
        })
    }

    /// The first listed key.
    pub fn primary_public_key(&self) -> Option<&PublicKeyDescriptor> {
        self.public_keys.first()
    }
}
