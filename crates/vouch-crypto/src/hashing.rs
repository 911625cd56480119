use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// BLAKE3 hash (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using BLAKE3.
pub fn hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Hash commitment to a named attribute value: `H(len(name) || name || value || nonce)`.
///
/// The attribute name is length-prefixed so that a commitment cannot be
/// replayed under a different attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment(pub Hash);

impl Commitment {
    /// Commit with a fresh random nonce. Keep the nonce secret until reveal.
    pub fn commit(name: &str, value: &[u8]) -> (Self, [u8; 32]) {
        let mut nonce = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut nonce);
        (Self::commit_with_nonce(name, value, &nonce), nonce)
    }

    pub fn commit_with_nonce(name: &str, value: &[u8], nonce: &[u8; 32]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(name.len() as u64).to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update(value);
        hasher.update(nonce);
        Self(*hasher.finalize().as_bytes())
    }

    pub fn verify(&self, name: &str, value: &[u8], nonce: &[u8; 32]) -> bool {
        Self::commit_with_nonce(name, value, nonce) == *self
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        Ok(Self(decode_32(hex_str)?))
    }
}

/// Decode a 32-byte hex value (hashes, nonces).
pub fn decode_32(hex_str: &str) -> Result<[u8; 32], CryptoError> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| CryptoError::InvalidEncoding(format!("invalid hex: {}", e)))?;
    bytes.as_slice().try_into().map_err(|_| {
        CryptoError::InvalidInput(format!("expected 32 bytes, got {}", bytes.len()))
    })
}

const LEAF_TAG: u8 = 0x00;
const NODE_TAG: u8 = 0x01;
const ROOT_TAG: u8 = 0x02;

/// Merkle root over named commitments in the given order.
///
/// Leaves are `H(0x00 || len(name) || name || commitment)` and inner nodes
/// `H(0x01 || left || right)`, so an inner node never verifies as a leaf. An
/// odd node is promoted to the next level unchanged. The final root is
/// `H(0x02 || count || tree)` and so commits to the number of attributes;
/// the tree of an empty set is the zero hash.
pub fn commitment_root(leaves: &[(&str, Commitment)]) -> Hash {
    let mut level: Vec<Hash> = leaves
        .iter()
        .map(|(name, commitment)| {
            let mut hasher = blake3::Hasher::new();
            hasher.update(&[LEAF_TAG]);
            hasher.update(&(name.len() as u64).to_be_bytes());
            hasher.update(name.as_bytes());
            hasher.update(&commitment.0);
            *hasher.finalize().as_bytes()
        })
        .collect();

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => {
                    let mut hasher = blake3::Hasher::new();
                    hasher.update(&[NODE_TAG]);
                    hasher.update(left);
                    hasher.update(right);
                    *hasher.finalize().as_bytes()
                }
                _ => pair[0],
            })
            .collect();
    }

    let tree = level.first().copied().unwrap_or([0u8; 32]);
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[ROOT_TAG]);
    hasher.update(&(leaves.len() as u64).to_be_bytes());
    hasher.update(&tree);
    *hasher.finalize().as_bytes()
}
