pub mod error;
pub mod hashing;
pub mod keys;
pub mod selective_disclosure;
pub mod signing;

pub use error::CryptoError;
pub use hashing::{commitment_root, hash, Commitment, Hash};
pub use keys::{KeyPair, PublicKey};
pub use selective_disclosure::{
    presentation_nonce, DisclosureProof, RevealedAttribute, SelectiveDisclosure,
};
pub use signing::{sign, verify, Signature};
