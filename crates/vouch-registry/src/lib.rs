//! Vouch Registries
//!
//! The two sources of truth the verification engine consults:
//! - DID registry: identifier → DID document, mutated only by controllers
//! - Credential status registry: per-credential lifecycle owned by its issuer,
//!   with an append-only status history
//! - Resolver traits the engine reads both registries through

pub mod did_registry;
pub mod document;
pub mod error;
pub mod resolver;
pub mod status_registry;

pub use did_registry::DidRegistry;
pub use document::{DidContent, DidDocument, PublicKeyDescriptor, ServiceEndpoint};
pub use error::RegistryError;
pub use resolver::{DidResolver, LocalDidResolver, LocalStatusResolver, StatusResolver};
pub use status_registry::{
    BatchStatus, CredentialStatusRegistry, StatusCheck, StatusHistoryEntry, StatusRecord,
};
