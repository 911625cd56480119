use std::sync::Arc;

use async_trait::async_trait;

use crate::did_registry::DidRegistry;
use crate::document::DidDocument;
use crate::error::RegistryError;
use crate::status_registry::{CredentialStatusRegistry, StatusCheck};

/// Read access to DID documents, as the verification engine sees it.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Resolve an active DID to its document.
    async fn resolve(&self, did: &str) -> Result<DidDocument, RegistryError>;
}

/// Read access to credential status.
#[async_trait]
pub trait StatusResolver: Send + Sync {
    async fn check_status(&self, credential_id: &str) -> Result<StatusCheck, RegistryError>;
}

/// Resolves DIDs from an in-process `DidRegistry`.
pub struct LocalDidResolver {
    registry: Arc<DidRegistry>,
}

impl LocalDidResolver {
    pub fn new(registry: Arc<DidRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl DidResolver for LocalDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, RegistryError> {
        self.registry.resolve_did(did)
    }
}

/// Reads status from an in-process `CredentialStatusRegistry`.
pub struct LocalStatusResolver {
    registry: Arc<CredentialStatusRegistry>,
}

impl LocalStatusResolver {
    pub fn new(registry: Arc<CredentialStatusRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl StatusResolver for LocalStatusResolver {
    async fn check_status(&self, credential_id: &str) -> Result<StatusCheck, RegistryError> {
        self.registry.check_status(credential_id)
    }
}
