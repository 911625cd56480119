use std::collections::HashSet;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use vouch_core::{
    AuditEvent, AuditEventKind, Clock, EventBus, StateError, SystemClock, Timestamp,
};

use crate::document::{DidContent, DidDocument};
use crate::error::RegistryError;

/// Stored state of one DID. Deactivation is a soft delete.
#[derive(Debug, Clone)]
struct DidRecord {
    content: DidContent,
    controllers: HashSet<String>,
    created: Timestamp,
    updated: Timestamp,
    active: bool,
}

impl DidRecord {
    fn to_document(&self, id: &str) -> DidDocument {
        let mut controller: Vec<String> = self.controllers.iter().cloned().collect();
        controller.sort();
        DidDocument {
            context: self.content.contexts.clone(),
            id: id.to_string(),
            controller,
            public_keys: self.content.public_keys.clone(),
            services: self.content.services.clone(),
            created: self.created,
            updated: self.updated,
            active: self.active,
        }
    }
}

/// Authoritative DID → document mapping with controller access control.
///
/// Every write runs inside the `DashMap` entry guard of its DID, so the
/// existence check of `create_did` is atomic with the insert and the
/// controller set and reverse index change together. Lock order is always
/// `records` then `by_controller`.
pub struct DidRegistry {
    /// DID → record
    records: DashMap<String, DidRecord>,
    /// controller → DIDs it controls
    by_controller: DashMap<String, HashSet<String>>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl DidRegistry {
    pub fn new(clock: Arc<dyn Clock>, events: EventBus) -> Self {
        Self {
            records: DashMap::new(),
            by_controller: DashMap::new(),
            clock,
            events,
        }
    }

    /// Register a new DID. The caller becomes its sole controller.
    pub fn create_did(
        &self,
        caller: &str,
        id: &str,
        content: DidContent,
    ) -> Result<DidDocument, RegistryError> {
        if id.trim().is_empty() {
            return Err(RegistryError::InvalidArgument("DID must not be empty".into()));
        }
        if caller.trim().is_empty() {
            return Err(RegistryError::InvalidArgument(
                "caller must not be empty".into(),
            ));
        }

        let now = self.clock.now();
        let document = match self.records.entry(id.to_string()) {
            Entry::Occupied(_) => return Err(RegistryError::AlreadyExists(id.to_string())),
            Entry::Vacant(slot) => {
                let record = DidRecord {
                    content,
                    controllers: HashSet::from([caller.to_string()]),
                    created: now,
                    updated: now,
                    active: true,
                };
                let document = record.to_document(id);
                self.index_controller(caller, id);
                let _guard = slot.insert(record);
                tracing::info!(did = %id, caller, "DID created");
                self.events
                    .publish(AuditEvent::new(AuditEventKind::DidCreated, id, caller, now));
                document
            }
        };
        Ok(document)
    }

    /// Resolve an active DID. Unknown and deactivated DIDs are `NotFound`.
    pub fn resolve_did(&self, id: &str) -> Result<DidDocument, RegistryError> {
        self.records
            .get(id)
            .filter(|record| record.active)
            .map(|record| record.to_document(id))
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Whether the DID was ever registered, deactivated or not.
    pub fn did_exists(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Replace contexts, keys and services of a DID.
    pub fn update_did(
        &self,
        caller: &str,
        id: &str,
        content: DidContent,
    ) -> Result<DidDocument, RegistryError> {
        let document = self.mutate(caller, id, |record, now| {
            record.content = content;
            record.updated = now;
            Ok((record.to_document(id), AuditEventKind::DidUpdated))
        })?;

        tracing::info!(did = %id, caller, "DID updated");
        Ok(document)
    }

    pub fn add_controller(
        &self,
        caller: &str,
        id: &str,
        controller: &str,
    ) -> Result<(), RegistryError> {
        if controller.trim().is_empty() {
            return Err(RegistryError::InvalidArgument(
                "controller must not be empty".into(),
            ));
        }

        self.mutate(caller, id, |record, _| {
            if !record.controllers.insert(controller.to_string()) {
                return Err(RegistryError::AlreadyExists(format!(
                    "{} is already a controller of {}",
                    controller, id
                )));
            }
            self.index_controller(controller, id);
            let kind = AuditEventKind::ControllerAdded {
                controller: controller.to_string(),
            };
            Ok(((), kind))
        })?;

        tracing::info!(did = %id, caller, controller, "controller added");
        Ok(())
    }

    /// Remove a controller. A DID never drops to zero controllers.
    pub fn remove_controller(
        &self,
        caller: &str,
        id: &str,
        controller: &str,
    ) -> Result<(), RegistryError> {
        self.mutate(caller, id, |record, _| {
            if !record.controllers.contains(controller) {
                return Err(RegistryError::NotFound(format!(
                    "{} is not a controller of {}",
                    controller, id
                )));
            }
            if record.controllers.len() == 1 {
                return Err(StateError::LastController { did: id.to_string() }.into());
            }
            record.controllers.remove(controller);
            self.unindex_controller(controller, id);
            let kind = AuditEventKind::ControllerRemoved {
                controller: controller.to_string(),
            };
            Ok(((), kind))
        })?;

        tracing::info!(did = %id, caller, controller, "controller removed");
        Ok(())
    }

    /// Soft-delete a DID. It stays registered but no longer resolves.
    pub fn deactivate_did(&self, caller: &str, id: &str) -> Result<(), RegistryError> {
        self.mutate(caller, id, |record, _| {
            record.active = false;
            Ok(((), AuditEventKind::DidDeactivated))
        })?;

        tracing::info!(did = %id, caller, "DID deactivated");
        Ok(())
    }

    pub fn is_controller(&self, id: &str, address: &str) -> bool {
        self.records
            .get(id)
            .map(|record| record.controllers.contains(address))
            .unwrap_or(false)
    }

    /// Controllers of a DID, sorted. Empty for unknown DIDs.
    pub fn get_controllers(&self, id: &str) -> Vec<String> {
        let mut controllers: Vec<String> = self
            .records
            .get(id)
            .map(|record| record.controllers.iter().cloned().collect())
            .unwrap_or_default();
        controllers.sort();
        controllers
    }

    /// DIDs controlled by an identity, sorted.
    pub fn get_dids_by_controller(&self, controller: &str) -> Vec<String> {
        let mut dids: Vec<String> = self
            .by_controller
            .get(controller)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        dids.sort();
        dids
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Run a controller-only write on an active DID under its entry guard.
    /// On success `updated` is bumped and the event returned by `f` is
    /// published before the guard is released, so events of one DID are
    /// published in commit order.
    fn mutate<T>(
        &self,
        caller: &str,
        id: &str,
        f: impl FnOnce(&mut DidRecord, Timestamp) -> Result<(T, AuditEventKind), RegistryError>,
    ) -> Result<T, RegistryError> {
        let mut record = self
            .records
            .get_mut(id)
            .filter(|record| record.active)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        if !record.controllers.contains(caller) {
            tracing::warn!(did = %id, caller, "rejected write from non-controller");
            return Err(RegistryError::unauthorized(caller, id));
        }

        let now = self.clock.now();
        let (out, kind) = f(&mut record, now)?;
        record.updated = now;
        self.events.publish(AuditEvent::new(kind, id, caller, now));
        Ok(out)
    }

    fn index_controller(&self, controller: &str, id: &str) {
        self.by_controller
            .entry(controller.to_string())
            .or_default()
            .insert(id.to_string());
    }

    fn unindex_controller(&self, controller: &str, id: &str) {
        if let Entry::Occupied(mut owned) = self.by_controller.entry(controller.to_string()) {
            owned.get_mut().remove(id);
            if owned.get().is_empty() {
                owned.remove();
            }
        }
    }
}

impl Default for DidRegistry {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), EventBus::default())
    }
}
