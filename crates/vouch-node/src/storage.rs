//! RocksDB audit-event log.
//!
//! Keys are `timestamp (u64, big-endian) || event id (16 bytes)`, so key
//! order is commit order and reverse iteration yields the newest events.

use anyhow::Result;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, DB};
use std::path::Path;

use vouch_core::AuditEvent;

const CF_EVENTS: &str = "events";

pub struct EventStore {
    db: DB,
}

impl EventStore {
    /// Open or create the event log at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![ColumnFamilyDescriptor::new(CF_EVENTS, Options::default())];
        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    pub fn append(&self, event: &AuditEvent) -> Result<()> {
        let cf = self.events_cf()?;
        let value = serde_json::to_vec(event)?;
        self.db.put_cf(&cf, event_key(event), value)?;
        Ok(())
    }

    /// Up to `limit` events, newest first.
    pub fn recent_events(&self, limit: usize) -> Result<Vec<AuditEvent>> {
        let cf = self.events_cf()?;
        let mut events = Vec::with_capacity(limit.min(1024));
        for item in self.db.iterator_cf(&cf, IteratorMode::End).take(limit) {
            let (_, value) = item?;
            events.push(serde_json::from_slice(&value)?);
        }
        Ok(events)
    }

    fn events_cf(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(CF_EVENTS)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", CF_EVENTS))
    }
}

fn event_key(event: &AuditEvent) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..8].copy_from_slice(&event.timestamp.to_be_bytes());
    key[8..].copy_from_slice(event.id.as_bytes());
    key
}
