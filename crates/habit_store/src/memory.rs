use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use habit_core::{EntityKind, RawRecord};
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::client::RecordStore;
use crate::error::{Result, StoreError};

/// Record store kept entirely in memory. Used for offline runs and tests.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<EntityKind, Vec<RawRecord>>>,
    unavailable: RwLock<HashSet<EntityKind>>,
    next_id: AtomicU64,
    list_calls: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record with a caller-chosen id, bypassing `create`.
    pub fn seed(&self, kind: EntityKind, record: RawRecord) {
        self.records.write().entry(kind).or_default().push(record);
    }

    /// Every call against `kind` fails until availability is restored.
    pub fn set_unavailable(&self, kind: EntityKind, unavailable: bool) {
        let mut set = self.unavailable.write();
        if unavailable {
            set.insert(kind);
        } else {
            set.remove(&kind);
        }
    }

    pub fn records(&self, kind: EntityKind) -> Vec<RawRecord> {
        self.records.read().get(&kind).cloned().unwrap_or_default()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn ensure_available(&self, kind: EntityKind) -> Result<()> {
        if self.unavailable.read().contains(&kind) {
            return Err(StoreError::Unavailable(kind));
        }
        Ok(())
    }

    fn allocate_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{:024x}", n)
    }
}

fn now_stamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(&self, kind: EntityKind) -> Result<Vec<RawRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_available(kind)?;
        Ok(self.records(kind))
    }

    async fn create(&self, kind: EntityKind, fields: Map<String, Value>) -> Result<RawRecord> {
        self.ensure_available(kind)?;
        let record = RawRecord {
            id: self.allocate_id(),
            created_at: now_stamp(),
            updated_at: None,
            fields,
        };
        self.seed(kind, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<RawRecord> {
        self.ensure_available(kind)?;
        let mut records = self.records.write();
        let record = records
            .get_mut(&kind)
            .and_then(|list| list.iter_mut().find(|record| record.id == id))
            .ok_or_else(|| StoreError::NotFound(format!("{kind}/{id}")))?;
        for (key, value) in fields {
            if value.is_null() {
                record.fields.remove(&key);
            } else {
                record.fields.insert(key, value);
            }
        }
        record.updated_at = Some(now_stamp());
        Ok(record.clone())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<()> {
        self.ensure_available(kind)?;
        let mut records = self.records.write();
        let list = records.entry(kind).or_default();
        let before = list.len();
        list.retain(|record| record.id != id);
        if list.len() == before {
            return Err(StoreError::NotFound(format!("{kind}/{id}")));
        }
        Ok(())
    }
}
