use std::sync::Arc;
use std::time::Instant;

use habit_core::{
    CheckInFields, DashboardSnapshot, Entity, HabitFields, Record, TrackingFields,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::client::RecordStore;
use crate::error::{Result, StoreError};

/// Typed access to the record store, one entity type at a time.
#[derive(Clone)]
pub struct EntityStore {
    store: Arc<dyn RecordStore>,
}

impl EntityStore {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list<E: Entity>(&self) -> Result<Vec<Record<E>>> {
        let raw = self.store.list(E::KIND).await?;
        raw.into_iter()
            .map(|record| -> Result<Record<E>> { Ok(record.decode::<E>()?) })
            .collect()
    }

    pub async fn create<E: Entity>(&self, fields: &E) -> Result<Record<E>> {
        let created = self.store.create(E::KIND, to_field_map(fields)?).await?;
        Ok(created.decode()?)
    }

    pub async fn update<E: Entity>(&self, id: &str, update: &E::Update) -> Result<Record<E>> {
        let updated = self
            .store
            .update(E::KIND, id, to_field_map(update)?)
            .await?;
        Ok(updated.decode()?)
    }

    pub async fn delete<E: Entity>(&self, id: &str) -> Result<()> {
        self.store.delete(E::KIND, id).await
    }

    /// Fetch all three collections concurrently. Any failure fails the whole
    /// load; a partial snapshot is never returned.
    #[instrument(skip(self))]
    pub async fn load_snapshot(&self) -> Result<DashboardSnapshot> {
        let start = Instant::now();
        let (habits, entries, check_ins) = tokio::try_join!(
            self.list::<HabitFields>(),
            self.list::<TrackingFields>(),
            self.list::<CheckInFields>(),
        )?;
        info!(
            habits = habits.len(),
            entries = entries.len(),
            check_ins = check_ins.len(),
            elapsed_ms = %start.elapsed().as_millis(),
            "snapshot loaded"
        );
        Ok(DashboardSnapshot {
            habits,
            entries,
            check_ins,
        })
    }
}

fn to_field_map<T: Serialize>(fields: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(fields)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidResponse(format!(
            "entity fields must serialize to an object, got {}",
            other
        ))),
    }
}
