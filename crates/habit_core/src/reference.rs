use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::{Habit, TrackingEntry};

/// Prefix used when a reference is serialized for the record store.
pub const REFERENCE_BASE: &str = "https://my.living-apps.de/rest";

/// Shown wherever a tracking entry points at a habit that is not loaded.
pub const UNKNOWN_HABIT: &str = "Unbekannt";

/// Tagged pointer to a record in another collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordRef {
    pub collection: String,
    pub id: String,
}

impl RecordRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn encode(&self) -> String {
        encode(&self.collection, &self.id)
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

pub fn encode(collection_id: &str, record_id: &str) -> String {
    format!("{REFERENCE_BASE}/apps/{collection_id}/records/{record_id}")
}

/// Parse an encoded reference. Never fails loudly: anything that is not
/// `…/apps/{collection}/records/{id}` comes back as `None`.
pub fn decode(reference: &str) -> Option<RecordRef> {
    let trimmed = reference.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    let mut segments = trimmed.rsplit('/');
    let id = segments.next()?;
    if segments.next()? != "records" {
        return None;
    }
    let collection = segments.next()?;
    if segments.next()? != "apps" {
        return None;
    }
    if !is_record_token(collection) || !is_record_token(id) {
        return None;
    }
    Some(RecordRef::new(collection, id))
}

pub fn extract_record_id(reference: &str) -> Option<String> {
    decode(reference).map(|record| record.id)
}

fn is_record_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// serde adapter for `Option<RecordRef>` fields carried as strings.
pub mod serde_opt {
    use super::*;

    pub fn serialize<S>(value: &Option<RecordRef>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(record) => serializer.serialize_str(&record.encode()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<RecordRef>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(|value| value.as_str()).and_then(decode))
    }
}

impl Serialize for RecordRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

/// Lookup of loaded habits by record id.
#[derive(Debug, Default)]
pub struct HabitIndex<'a> {
    by_id: HashMap<&'a str, &'a Habit>,
}

impl<'a> HabitIndex<'a> {
    pub fn new(habits: &'a [Habit]) -> Self {
        let by_id = habits
            .iter()
            .map(|habit| (habit.id.as_str(), habit))
            .collect();
        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&'a Habit> {
        self.by_id.get(id).copied()
    }

    /// Only references whose record is present in the loaded set resolve.
    pub fn resolve(&self, reference: &RecordRef) -> Option<&'a Habit> {
        self.get(&reference.id)
    }

    pub fn habit_for(&self, entry: &TrackingEntry) -> Option<&'a Habit> {
        entry.fields.habit.as_ref().and_then(|r| self.resolve(r))
    }

    pub fn habit_name_for(&self, entry: &TrackingEntry) -> String {
        self.habit_for(entry)
            .map(|habit| habit.fields.display_name().to_string())
            .unwrap_or_else(|| UNKNOWN_HABIT.to_string())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
