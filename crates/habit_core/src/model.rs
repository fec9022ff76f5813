use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::reference::{self, RecordRef};
use crate::wire;

/// Envelope every record-store collection returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record<F> {
    #[serde(rename = "record_id", alias = "id", default)]
    pub id: String,
    #[serde(rename = "createdat", default)]
    pub created_at: String,
    #[serde(rename = "updatedat", default)]
    pub updated_at: Option<String>,
    /// A missing or `null` field bag decodes as empty.
    #[serde(
        default,
        deserialize_with = "wire::null_as_default",
        bound(deserialize = "F: Deserialize<'de> + Default")
    )]
    pub fields: F,
}

pub type RawRecord = Record<Map<String, Value>>;
pub type Habit = Record<HabitFields>;
pub type TrackingEntry = Record<TrackingFields>;
pub type CheckIn = Record<CheckInFields>;

impl<F> Record<F> {
    pub fn new(id: impl Into<String>, fields: F) -> Self {
        Self {
            id: id.into(),
            created_at: String::new(),
            updated_at: None,
            fields,
        }
    }
}

impl RawRecord {
    /// Reinterpret the untyped field bag as an entity's fields.
    pub fn decode<F: DeserializeOwned>(self) -> Result<Record<F>, serde_json::Error> {
        let fields = serde_json::from_value(Value::Object(self.fields))?;
        Ok(Record {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            fields,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Habits,
    TrackingEntries,
    CheckIns,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Habits,
        EntityKind::TrackingEntries,
        EntityKind::CheckIns,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Habits => "habits",
            EntityKind::TrackingEntries => "tracking_entries",
            EntityKind::CheckIns => "check_ins",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collection ids of the three entity types in the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collections {
    pub habits: String,
    pub tracking_entries: String,
    pub check_ins: String,
}

impl Collections {
    pub fn id_for(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Habits => &self.habits,
            EntityKind::TrackingEntries => &self.tracking_entries,
            EntityKind::CheckIns => &self.check_ins,
        }
    }

    pub fn habit_ref(&self, habit_id: &str) -> RecordRef {
        RecordRef::new(self.habits.clone(), habit_id)
    }
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            habits: "69947e07b7b8c3499c21cd9b".to_string(),
            tracking_entries: "69947e154f3e4ff52b965f17".to_string(),
            check_ins: "69947e17c23629598e36e8b1".to_string(),
        }
    }
}

/// Field types that map onto one record-store collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;
    /// Payload sent on update; may omit fields that must not change.
    type Update: Serialize + Send + Sync;
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $wire:literal, $label:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    Category, "category" {
        Health => "gesundheit", "Gesundheit";
        Fitness => "fitness", "Fitness";
        Nutrition => "ernaehrung", "Ernährung";
        Productivity => "produktivitaet", "Produktivität";
        PersonalGrowth => "persoenliche_entwicklung", "Pers. Entwicklung";
        Social => "soziales", "Soziales";
        Finance => "finanzen", "Finanzen";
        Other => "sonstiges", "Sonstiges";
    }
}

wire_enum! {
    Frequency, "frequency" {
        Daily => "taeglich", "Täglich";
        SeveralTimesWeekly => "mehrmals_woche", "Mehrmals pro Woche";
        Weekly => "woechentlich", "Wöchentlich";
        Monthly => "monatlich", "Monatlich";
    }
}

wire_enum! {
    /// Outcome of one tracking event. Only `Done` counts toward metrics.
    EntryStatus, "status" {
        Done => "erledigt", "Erledigt";
        Partial => "teilweise", "Teilweise";
        Skipped => "uebersprungen", "Übersprungen";
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitFields {
    #[serde(
        rename = "gewohnheit_name",
        default,
        deserialize_with = "wire::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        rename = "beschreibung",
        default,
        deserialize_with = "wire::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        rename = "kategorie",
        default,
        deserialize_with = "wire::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Category>,
    #[serde(
        rename = "ziel_haeufigkeit",
        default,
        deserialize_with = "wire::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_frequency: Option<Frequency>,
    #[serde(
        rename = "startdatum",
        default,
        deserialize_with = "wire::lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(
        rename = "aktiv",
        default,
        deserialize_with = "wire::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub active: Option<bool>,
}

impl HabitFields {
    /// A habit is active unless explicitly switched off.
    pub fn is_active(&self) -> bool {
        self.active != Some(false)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

impl Entity for HabitFields {
    const KIND: EntityKind = EntityKind::Habits;
    type Update = HabitFields;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingFields {
    #[serde(
        rename = "gewohnheit",
        default,
        with = "reference::serde_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub habit: Option<RecordRef>,
    #[serde(
        rename = "datum_uhrzeit",
        default,
        deserialize_with = "wire::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<EntryStatus>,
    #[serde(
        rename = "bewertung",
        default,
        deserialize_with = "wire::lenient_rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<u8>,
    #[serde(
        rename = "notizen",
        default,
        deserialize_with = "wire::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
}

impl TrackingFields {
    pub fn date(&self) -> Option<NaiveDate> {
        self.timestamp.as_deref().and_then(wire::date_key)
    }

    pub fn is_done(&self) -> bool {
        self.status == Some(EntryStatus::Done)
    }

    pub fn habit_id(&self) -> Option<&str> {
        self.habit.as_ref().map(|r| r.id.as_str())
    }

    /// The same entry minus its habit reference, which never changes after
    /// creation.
    pub fn to_update(&self) -> TrackingUpdate {
        TrackingUpdate {
            timestamp: self.timestamp.clone(),
            status: self.status,
            rating: self.rating,
            notes: self.notes.clone(),
        }
    }
}

impl Entity for TrackingFields {
    const KIND: EntityKind = EntityKind::TrackingEntries;
    type Update = TrackingUpdate;
}

/// Edit payload. Unset timestamp and status are left out; unset rating and
/// notes go out as `null` so an edit can clear them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackingUpdate {
    #[serde(rename = "datum_uhrzeit", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
    #[serde(rename = "bewertung")]
    pub rating: Option<u8>,
    #[serde(rename = "notizen")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckInFields {
    #[serde(
        rename = "checkin_datum",
        default,
        deserialize_with = "wire::lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    /// Names as they were when the check-in was saved, not habit ids.
    #[serde(
        rename = "erledigte_gewohnheiten",
        default,
        deserialize_with = "wire::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_habits: Option<String>,
    #[serde(
        rename = "tagesnotizen",
        default,
        deserialize_with = "wire::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub day_notes: Option<String>,
}

impl CheckInFields {
    pub fn completed_habit_names(&self) -> Vec<String> {
        self.completed_habits
            .as_deref()
            .map(split_habit_names)
            .unwrap_or_default()
    }
}

impl Entity for CheckInFields {
    const KIND: EntityKind = EntityKind::CheckIns;
    type Update = CheckInFields;
}

pub fn split_habit_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_habit_names<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|name| name.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}
