//! Editable form state for the three entity types.
//!
//! Forms are borrowed by the controller on submit, so a failed save leaves
//! them intact for another attempt.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use habit_core::model::{join_habit_names, Category, EntryStatus, Frequency, TrackingUpdate};
use habit_core::{
    CheckIn, CheckInFields, Collections, Habit, HabitFields, TrackingEntry, TrackingFields,
};
use thiserror::Error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Bitte gib einen Namen ein")]
    MissingName,
    #[error("Bitte wähle eine Gewohnheit")]
    MissingHabit,
    #[error("Bewertung muss zwischen 0 und 5 liegen, nicht {0}")]
    RatingOutOfRange(u8),
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct HabitForm {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub active: bool,
}

impl HabitForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            category: Category::Other,
            frequency: Frequency::Daily,
            start_date: today,
            active: true,
        }
    }

    pub fn from_habit(habit: &Habit, today: NaiveDate) -> Self {
        let fields = &habit.fields;
        Self {
            name: fields.name.clone().unwrap_or_default(),
            description: fields.description.clone().unwrap_or_default(),
            category: fields.category.unwrap_or(Category::Other),
            frequency: fields.target_frequency.unwrap_or(Frequency::Daily),
            start_date: fields.start_date.unwrap_or(today),
            active: fields.is_active(),
        }
    }

    pub fn to_fields(&self) -> Result<HabitFields, FormError> {
        if self.name.trim().is_empty() {
            return Err(FormError::MissingName);
        }
        Ok(HabitFields {
            name: Some(self.name.clone()),
            description: non_empty(&self.description),
            category: Some(self.category),
            target_frequency: Some(self.frequency),
            start_date: Some(self.start_date),
            active: Some(self.active),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackingForm {
    pub habit_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: EntryStatus,
    /// 0 means no rating.
    pub rating: u8,
    pub notes: String,
}

impl TrackingForm {
    /// Preselects the first active habit, if any.
    pub fn new(active_habits: &[&Habit], now: NaiveDateTime) -> Self {
        Self {
            habit_id: active_habits
                .first()
                .map(|habit| habit.id.clone())
                .unwrap_or_default(),
            date: now.date(),
            time: truncate_to_minute(now.time()),
            status: EntryStatus::Done,
            rating: 0,
            notes: String::new(),
        }
    }

    pub fn from_entry(entry: &TrackingEntry, now: NaiveDateTime) -> Self {
        let fields = &entry.fields;
        let (date, time) = match fields.timestamp.as_deref() {
            Some(raw) => {
                let mut parts = raw.splitn(2, 'T');
                let date = parts
                    .next()
                    .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                    .unwrap_or(now.date());
                let time = parts
                    .next()
                    .and_then(parse_clock)
                    .unwrap_or_else(noon);
                (date, time)
            }
            None => (now.date(), truncate_to_minute(now.time())),
        };
        Self {
            habit_id: fields.habit_id().unwrap_or_default().to_string(),
            date,
            time,
            status: fields.status.unwrap_or(EntryStatus::Done),
            rating: fields.rating.unwrap_or(0),
            notes: fields.notes.clone().unwrap_or_default(),
        }
    }

    pub fn timestamp(&self) -> String {
        format_timestamp(self.date.and_time(self.time))
    }

    fn validate(&self) -> Result<Option<u8>, FormError> {
        if self.habit_id.trim().is_empty() {
            return Err(FormError::MissingHabit);
        }
        match self.rating {
            0 => Ok(None),
            1..=5 => Ok(Some(self.rating)),
            other => Err(FormError::RatingOutOfRange(other)),
        }
    }

    pub fn to_fields(&self, collections: &Collections) -> Result<TrackingFields, FormError> {
        let rating = self.validate()?;
        Ok(TrackingFields {
            habit: Some(collections.habit_ref(self.habit_id.trim())),
            timestamp: Some(self.timestamp()),
            status: Some(self.status),
            rating,
            notes: non_empty(&self.notes),
        })
    }

    /// Edits leave the habit reference untouched.
    pub fn to_update(&self) -> Result<TrackingUpdate, FormError> {
        let rating = self.validate()?;
        Ok(TrackingUpdate {
            timestamp: Some(self.timestamp()),
            status: Some(self.status),
            rating,
            notes: non_empty(&self.notes),
        })
    }
}

fn parse_clock(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
        .map(truncate_to_minute)
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    use chrono::Timelike;
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckInForm {
    pub date: NaiveDate,
    pub completed: Vec<String>,
    pub notes: String,
}

impl CheckInForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today,
            completed: Vec::new(),
            notes: String::new(),
        }
    }

    pub fn from_check_in(check_in: &CheckIn, today: NaiveDate) -> Self {
        Self {
            date: check_in.fields.date.unwrap_or(today),
            completed: check_in.fields.completed_habit_names(),
            notes: check_in.fields.day_notes.clone().unwrap_or_default(),
        }
    }

    pub fn toggle(&mut self, name: &str) {
        if let Some(pos) = self.completed.iter().position(|n| n == name) {
            self.completed.remove(pos);
        } else {
            self.completed.push(name.to_string());
        }
    }

    pub fn is_checked(&self, name: &str) -> bool {
        self.completed.iter().any(|n| n == name)
    }

    pub fn to_fields(&self) -> CheckInFields {
        CheckInFields {
            date: Some(self.date),
            completed_habits: Some(join_habit_names(&self.completed)),
            day_notes: non_empty(&self.notes),
        }
    }
}
