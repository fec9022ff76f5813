//! Dashboard KPIs derived from the loaded collections.
//!
//! Every function here is pure. "Today" is always passed in by the caller,
//! which derives it from system-local wall-clock time.

use std::collections::{BTreeSet, HashSet};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::model::{Habit, TrackingEntry};

pub const RECENT_ENTRIES_LIMIT: usize = 10;
pub const SERIES_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekStats {
    pub completed: usize,
    /// Never below `completed`.
    pub total: usize,
}

impl WeekStats {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayPoint {
    pub date: NaiveDate,
    pub label: &'static str,
    pub completed: usize,
    pub is_today: bool,
}

pub fn active_habits(habits: &[Habit]) -> Vec<&Habit> {
    habits
        .iter()
        .filter(|habit| habit.fields.is_active())
        .collect()
}

pub fn entries_on(entries: &[TrackingEntry], day: NaiveDate) -> Vec<&TrackingEntry> {
    entries
        .iter()
        .filter(|entry| entry.fields.date() == Some(day))
        .collect()
}

fn done_on(entries: &[TrackingEntry], day: NaiveDate) -> impl Iterator<Item = &TrackingEntry> {
    entries
        .iter()
        .filter(move |entry| entry.fields.is_done() && entry.fields.date() == Some(day))
}

/// Distinct habit ids with at least one done entry on `day`.
pub fn completed_habit_ids_on(entries: &[TrackingEntry], day: NaiveDate) -> BTreeSet<String> {
    done_on(entries, day)
        .filter_map(|entry| entry.fields.habit_id())
        .map(str::to_string)
        .collect()
}

pub fn completion_percentage(habits: &[Habit], entries: &[TrackingEntry], today: NaiveDate) -> f64 {
    let active = active_habits(habits).len();
    if active == 0 {
        return 0.0;
    }
    let completed = completed_habit_ids_on(entries, today).len();
    (completed as f64 / active as f64 * 100.0).min(100.0)
}

/// Consecutive days with a done entry, counted back from today, or from
/// yesterday when nothing is done yet today.
pub fn streak(entries: &[TrackingEntry], today: NaiveDate) -> u32 {
    let done_days: HashSet<NaiveDate> = entries
        .iter()
        .filter(|entry| entry.fields.is_done())
        .filter_map(|entry| entry.fields.date())
        .collect();

    let mut cursor = if done_days.contains(&today) {
        Some(today)
    } else {
        today.pred_opt()
    };

    let mut count = 0;
    while let Some(day) = cursor {
        if !done_days.contains(&day) {
            break;
        }
        count += 1;
        cursor = day.pred_opt();
    }
    count
}

pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// Completed vs. expected done entries for the Monday-based week containing
/// `today`.
pub fn week_stats(habits: &[Habit], entries: &[TrackingEntry], today: NaiveDate) -> WeekStats {
    let start = week_start(today);
    let end = start + Duration::days(6);
    let elapsed_days = today.weekday().num_days_from_monday() as usize + 1;
    let expected = active_habits(habits).len() * elapsed_days;

    let completed = entries
        .iter()
        .filter(|entry| entry.fields.is_done())
        .filter_map(|entry| entry.fields.date())
        .filter(|date| (start..=end).contains(date))
        .count();

    WeekStats {
        completed,
        total: expected.max(completed),
    }
}

/// Mean over entries rated 1..=5, regardless of date; 0 when none are rated.
pub fn average_rating(entries: &[TrackingEntry]) -> f64 {
    let ratings: Vec<u8> = entries
        .iter()
        .filter_map(|entry| entry.fields.rating)
        .filter(|rating| *rating > 0)
        .collect();
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|r| *r as u32).sum();
    sum as f64 / ratings.len() as f64
}

/// One point per day for the week ending today, oldest first.
pub fn seven_day_series(entries: &[TrackingEntry], today: NaiveDate) -> Vec<DayPoint> {
    (0..SERIES_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset as i64);
            DayPoint {
                date,
                label: weekday_label(date.weekday()),
                completed: done_on(entries, date).count(),
                is_today: date == today,
            }
        })
        .collect()
}

/// Newest first by raw timestamp string; entries without a timestamp sort last.
pub fn recent_entries(entries: &[TrackingEntry], limit: usize) -> Vec<&TrackingEntry> {
    let mut sorted: Vec<&TrackingEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| {
        let a_ts = a.fields.timestamp.as_deref().unwrap_or_default();
        let b_ts = b.fields.timestamp.as_deref().unwrap_or_default();
        b_ts.cmp(a_ts)
    });
    sorted.truncate(limit);
    sorted
}

pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mo.",
        Weekday::Tue => "Di.",
        Weekday::Wed => "Mi.",
        Weekday::Thu => "Do.",
        Weekday::Fri => "Fr.",
        Weekday::Sat => "Sa.",
        Weekday::Sun => "So.",
    }
}
