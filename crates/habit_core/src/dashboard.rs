use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::{self, DayPoint, WeekStats, RECENT_ENTRIES_LIMIT};
use crate::model::{CheckIn, Habit, TrackingEntry};
use crate::reference::HabitIndex;

/// The three collections as fetched in one load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub habits: Vec<Habit>,
    pub entries: Vec<TrackingEntry>,
    pub check_ins: Vec<CheckIn>,
}

impl DashboardSnapshot {
    pub fn habit_index(&self) -> HabitIndex<'_> {
        HabitIndex::new(&self.habits)
    }

    pub fn active_habits(&self) -> Vec<&Habit> {
        metrics::active_habits(&self.habits)
    }

    /// Newest check-in first; undated ones at the end.
    pub fn sorted_check_ins(&self) -> Vec<&CheckIn> {
        let mut sorted: Vec<&CheckIn> = self.check_ins.iter().collect();
        sorted.sort_by(|a, b| match (a.fields.date, b.fields.date) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        sorted
    }

    pub fn find_habit(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    pub fn find_entry(&self, id: &str) -> Option<&TrackingEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn find_check_in(&self, id: &str) -> Option<&CheckIn> {
        self.check_ins.iter().find(|check_in| check_in.id == id)
    }
}

/// Every KPI the dashboard shows, computed in one pass over a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub today: NaiveDate,
    pub active_habit_count: usize,
    pub today_entry_count: usize,
    pub completion_percentage: f64,
    pub completed_today: BTreeSet<String>,
    pub streak: u32,
    pub week: WeekStats,
    pub average_rating: f64,
    pub series: Vec<DayPoint>,
    /// Ids of the most recent entries, newest first.
    pub recent_entry_ids: Vec<String>,
}

impl DashboardMetrics {
    pub fn compute(snapshot: &DashboardSnapshot, today: NaiveDate) -> Self {
        let habits = &snapshot.habits;
        let entries = &snapshot.entries;
        let metrics = Self {
            today,
            active_habit_count: metrics::active_habits(habits).len(),
            today_entry_count: metrics::entries_on(entries, today).len(),
            completion_percentage: metrics::completion_percentage(habits, entries, today),
            completed_today: metrics::completed_habit_ids_on(entries, today),
            streak: metrics::streak(entries, today),
            week: metrics::week_stats(habits, entries, today),
            average_rating: metrics::average_rating(entries),
            series: metrics::seven_day_series(entries, today),
            recent_entry_ids: metrics::recent_entries(entries, RECENT_ENTRIES_LIMIT)
                .into_iter()
                .map(|entry| entry.id.clone())
                .collect(),
        };
        tracing::debug!(
            %today,
            habits = habits.len(),
            entries = entries.len(),
            streak = metrics.streak,
            "dashboard metrics computed"
        );
        metrics
    }

    pub fn is_completed_today(&self, habit_id: &str) -> bool {
        self.completed_today.contains(habit_id)
    }
}
