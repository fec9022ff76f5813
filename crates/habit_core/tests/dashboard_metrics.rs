use chrono::{Duration, NaiveDate};
use habit_core::metrics::{self, RECENT_ENTRIES_LIMIT};
use habit_core::model::EntryStatus;
use habit_core::{
    DashboardMetrics, DashboardSnapshot, Habit, HabitFields, Record, RecordRef, TrackingEntry,
    TrackingFields,
};

const HABITS: &str = "69947e07b7b8c3499c21cd9b";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 7).expect("valid date")
}

fn habit(id: &str) -> Habit {
    Record::new(
        id,
        HabitFields {
            name: Some(format!("Habit {id}")),
            active: Some(true),
            ..HabitFields::default()
        },
    )
}

fn done(id: &str, habit: &str, day: NaiveDate) -> TrackingEntry {
    logged(id, habit, Some(format!("{}T08:00", day.format("%Y-%m-%d"))), EntryStatus::Done)
}

fn logged(id: &str, habit: &str, timestamp: Option<String>, status: EntryStatus) -> TrackingEntry {
    Record::new(
        id,
        TrackingFields {
            habit: Some(RecordRef::new(HABITS, habit)),
            timestamp,
            status: Some(status),
            ..TrackingFields::default()
        },
    )
}

#[test]
fn duplicate_completion_counts_once() {
    let snapshot = DashboardSnapshot {
        habits: vec![habit("H1")],
        entries: vec![done("T1", "H1", today()), done("T2", "H1", today())],
        check_ins: Vec::new(),
    };
    let metrics = DashboardMetrics::compute(&snapshot, today());
    assert_eq!(metrics.completion_percentage, 100.0);
    assert_eq!(metrics.completed_today.len(), 1);
    assert!(metrics.is_completed_today("H1"));

    let single = DashboardSnapshot {
        entries: vec![done("T1", "H1", today())],
        ..snapshot.clone()
    };
    assert_eq!(
        DashboardMetrics::compute(&single, today()).completion_percentage,
        metrics.completion_percentage
    );
}

#[test]
fn gap_day_ends_streak() {
    let entries = vec![
        done("T1", "H1", today()),
        done("T2", "H1", today() - Duration::days(1)),
        done("T3", "H1", today() - Duration::days(3)),
    ];
    assert_eq!(metrics::streak(&entries, today()), 2);

    let mut longer = entries.clone();
    longer.push(done("T4", "H1", today() - Duration::days(2)));
    assert_eq!(metrics::streak(&longer, today()), 4);
}

#[test]
fn empty_tracking_yields_empty_aggregates() {
    let metrics = DashboardMetrics::compute(&DashboardSnapshot::default(), today());
    assert_eq!(metrics.average_rating, 0.0);
    assert!(metrics.recent_entry_ids.is_empty());
    assert_eq!(metrics.series.len(), 7);
    assert!(metrics.series.iter().all(|point| point.completed == 0));
}

#[test]
fn entry_without_timestamp_only_shows_in_feed() {
    let mut undated = logged("T0", "H1", Some(String::new()), EntryStatus::Done);
    undated.fields.rating = Some(3);
    let entries = vec![
        undated,
        done("T1", "H1", today()),
        done("T2", "H1", today() - Duration::days(1)),
    ];
    let snapshot = DashboardSnapshot {
        habits: vec![habit("H1")],
        entries,
        check_ins: Vec::new(),
    };
    let metrics = DashboardMetrics::compute(&snapshot, today());

    assert_eq!(metrics.today_entry_count, 1);
    assert_eq!(metrics.series.iter().map(|p| p.completed).sum::<usize>(), 2);
    assert_eq!(metrics.streak, 2);
    assert_eq!(metrics.average_rating, 3.0);
    assert_eq!(metrics.recent_entry_ids, vec!["T1", "T2", "T0"]);
    assert_eq!(
        metrics
            .recent_entry_ids
            .iter()
            .filter(|id| id.as_str() == "T0")
            .count(),
        1
    );
}

#[test]
fn deleting_habit_keeps_its_entries_in_feed_and_average() {
    let mut rated = done("T1", "H2", today());
    rated.fields.rating = Some(4);
    let before = DashboardSnapshot {
        habits: vec![habit("H1"), habit("H2")],
        entries: vec![rated, done("T2", "H1", today())],
        check_ins: Vec::new(),
    };
    let after = DashboardSnapshot {
        habits: vec![habit("H1")],
        ..before.clone()
    };

    let m_before = DashboardMetrics::compute(&before, today());
    let m_after = DashboardMetrics::compute(&after, today());
    assert_eq!(m_before.average_rating, m_after.average_rating);
    assert_eq!(
        m_before.recent_entry_ids.len(),
        m_after.recent_entry_ids.len()
    );
    assert_eq!(after.habit_index().habit_name_for(&after.entries[0]), "Unbekannt");
}

#[test]
fn completion_percentage_stays_in_bounds() {
    let habit_sets: Vec<Vec<Habit>> = vec![
        Vec::new(),
        vec![habit("H1")],
        vec![habit("H1"), habit("H2"), habit("H3")],
    ];
    let entry_sets: Vec<Vec<TrackingEntry>> = vec![
        Vec::new(),
        vec![done("T1", "H1", today())],
        (0..20)
            .map(|i| done(&format!("T{i}"), &format!("H{i}"), today()))
            .collect(),
    ];
    for habits in &habit_sets {
        for entries in &entry_sets {
            let pct = metrics::completion_percentage(habits, entries, today());
            assert!((0.0..=100.0).contains(&pct), "{pct} out of range");
            if habits.is_empty() {
                assert_eq!(pct, 0.0);
            }
            let week = metrics::week_stats(habits, entries, today());
            assert!(week.total >= week.completed);
        }
    }
}

#[test]
fn feed_is_capped_at_limit() {
    let entries: Vec<_> = (0..25)
        .map(|i| done(&format!("T{i}"), "H1", today() - Duration::days(i)))
        .collect();
    let recent = metrics::recent_entries(&entries, RECENT_ENTRIES_LIMIT);
    assert_eq!(recent.len(), RECENT_ENTRIES_LIMIT);
    assert_eq!(recent[0].id, "T0");
}
