use std::fmt::Write;

use habit_core::{DashboardMetrics, DashboardSnapshot, TrackingEntry};

use crate::app::HabitRow;

const BAR_WIDTH: usize = 20;

pub fn render_dashboard(
    snapshot: &DashboardSnapshot,
    metrics: &DashboardMetrics,
    habits: &[HabitRow<'_>],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Gewohnheiten – {}", metrics.today.format("%d.%m.%Y"));
    let _ = writeln!(
        out,
        "{:.0}% heute erledigt · Serie {} {} · Woche {}/{} · Ø Bewertung {}",
        metrics.completion_percentage,
        metrics.streak,
        if metrics.streak == 1 { "Tag" } else { "Tage" },
        metrics.week.completed,
        metrics.week.total,
        format_average(metrics.average_rating),
    );

    out.push_str("\nHeute\n");
    if habits.is_empty() {
        out.push_str("  (keine aktiven Gewohnheiten)\n");
    }
    for row in habits {
        let mark = if row.completed_today { 'x' } else { ' ' };
        let category = row
            .habit
            .fields
            .category
            .map(|c| c.label())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  [{mark}] {:<28} {:<18} {}",
            row.habit.fields.display_name(),
            category,
            row.habit.id
        );
    }

    out.push_str("\nLetzte 7 Tage\n");
    let peak = metrics
        .series
        .iter()
        .map(|point| point.completed)
        .max()
        .unwrap_or(0)
        .max(1);
    for point in &metrics.series {
        let width = point.completed * BAR_WIDTH / peak;
        let marker = if point.is_today { " ← heute" } else { "" };
        let _ = writeln!(
            out,
            "  {} {:>2} {}{}",
            point.label,
            point.completed,
            "█".repeat(width),
            marker
        );
    }

    out.push_str("\nLetzte Einträge\n");
    let index = snapshot.habit_index();
    let recent: Vec<_> = metrics
        .recent_entry_ids
        .iter()
        .filter_map(|id| snapshot.find_entry(id))
        .collect();
    if recent.is_empty() {
        out.push_str("  (noch keine Einträge)\n");
    }
    for entry in recent {
        let _ = writeln!(out, "  {}", format_entry(entry, &index.habit_name_for(entry)));
    }

    out.push_str("\nCheck-ins\n");
    let check_ins = snapshot.sorted_check_ins();
    if check_ins.is_empty() {
        out.push_str("  (noch keine Check-ins)\n");
    }
    for check_in in check_ins {
        let date = check_in
            .fields
            .date
            .map(|d| d.format("%d.%m.%Y").to_string())
            .unwrap_or_else(|| "-".to_string());
        let names = check_in.fields.completed_habit_names().join(", ");
        let _ = write!(out, "  {date:<10} {names}");
        if let Some(notes) = check_in.fields.day_notes.as_deref() {
            let _ = write!(out, " – {notes}");
        }
        let _ = writeln!(out, "  ({})", check_in.id);
    }
    out
}

pub fn format_entry(entry: &TrackingEntry, habit_name: &str) -> String {
    let fields = &entry.fields;
    let when = fields
        .timestamp
        .as_deref()
        .filter(|ts| !ts.is_empty())
        .map(|ts| ts.replacen('T', " ", 1))
        .unwrap_or_else(|| "-".to_string());
    let status = fields.status.map(|s| s.label()).unwrap_or("-");
    let stars = fields
        .rating
        .map(|r| "★".repeat(r as usize))
        .unwrap_or_default();
    let mut line = format!("{when:<16} {habit_name:<24} {status:<13} {stars:<5}");
    if let Some(notes) = fields.notes.as_deref() {
        line.push(' ');
        line.push_str(notes);
    }
    line.push_str(&format!("  ({})", entry.id));
    line
}

pub fn render_error(message: &str) -> String {
    format!("Fehler beim Laden: {message}\nErneut versuchen mit `habit_dashboard show`.\n")
}

fn format_average(value: f64) -> String {
    if value == 0.0 {
        "–".to_string()
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use habit_core::model::EntryStatus;
    use habit_core::{HabitFields, Record, RecordRef, TrackingFields};

    #[test]
    fn dashboard_lists_checked_habits_and_unknown_references() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 22).unwrap();
        let snapshot = DashboardSnapshot {
            habits: vec![Record::new(
                "H1",
                HabitFields {
                    name: Some("Lesen".into()),
                    ..HabitFields::default()
                },
            )],
            entries: vec![
                Record::new(
                    "T1",
                    TrackingFields {
                        habit: Some(RecordRef::new("c", "H1")),
                        timestamp: Some("2025-10-22T07:00".into()),
                        status: Some(EntryStatus::Done),
                        rating: Some(4),
                        notes: None,
                    },
                ),
                Record::new(
                    "T2",
                    TrackingFields {
                        habit: Some(RecordRef::new("c", "gone")),
                        timestamp: Some("2025-10-21T07:00".into()),
                        status: Some(EntryStatus::Skipped),
                        ..TrackingFields::default()
                    },
                ),
            ],
            check_ins: Vec::new(),
        };
        let metrics = DashboardMetrics::compute(&snapshot, today);
        let rows = vec![HabitRow {
            habit: &snapshot.habits[0],
            completed_today: true,
        }];
        let text = render_dashboard(&snapshot, &metrics, &rows);
        assert!(text.contains("100% heute erledigt"));
        assert!(text.contains("[x] Lesen"));
        assert!(text.contains("Unbekannt"));
        assert!(text.contains("★★★★"));
        assert!(text.contains("Mi."));
        assert!(text.contains("(noch keine Check-ins)"));
        let feed = text.split("Letzte Einträge").nth(1).unwrap();
        assert!(feed.find("(T1)").unwrap() < feed.find("(T2)").unwrap());

        let mut trimmed = metrics.clone();
        trimmed.recent_entry_ids = vec!["T2".to_string()];
        let text = render_dashboard(&snapshot, &trimmed, &rows);
        assert!(text.contains("(T2)"));
        assert!(!text.contains("(T1)"));
    }
}
