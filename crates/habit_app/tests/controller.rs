use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use habit_app::app::{DashboardController, LoadState, Notice};
use habit_app::cli::{execute, Cli};
use habit_app::forms::{CheckInForm, HabitForm, TrackingForm};
use habit_core::model::EntryStatus;
use habit_core::{Collections, EntityKind, Record};
use habit_store::MemoryRecordStore;
use serde_json::{json, Map, Value};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 22).expect("valid date")
}

fn now() -> NaiveDateTime {
    today().and_hms_opt(7, 30, 12).expect("valid time")
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn habit_ref(id: &str) -> String {
    Collections::default().habit_ref(id).encode()
}

/// Two active habits, one inactive, one entry for H1 today.
fn seeded() -> Arc<MemoryRecordStore> {
    let store = Arc::new(MemoryRecordStore::new());
    store.seed(
        EntityKind::Habits,
        Record::new("H1", object(json!({ "gewohnheit_name": "Lesen", "aktiv": true }))),
    );
    store.seed(
        EntityKind::Habits,
        Record::new("H2", object(json!({ "gewohnheit_name": "Joggen" }))),
    );
    store.seed(
        EntityKind::Habits,
        Record::new("H3", object(json!({ "gewohnheit_name": "Rauchen", "aktiv": false }))),
    );
    store.seed(
        EntityKind::TrackingEntries,
        Record::new(
            "T1",
            object(json!({
                "gewohnheit": habit_ref("H1"),
                "datum_uhrzeit": "2025-10-22T06:00",
                "status": "erledigt",
                "bewertung": 4
            })),
        ),
    );
    store
}

async fn controller(store: &Arc<MemoryRecordStore>) -> DashboardController {
    let mut controller = DashboardController::new(store.clone(), Collections::default());
    controller.reload().await.expect("initial load");
    controller
}

#[tokio::test]
async fn failed_load_is_terminal_until_manual_reload() {
    let store = seeded();
    store.set_unavailable(EntityKind::CheckIns, true);
    let mut controller = DashboardController::new(store.clone(), Collections::default());
    assert_eq!(controller.state(), &LoadState::Loading);

    assert!(controller.reload().await.is_err());
    assert!(matches!(controller.state(), LoadState::Failed(_)));
    assert!(controller.snapshot().is_none());
    assert!(controller.today_habits(today()).is_empty());

    store.set_unavailable(EntityKind::CheckIns, false);
    controller.reload().await.expect("retry succeeds");
    assert_eq!(controller.snapshot().map(|s| s.habits.len()), Some(3));
}

#[tokio::test]
async fn every_mutation_triggers_a_full_reload() {
    let store = seeded();
    let mut controller = controller(&store).await;
    let before = store.list_calls();

    let mut form = HabitForm::new(today());
    form.name = "Meditieren".into();
    controller.save_habit(&form, None).await.expect("habit saved");

    assert_eq!(store.list_calls(), before + 3);
    assert_eq!(
        controller.drain_notices(),
        vec![Notice::Success("Gewohnheit erstellt".into())]
    );
    let snapshot = controller.snapshot().expect("ready");
    assert!(snapshot
        .habits
        .iter()
        .any(|h| h.fields.name.as_deref() == Some("Meditieren")));
}

#[tokio::test]
async fn validation_errors_become_notices_without_store_calls() {
    let store = seeded();
    let mut controller = controller(&store).await;
    let before = store.list_calls();

    let form = HabitForm::new(today());
    assert!(controller.save_habit(&form, None).await.is_err());
    assert_eq!(store.list_calls(), before);
    assert_eq!(
        controller.notices(),
        &[Notice::Error("Bitte gib einen Namen ein".into())]
    );
    assert_eq!(store.records(EntityKind::Habits).len(), 3);
}

#[tokio::test]
async fn failed_mutation_keeps_snapshot_and_form() {
    let store = seeded();
    let mut controller = controller(&store).await;
    let loaded = controller.snapshot().cloned();

    store.set_unavailable(EntityKind::CheckIns, true);
    let mut form = CheckInForm::new(today());
    form.toggle("Lesen");
    assert!(controller.save_check_in(&form, None).await.is_err());

    assert_eq!(controller.snapshot().cloned(), loaded);
    assert!(form.is_checked("Lesen"));
    match controller.drain_notices().as_slice() {
        [Notice::Error(message)] => assert!(message.starts_with("Fehler: ")),
        other => panic!("unexpected notices: {other:?}"),
    }

    assert!(controller.delete_entry("missing").await.is_err());
    assert_eq!(
        controller.drain_notices(),
        vec![Notice::Error("Fehler beim Löschen".into())]
    );
}

#[tokio::test]
async fn quick_log_records_a_done_entry_for_now() {
    let store = seeded();
    let mut controller = controller(&store).await;

    controller.quick_log("H2", now()).await.expect("logged");
    assert_eq!(
        controller.drain_notices(),
        vec![Notice::Success("\"Joggen\" erledigt!".into())]
    );

    let snapshot = controller.snapshot().expect("ready");
    let logged = snapshot
        .entries
        .iter()
        .find(|e| e.fields.habit_id() == Some("H2"))
        .expect("entry for H2");
    assert_eq!(logged.fields.timestamp.as_deref(), Some("2025-10-22T07:30"));
    assert_eq!(logged.fields.status, Some(EntryStatus::Done));
    assert_eq!(logged.fields.rating, None);

    let metrics = controller.metrics(today()).expect("metrics");
    assert_eq!(metrics.completion_percentage, 100.0);
    assert!(metrics.is_completed_today("H2"));

    assert!(controller.quick_log("nope", now()).await.is_err());
}

#[tokio::test]
async fn inactive_habits_are_hidden_from_today_and_check_in_choices() {
    let store = seeded();
    let controller = controller(&store).await;

    let rows = controller.today_habits(today());
    let ids: Vec<_> = rows.iter().map(|row| row.habit.id.as_str()).collect();
    assert_eq!(ids, vec!["H1", "H2"]);
    assert!(rows[0].completed_today);
    assert!(!rows[1].completed_today);

    assert_eq!(controller.check_in_choices(), vec!["Lesen", "Joggen"]);
}

#[tokio::test]
async fn deleting_a_habit_keeps_its_entries() {
    let store = seeded();
    let mut controller = controller(&store).await;

    controller.delete_habit("H1").await.expect("deleted");
    let snapshot = controller.snapshot().expect("ready");
    assert_eq!(snapshot.habits.len(), 2);
    assert_eq!(snapshot.entries.len(), 1);
    assert_eq!(
        snapshot.habit_index().habit_name_for(&snapshot.entries[0]),
        "Unbekannt"
    );
}

#[tokio::test]
async fn editing_an_entry_keeps_its_habit_reference() {
    let store = seeded();
    let mut controller = controller(&store).await;

    let entry = controller
        .snapshot()
        .and_then(|s| s.find_entry("T1"))
        .cloned()
        .expect("seeded entry");
    let mut form = TrackingForm::from_entry(&entry, now());
    form.status = EntryStatus::Partial;
    form.rating = 0;
    controller.save_entry(&form, Some("T1")).await.expect("updated");

    let raw = store.records(EntityKind::TrackingEntries);
    assert_eq!(raw[0].fields["gewohnheit"], json!(habit_ref("H1")));
    assert_eq!(raw[0].fields["status"], json!("teilweise"));
    assert!(!raw[0].fields.contains_key("bewertung"));
    assert_eq!(
        controller.drain_notices(),
        vec![Notice::Success("Eintrag aktualisiert".into())]
    );
}

#[tokio::test]
async fn entry_edit_can_clear_rating_and_notes() {
    let store = seeded();
    store.seed(
        EntityKind::TrackingEntries,
        Record::new(
            "T2",
            object(json!({
                "gewohnheit": habit_ref("H2"),
                "datum_uhrzeit": "2025-10-21T18:00",
                "status": "erledigt",
                "bewertung": 2,
                "notizen": "x"
            })),
        ),
    );
    let mut controller = controller(&store).await;
    assert_eq!(controller.metrics(today()).map(|m| m.average_rating), Some(3.0));

    let cli = Cli::try_parse_from([
        "habit_dashboard",
        "entry",
        "edit",
        "T2",
        "--rating",
        "0",
        "--notes",
        "",
    ])
    .expect("valid arguments");
    let command = cli.command.expect("subcommand");
    execute(&mut controller, command, now(), today())
        .await
        .expect("entry updated");

    let snapshot = controller.snapshot().expect("ready");
    let edited = snapshot.find_entry("T2").expect("entry kept");
    assert_eq!(edited.fields.rating, None);
    assert_eq!(edited.fields.notes, None);
    assert_eq!(edited.fields.habit_id(), Some("H2"));
    assert_eq!(edited.fields.timestamp.as_deref(), Some("2025-10-21T18:00"));
    assert_eq!(controller.metrics(today()).map(|m| m.average_rating), Some(4.0));
}
