use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use habit_core::model::EntryStatus;
use habit_core::{
    CheckInFields, Collections, DashboardMetrics, DashboardSnapshot, Habit, HabitFields,
    TrackingFields,
};
use habit_store::{EntityStore, HttpRecordStore, RecordStore, StoreConfig};
use tracing::{debug, info, instrument, warn};

use crate::forms::{format_timestamp, CheckInForm, HabitForm, TrackingForm};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) store_url: Option<String>,
    pub(crate) api_key: Option<String>,
    pub(crate) timeout_secs: u64,
    pub(crate) collections: Collections,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("HABIT_STORE_URL") {
            let url = url.trim();
            if !url.is_empty() {
                config.store_url = Some(url.to_string());
            }
        }
        if let Ok(key) = std::env::var("HABIT_STORE_API_KEY") {
            if !key.trim().is_empty() {
                config.api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(timeout) = std::env::var("HABIT_STORE_TIMEOUT_SECS") {
            if let Ok(value) = timeout.trim().parse::<u64>() {
                if value > 0 {
                    config.timeout_secs = value;
                }
            }
        }
        if let Ok(id) = std::env::var("HABIT_COLLECTION_HABITS") {
            config.collections.habits = id.trim().to_string();
        }
        if let Ok(id) = std::env::var("HABIT_COLLECTION_TRACKING") {
            config.collections.tracking_entries = id.trim().to_string();
        }
        if let Ok(id) = std::env::var("HABIT_COLLECTION_CHECKINS") {
            config.collections.check_ins = id.trim().to_string();
        }
        Ok(config)
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    pub fn store_config(&self) -> StoreConfig {
        let mut store = StoreConfig {
            api_key: self.api_key.clone(),
            timeout_secs: self.timeout_secs,
            collections: self.collections.clone(),
            ..StoreConfig::default()
        };
        if let Some(url) = &self.store_url {
            store.base_url = url.clone();
        }
        store
    }

    pub fn connect(&self) -> Result<Arc<dyn RecordStore>> {
        let store_config = self.store_config();
        info!(base_url = %store_config.base_url, "connecting to record store");
        let store =
            HttpRecordStore::new(store_config).context("failed to build record store client")?;
        Ok(Arc::new(store))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_url: None,
            api_key: None,
            timeout_secs: 30,
            collections: Collections::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready(DashboardSnapshot),
    /// The whole dashboard is unavailable until a reload succeeds.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HabitRow<'a> {
    pub habit: &'a Habit,
    pub completed_today: bool,
}

pub struct DashboardController {
    store: EntityStore,
    collections: Collections,
    state: LoadState,
    notices: Vec<Notice>,
}

impl DashboardController {
    pub fn new(store: Arc<dyn RecordStore>, collections: Collections) -> Self {
        Self {
            store: EntityStore::new(store),
            collections,
            state: LoadState::Loading,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        match &self.state {
            LoadState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Re-fetch all three collections and replace the snapshot in one step.
    #[instrument(skip(self))]
    pub async fn reload(&mut self) -> Result<()> {
        let start = Instant::now();
        match self.store.load_snapshot().await {
            Ok(snapshot) => {
                self.state = LoadState::Ready(snapshot);
                info!(elapsed_ms = %start.elapsed().as_millis(), "reload completed");
                Ok(())
            }
            Err(err) => {
                warn!(%err, "reload failed");
                let message = err.to_string();
                self.state = LoadState::Failed(message.clone());
                Err(anyhow!(message).context("failed to load dashboard"))
            }
        }
    }

    pub fn metrics(&self, today: NaiveDate) -> Option<DashboardMetrics> {
        self.snapshot()
            .map(|snapshot| DashboardMetrics::compute(snapshot, today))
    }

    /// Active habits with their checked state for `today`.
    pub fn today_habits(&self, today: NaiveDate) -> Vec<HabitRow<'_>> {
        let Some(snapshot) = self.snapshot() else {
            return Vec::new();
        };
        let completed = habit_core::metrics::completed_habit_ids_on(&snapshot.entries, today);
        snapshot
            .active_habits()
            .into_iter()
            .map(|habit| HabitRow {
                habit,
                completed_today: completed.contains(&habit.id),
            })
            .collect()
    }

    /// Names offered in the check-in form: active habits only.
    pub fn check_in_choices(&self) -> Vec<String> {
        self.snapshot()
            .map(|snapshot| {
                snapshot
                    .active_habits()
                    .into_iter()
                    .map(|habit| habit.fields.display_name().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn save_habit(&mut self, form: &HabitForm, editing: Option<&str>) -> Result<()> {
        let fields = match form.to_fields() {
            Ok(fields) => fields,
            Err(err) => return self.reject(err.to_string()),
        };
        let store = self.store.clone();
        match editing {
            Some(id) => {
                let op = store.update::<HabitFields>(id, &fields);
                self.commit(op, "Gewohnheit aktualisiert".to_string(), None)
                    .await
            }
            None => {
                let op = store.create(&fields);
                self.commit(op, "Gewohnheit erstellt".to_string(), None).await
            }
        }
    }

    pub async fn save_entry(&mut self, form: &TrackingForm, editing: Option<&str>) -> Result<()> {
        let store = self.store.clone();
        match editing {
            Some(id) => {
                let update = match form.to_update() {
                    Ok(update) => update,
                    Err(err) => return self.reject(err.to_string()),
                };
                let op = store.update::<TrackingFields>(id, &update);
                self.commit(op, "Eintrag aktualisiert".to_string(), None)
                    .await
            }
            None => {
                let fields = match form.to_fields(&self.collections) {
                    Ok(fields) => fields,
                    Err(err) => return self.reject(err.to_string()),
                };
                let op = store.create(&fields);
                self.commit(op, "Tracking gespeichert".to_string(), None)
                    .await
            }
        }
    }

    pub async fn save_check_in(&mut self, form: &CheckInForm, editing: Option<&str>) -> Result<()> {
        let fields = form.to_fields();
        let store = self.store.clone();
        match editing {
            Some(id) => {
                let op = store.update::<CheckInFields>(id, &fields);
                self.commit(op, "Check-in aktualisiert".to_string(), None)
                    .await
            }
            None => {
                let op = store.create(&fields);
                self.commit(op, "Check-in gespeichert".to_string(), None)
                    .await
            }
        }
    }

    /// Tracking entries of the habit stay in the store.
    pub async fn delete_habit(&mut self, id: &str) -> Result<()> {
        let store = self.store.clone();
        let op = store.delete::<HabitFields>(id);
        self.commit(
            op,
            "Gewohnheit gelöscht".to_string(),
            Some("Fehler beim Löschen"),
        )
        .await
    }

    pub async fn delete_entry(&mut self, id: &str) -> Result<()> {
        let store = self.store.clone();
        let op = store.delete::<TrackingFields>(id);
        self.commit(op, "Eintrag gelöscht".to_string(), Some("Fehler beim Löschen"))
            .await
    }

    pub async fn delete_check_in(&mut self, id: &str) -> Result<()> {
        let store = self.store.clone();
        let op = store.delete::<CheckInFields>(id);
        self.commit(op, "Check-in gelöscht".to_string(), Some("Fehler beim Löschen"))
            .await
    }

    /// One-tap completion: a done entry for `habit_id` stamped with `now`.
    pub async fn quick_log(&mut self, habit_id: &str, now: NaiveDateTime) -> Result<()> {
        let name = self
            .snapshot()
            .and_then(|snapshot| snapshot.find_habit(habit_id))
            .map(|habit| habit.fields.display_name().to_string());
        let Some(name) = name else {
            return self.reject(format!("Gewohnheit `{habit_id}` nicht gefunden"));
        };
        let fields = TrackingFields {
            habit: Some(self.collections.habit_ref(habit_id)),
            timestamp: Some(format_timestamp(now)),
            status: Some(EntryStatus::Done),
            ..TrackingFields::default()
        };
        let store = self.store.clone();
        let op = store.create(&fields);
        self.commit(
            op,
            format!("\"{name}\" erledigt!"),
            Some("Fehler beim Speichern"),
        )
        .await
    }

    fn reject(&mut self, message: String) -> Result<()> {
        debug!(%message, "form rejected");
        self.notices.push(Notice::Error(message.clone()));
        Err(anyhow!(message))
    }

    /// Await a mutation, then reload everything. Nothing is applied locally.
    async fn commit<T, F>(
        &mut self,
        op: F,
        success: String,
        failure: Option<&str>,
    ) -> Result<()>
    where
        F: Future<Output = habit_store::Result<T>>,
    {
        match op.await {
            Ok(_) => {
                info!(%success, "mutation applied");
                self.notices.push(Notice::Success(success));
                self.reload().await
            }
            Err(err) => {
                warn!(%err, "mutation failed");
                let message = match failure {
                    Some(fixed) => fixed.to_string(),
                    None => format!("Fehler: {err}"),
                };
                self.notices.push(Notice::Error(message));
                Err(anyhow::Error::new(err).context("mutation rejected by record store"))
            }
        }
    }
}
