//! Command-line surface of the habit dashboard.
//!
//! Every invocation loads the full dashboard, applies at most one mutation
//! and prints the refreshed view.

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use habit_core::model::{Category, EntryStatus, Frequency};
use tracing::info;

use crate::app::{AppConfig, DashboardController, LoadState, Notice};
use crate::forms::{CheckInForm, HabitForm, TrackingForm};
use crate::render::{render_dashboard, render_error};

#[derive(Debug, Parser)]
#[command(name = "habit_dashboard")]
#[command(about = "Track habits, daily entries and check-ins against a hosted record store")]
pub struct Cli {
    /// Override the local date used as "today" (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the dashboard (default)
    #[command(visible_alias = "show")]
    Dashboard,

    /// Create, edit or delete habits
    #[command(subcommand)]
    Habit(HabitCommand),

    /// Create, edit or delete tracking entries
    #[command(subcommand)]
    Entry(EntryCommand),

    /// Create, edit or delete daily check-ins
    #[command(subcommand)]
    Checkin(CheckInCommand),

    /// Mark a habit as done right now
    Log {
        /// Record id of the habit
        habit_id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum HabitCommand {
    Add(HabitArgs),
    Edit {
        id: String,
        #[command(flatten)]
        args: HabitArgs,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct HabitArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// gesundheit, fitness, ernaehrung, produktivitaet, ...
    #[arg(long)]
    pub category: Option<Category>,
    /// taeglich, mehrmals_woche, woechentlich, monatlich
    #[arg(long)]
    pub frequency: Option<Frequency>,
    #[arg(long)]
    pub start: Option<NaiveDate>,
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Debug, Subcommand)]
pub enum EntryCommand {
    Add {
        /// Record id of the habit; defaults to the first active habit
        #[arg(long)]
        habit: Option<String>,
        #[command(flatten)]
        args: EntryArgs,
    },
    Edit {
        id: String,
        #[command(flatten)]
        args: EntryArgs,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct EntryArgs {
    /// YYYY-MM-DDTHH:MM
    #[arg(long, value_parser = parse_timestamp)]
    pub at: Option<NaiveDateTime>,
    /// erledigt, teilweise, uebersprungen
    #[arg(long)]
    pub status: Option<EntryStatus>,
    /// 1 to 5, 0 clears the rating
    #[arg(long)]
    pub rating: Option<u8>,
    /// An empty value clears the notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum CheckInCommand {
    Add {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Name of a completed habit; repeat for several
        #[arg(long = "done")]
        done: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Flip a habit name in the completed list; repeat for several
        #[arg(long = "toggle")]
        toggle: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Delete {
        id: String,
    },
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
}

pub async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let store = config.connect()?;
    let mut controller = DashboardController::new(store, config.collections().clone());
    let now = Local::now().naive_local();
    let today = cli.today.unwrap_or_else(|| now.date());

    let command = cli.command.unwrap_or(Command::Dashboard);
    let outcome = match controller.reload().await {
        Ok(()) => execute(&mut controller, command, now, today).await,
        Err(err) => Err(err),
    };

    for notice in controller.drain_notices() {
        match notice {
            Notice::Success(message) => println!("✓ {message}"),
            Notice::Error(message) => eprintln!("✗ {message}"),
        }
    }
    print!("{}", render(&controller, today));
    outcome
}

pub fn render(controller: &DashboardController, today: NaiveDate) -> String {
    match controller.state() {
        LoadState::Loading => "Lade Daten...\n".to_string(),
        LoadState::Failed(message) => render_error(message),
        LoadState::Ready(snapshot) => match controller.metrics(today) {
            Some(metrics) => render_dashboard(snapshot, &metrics, &controller.today_habits(today)),
            None => String::new(),
        },
    }
}

pub async fn execute(
    controller: &mut DashboardController,
    command: Command,
    now: NaiveDateTime,
    today: NaiveDate,
) -> Result<()> {
    info!(?command, "executing command");
    match command {
        Command::Dashboard => Ok(()),
        Command::Log { habit_id } => controller.quick_log(&habit_id, now).await,
        Command::Habit(HabitCommand::Add(args)) => {
            let mut form = HabitForm::new(today);
            args.apply(&mut form);
            controller.save_habit(&form, None).await
        }
        Command::Habit(HabitCommand::Edit { id, args }) => {
            let habit = lookup(controller, "Gewohnheit", &id, |s| s.find_habit(&id).cloned())?;
            let mut form = HabitForm::from_habit(&habit, today);
            args.apply(&mut form);
            controller.save_habit(&form, Some(&id)).await
        }
        Command::Habit(HabitCommand::Delete { id }) => controller.delete_habit(&id).await,
        Command::Entry(EntryCommand::Add { habit, args }) => {
            let mut form = {
                let active = controller
                    .snapshot()
                    .map(|s| s.active_habits())
                    .unwrap_or_default();
                TrackingForm::new(&active, now)
            };
            if let Some(habit) = habit {
                form.habit_id = habit;
            }
            args.apply(&mut form);
            controller.save_entry(&form, None).await
        }
        Command::Entry(EntryCommand::Edit { id, args }) => {
            let entry = lookup(controller, "Eintrag", &id, |s| s.find_entry(&id).cloned())?;
            let mut form = TrackingForm::from_entry(&entry, now);
            args.apply(&mut form);
            controller.save_entry(&form, Some(&id)).await
        }
        Command::Entry(EntryCommand::Delete { id }) => controller.delete_entry(&id).await,
        Command::Checkin(CheckInCommand::Add { date, done, notes }) => {
            let mut form = CheckInForm::new(date.unwrap_or(today));
            for name in &done {
                form.toggle(name);
            }
            if let Some(notes) = notes {
                form.notes = notes;
            }
            controller.save_check_in(&form, None).await
        }
        Command::Checkin(CheckInCommand::Edit {
            id,
            date,
            toggle,
            notes,
        }) => {
            let check_in =
                lookup(controller, "Check-in", &id, |s| s.find_check_in(&id).cloned())?;
            let mut form = CheckInForm::from_check_in(&check_in, today);
            if let Some(date) = date {
                form.date = date;
            }
            for name in &toggle {
                form.toggle(name);
            }
            if let Some(notes) = notes {
                form.notes = notes;
            }
            controller.save_check_in(&form, Some(&id)).await
        }
        Command::Checkin(CheckInCommand::Delete { id }) => controller.delete_check_in(&id).await,
    }
}

fn lookup<T>(
    controller: &DashboardController,
    what: &str,
    id: &str,
    find: impl FnOnce(&habit_core::DashboardSnapshot) -> Option<T>,
) -> Result<T> {
    controller
        .snapshot()
        .and_then(find)
        .ok_or_else(|| anyhow!("{what} `{id}` nicht gefunden"))
}

impl HabitArgs {
    fn apply(self, form: &mut HabitForm) {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
        if let Some(category) = self.category {
            form.category = category;
        }
        if let Some(frequency) = self.frequency {
            form.frequency = frequency;
        }
        if let Some(start) = self.start {
            form.start_date = start;
        }
        if let Some(active) = self.active {
            form.active = active;
        }
    }
}

impl EntryArgs {
    fn apply(self, form: &mut TrackingForm) {
        if let Some(at) = self.at {
            form.date = at.date();
            form.time = at.time();
        }
        if let Some(status) = self.status {
            form.status = status;
        }
        if let Some(rating) = self.rating {
            form.rating = rating;
        }
        if let Some(notes) = self.notes {
            form.notes = notes;
        }
    }
}
