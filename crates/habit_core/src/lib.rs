pub mod dashboard;
pub mod metrics;
pub mod model;
pub mod reference;
pub mod wire;

pub use crate::dashboard::{DashboardMetrics, DashboardSnapshot};
pub use crate::model::{
    CheckIn, CheckInFields, Collections, Entity, EntityKind, Habit, HabitFields, RawRecord,
    Record, TrackingEntry, TrackingFields,
};
pub use crate::reference::{HabitIndex, RecordRef};
