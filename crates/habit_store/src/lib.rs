//! Client side of the external record store.
//!
//! [`RecordStore`] is the generic CRUD contract; [`HttpRecordStore`] talks to
//! the REST service and [`MemoryRecordStore`] keeps everything in process.
//! [`EntityStore`] layers typed entity access and the concurrent dashboard
//! load on top of either.

pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod memory;

pub use client::{HttpRecordStore, RecordStore};
pub use config::StoreConfig;
pub use entity::EntityStore;
pub use error::{Result, StoreError};
pub use memory::MemoryRecordStore;
