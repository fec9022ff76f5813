//! Error types for record-store access

use habit_core::EntityKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with a non-success status.
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Raised by the in-memory store when a collection is marked unavailable.
    #[error("{0} collection unavailable")]
    Unavailable(EntityKind),
}

pub type Result<T> = std::result::Result<T, StoreError>;
