use rusqlite::ErrorCode;
use thiserror::Error;

use crate::types::TimerStatus;

/// Failures raised by a [`crate::store::TimerStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The store cannot serve requests right now (poisoned lock, closed handle).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded into a `Timer`.
    #[error("Corrupt timer row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// True when retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Database(e) => matches!(
                e.sqlite_error_code(),
                Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
            ),
            StoreError::Corrupt(_) => false,
        }
    }
}

/// Errors returned by the timer lifecycle service.
#[derive(Debug, Error)]
pub enum TimerError {
    /// Caller supplied a value the service refuses (e.g. a non-positive duration).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No timer with the given ID exists in the store.
    #[error("Timer not found: {id}")]
    NotFound { id: String },

    /// The requested transition is not allowed from the timer's current status.
    #[error("Timer {id} cannot do that while {status}")]
    InvalidState { id: String, status: TimerStatus },

    /// Concurrent writers kept winning the optimistic-concurrency race.
    #[error("Timer {id} was modified concurrently ({attempts} attempts)")]
    Conflict { id: String, attempts: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TimerError {
    /// Short error code string sent to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            TimerError::InvalidArgument(_) => "INVALID_ARGUMENT",
            TimerError::NotFound { .. } => "NOT_FOUND",
            TimerError::InvalidState { .. } => "INVALID_STATE",
            TimerError::Conflict { .. } => "CONFLICT",
            TimerError::Store(e) if e.is_transient() => "STORE_UNAVAILABLE",
            TimerError::Store(StoreError::Corrupt(_)) => "STORE_CORRUPT",
            TimerError::Store(_) => "STORE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, TimerError>;
