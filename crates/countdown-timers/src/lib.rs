//! `countdown-timers`: timer records, their lifecycle state machine and
//! urgency levels, persisted through a pluggable [`TimerStore`].
//!
//! # Lifecycle
//!
//! ```text
//!   create ──► idle ──start──► running ──tick×duration──► complete
//!                ▲               │  ▲                        │
//!                │             stop start                    │
//!                │               ▼  │                        │
//!                └───reset─── paused ◄──────reset────────────┘
//! ```
//!
//! `reset` returns a timer in any state to idle.
//!
//! Urgency levels (0–3) are derived from `elapsed_time / duration` by
//! [`urgency::compute_urgency`] and stored alongside every mutation.

pub mod db;
pub mod error;
pub mod lifecycle;
pub mod service;
pub mod sqlite;
pub mod store;
pub mod types;
pub mod urgency;

pub use error::{Result, StoreError, TimerError};
pub use service::TimerService;
pub use sqlite::SqliteTimerStore;
pub use store::TimerStore;
pub use types::{Timer, TimerChange, TimerId, TimerStatus, UpdateOutcome, UrgencyLevel};
pub use urgency::compute_urgency;
