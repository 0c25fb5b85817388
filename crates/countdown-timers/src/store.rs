use crate::error::StoreError;
use crate::types::{Timer, TimerChange, TimerId, UpdateOutcome};

/// Durable keyed storage for timer records.
///
/// Implementations own all persisted state; the service never caches rows
/// between calls. `update` must be a single atomic compare-and-swap on the
/// row's `version`: it rewrites the mutable fields only when the stored
/// version still equals `expected_version`, bumping the version and
/// `updated_at` as part of the same statement.
pub trait TimerStore: Send + Sync {
    /// Insert a new idle timer with zero elapsed time.
    fn create(&self, duration: u32) -> Result<Timer, StoreError>;

    fn get_by_id(&self, id: &TimerId) -> Result<Option<Timer>, StoreError>;

    /// Every timer, newest first.
    fn list_all(&self) -> Result<Vec<Timer>, StoreError>;

    fn update(
        &self,
        id: &TimerId,
        expected_version: u64,
        change: &TimerChange,
    ) -> Result<UpdateOutcome, StoreError>;
}

impl<S: TimerStore + ?Sized> TimerStore for std::sync::Arc<S> {
    fn create(&self, duration: u32) -> Result<Timer, StoreError> {
        (**self).create(duration)
    }

    fn get_by_id(&self, id: &TimerId) -> Result<Option<Timer>, StoreError> {
        (**self).get_by_id(id)
    }

    fn list_all(&self) -> Result<Vec<Timer>, StoreError> {
        (**self).list_all()
    }

    fn update(
        &self,
        id: &TimerId,
        expected_version: u64,
        change: &TimerChange,
    ) -> Result<UpdateOutcome, StoreError> {
        (**self).update(id, expected_version, change)
    }
}
