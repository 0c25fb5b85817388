use tracing::{debug, info, instrument, warn};

use countdown_core::config::{TimersConfig, DEFAULT_CONFLICT_RETRIES};

use crate::error::{Result, TimerError};
use crate::lifecycle::{
    plan_reset, plan_set_duration, plan_start, plan_stop, plan_tick, validate_duration,
};
use crate::store::TimerStore;
use crate::types::{Timer, TimerChange, TimerId, UpdateOutcome};

/// Timer lifecycle operations on top of a [`TimerStore`].
///
/// Holds no per-timer state: every operation re-reads the timer, plans the
/// transition with the pure functions in [`crate::lifecycle`], and writes
/// it back with a version-checked update. When another writer wins the race
/// the transition is re-planned against the fresh row, up to
/// `max_conflict_retries` extra times, then reported as
/// [`TimerError::Conflict`].
pub struct TimerService<S> {
    store: S,
    max_conflict_retries: u32,
}

impl<S: TimerStore> TimerService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }

    pub fn from_config(store: S, config: &TimersConfig) -> Self {
        Self::new(store).with_conflict_retries(config.max_conflict_retries)
    }

    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[instrument(skip(self))]
    pub fn create_timer(&self, duration: i64) -> Result<Timer> {
        let duration = validate_duration(duration)?;
        Ok(self.store.create(duration)?)
    }

    pub fn get_timer(&self, id: &TimerId) -> Result<Timer> {
        self.fetch(id)
    }

    /// All timers, newest first.
    pub fn list_timers(&self) -> Result<Vec<Timer>> {
        Ok(self.store.list_all()?)
    }

    /// Revise the duration; elapsed time is clamped to the new value.
    #[instrument(skip(self, id), fields(timer_id = %id))]
    pub fn set_duration(&self, id: &TimerId, duration: i64) -> Result<Timer> {
        let duration = validate_duration(duration)?;
        self.transition(id, "set_duration", |timer| {
            Ok(plan_set_duration(timer, duration))
        })
    }

    #[instrument(skip(self, id), fields(timer_id = %id))]
    pub fn start_timer(&self, id: &TimerId) -> Result<Timer> {
        self.transition(id, "start", plan_start)
    }

    #[instrument(skip(self, id), fields(timer_id = %id))]
    pub fn stop_timer(&self, id: &TimerId) -> Result<Timer> {
        self.transition(id, "stop", |timer| Ok(plan_stop(timer)))
    }

    #[instrument(skip(self, id), fields(timer_id = %id))]
    pub fn reset_timer(&self, id: &TimerId) -> Result<Timer> {
        self.transition(id, "reset", |timer| Ok(plan_reset(timer)))
    }

    /// Advance a running timer by exactly one second. Not idempotent.
    #[instrument(skip(self, id), fields(timer_id = %id))]
    pub fn tick_timer(&self, id: &TimerId) -> Result<Timer> {
        self.transition(id, "tick", |timer| Ok(plan_tick(timer)))
    }

    fn fetch(&self, id: &TimerId) -> Result<Timer> {
        self.store
            .get_by_id(id)?
            .ok_or_else(|| TimerError::NotFound { id: id.to_string() })
    }

    /// Read, plan, compare-and-swap; re-plan on a stale version.
    fn transition<F>(&self, id: &TimerId, op: &'static str, plan: F) -> Result<Timer>
    where
        F: Fn(&Timer) -> Result<Option<TimerChange>>,
    {
        let attempts = self.max_conflict_retries.saturating_add(1);
        for attempt in 1..=attempts {
            let current = self.fetch(id)?;
            let Some(change) = plan(&current)? else {
                debug!(op, status = %current.status, "no-op transition");
                return Ok(current);
            };

            match self.store.update(id, current.version, &change)? {
                UpdateOutcome::Updated(timer) => {
                    info!(
                        op,
                        from = %current.status,
                        to = %timer.status,
                        elapsed = timer.elapsed_time,
                        urgency = %timer.urgency_level,
                        "timer transition"
                    );
                    return Ok(timer);
                }
                UpdateOutcome::Missing => {
                    return Err(TimerError::NotFound { id: id.to_string() });
                }
                UpdateOutcome::Stale => {
                    debug!(op, attempt, "lost optimistic-concurrency race, re-planning");
                }
            }
        }

        warn!(op, attempts, "giving up after repeated concurrent modifications");
        Err(TimerError::Conflict {
            id: id.to_string(),
            attempts,
        })
    }
}
