//! Pure state-machine transitions.
//!
//! Each function looks at the current `Timer` and returns the change that
//! the operation would persist, or `None` when the operation leaves the
//! timer untouched (no store write is issued in that case).
//!
//! | From                   | Operation      | To                   |
//! |------------------------|----------------|----------------------|
//! | idle, paused           | start          | running              |
//! | running                | start          | (no-op)              |
//! | complete               | start          | `InvalidState`       |
//! | running                | stop           | paused               |
//! | idle, paused, complete | stop           | (no-op)              |
//! | any                    | reset          | idle, elapsed 0      |
//! | running                | tick           | running or complete  |
//! | idle, paused, complete | tick           | (no-op)              |
//! | any                    | set_duration   | same (complete may become paused) |

use crate::error::{Result, TimerError};
use crate::types::{Timer, TimerChange, TimerStatus, UrgencyLevel};
use crate::urgency::urgency_for;

/// Validate a caller-supplied duration and narrow it to the stored width.
pub fn validate_duration(duration: i64) -> Result<u32> {
    if duration <= 0 {
        return Err(TimerError::InvalidArgument(format!(
            "duration must be a positive integer, got {duration}"
        )));
    }
    u32::try_from(duration).map_err(|_| {
        TimerError::InvalidArgument(format!(
            "duration must be at most {} seconds, got {duration}",
            u32::MAX
        ))
    })
}

pub fn plan_start(timer: &Timer) -> Result<Option<TimerChange>> {
    match timer.status {
        TimerStatus::Idle | TimerStatus::Paused => Ok(Some(TimerChange {
            elapsed_time: timer.elapsed_time,
            status: TimerStatus::Running,
            urgency_level: urgency_for(timer.elapsed_time, timer.duration),
            duration: None,
        })),
        TimerStatus::Running => Ok(None),
        TimerStatus::Complete => Err(TimerError::InvalidState {
            id: timer.id.to_string(),
            status: timer.status,
        }),
    }
}

pub fn plan_stop(timer: &Timer) -> Option<TimerChange> {
    if timer.status != TimerStatus::Running {
        return None;
    }
    Some(TimerChange {
        elapsed_time: timer.elapsed_time,
        status: TimerStatus::Paused,
        urgency_level: urgency_for(timer.elapsed_time, timer.duration),
        duration: None,
    })
}

pub fn plan_reset(timer: &Timer) -> Option<TimerChange> {
    let change = TimerChange {
        elapsed_time: 0,
        status: TimerStatus::Idle,
        urgency_level: UrgencyLevel::Calm,
        duration: None,
    };
    (!change.is_noop_for(timer)).then_some(change)
}

pub fn plan_tick(timer: &Timer) -> Option<TimerChange> {
    if timer.status != TimerStatus::Running {
        return None;
    }
    let elapsed_time = timer.elapsed_time.saturating_add(1).min(timer.duration);
    if elapsed_time >= timer.duration {
        return Some(TimerChange {
            elapsed_time: timer.duration,
            status: TimerStatus::Complete,
            urgency_level: UrgencyLevel::Critical,
            duration: None,
        });
    }
    Some(TimerChange {
        elapsed_time,
        status: TimerStatus::Running,
        urgency_level: urgency_for(elapsed_time, timer.duration),
        duration: None,
    })
}

/// Revise the duration, clamping elapsed time so it never exceeds it.
///
/// A complete timer that is given more time than it has used becomes
/// paused, so it can be started again.
pub fn plan_set_duration(timer: &Timer, duration: u32) -> Option<TimerChange> {
    let elapsed_time = timer.elapsed_time.min(duration);
    let status = match timer.status {
        TimerStatus::Complete if elapsed_time < duration => TimerStatus::Paused,
        other => other,
    };
    let change = TimerChange {
        elapsed_time,
        status,
        urgency_level: urgency_for(elapsed_time, duration),
        duration: Some(duration),
    };
    (!change.is_noop_for(timer)).then_some(change)
}
