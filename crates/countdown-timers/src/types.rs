use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque timer identifier (UUID v4 string). Assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(pub String);

impl TimerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TimerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TimerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TimerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    /// Created or reset; elapsed time is zero.
    #[default]
    Idle,
    /// Accepting ticks.
    Running,
    /// Stopped part-way; keeps its elapsed time.
    Paused,
    /// Ticked all the way to its duration.
    Complete,
}

impl TimerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
            TimerStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TimerStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "idle" => Ok(TimerStatus::Idle),
            "running" => Ok(TimerStatus::Running),
            "paused" => Ok(TimerStatus::Paused),
            "complete" => Ok(TimerStatus::Complete),
            other => Err(format!("unknown timer status: {other}")),
        }
    }
}

/// Visual escalation level, serialised as the bare integer 0–3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum UrgencyLevel {
    #[default]
    Calm = 0,
    Elevated = 1,
    High = 2,
    Critical = 3,
}

impl UrgencyLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<UrgencyLevel> for u8 {
    fn from(level: UrgencyLevel) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for UrgencyLevel {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(UrgencyLevel::Calm),
            1 => Ok(UrgencyLevel::Elevated),
            2 => Ok(UrgencyLevel::High),
            3 => Ok(UrgencyLevel::Critical),
            other => Err(format!("urgency level out of range: {other}")),
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// A persisted timer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub id: TimerId,
    /// Total seconds the timer runs for. Always positive.
    pub duration: u32,
    /// Seconds accumulated so far, in `[0, duration]`.
    pub elapsed_time: u32,
    pub status: TimerStatus,
    /// Always `compute_urgency(elapsed_time, duration)`.
    pub urgency_level: UrgencyLevel,
    /// Bumped by the store on every successful update.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The mutable fields written back by a single store update.
///
/// `duration` is `None` for plain lifecycle transitions, which leave the
/// stored duration untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerChange {
    pub elapsed_time: u32,
    pub status: TimerStatus,
    pub urgency_level: UrgencyLevel,
    pub duration: Option<u32>,
}

impl TimerChange {
    /// True when applying the change would leave `timer` exactly as it is.
    pub fn is_noop_for(&self, timer: &Timer) -> bool {
        self.elapsed_time == timer.elapsed_time
            && self.status == timer.status
            && self.urgency_level == timer.urgency_level
            && self.duration.map_or(true, |d| d == timer.duration)
    }
}

/// Result of a conditional (version-checked) update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The row matched the expected version and was rewritten.
    Updated(Timer),
    /// The row exists but another writer got there first.
    Stale,
    /// No row with that id.
    Missing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrips_through_str() {
        for status in [
            TimerStatus::Idle,
            TimerStatus::Running,
            TimerStatus::Paused,
            TimerStatus::Complete,
        ] {
            let parsed: TimerStatus = status.to_string().parse().expect("parse failed");
            assert_eq!(parsed, status);
        }
        assert!("stopped".parse::<TimerStatus>().is_err());
    }

    #[test]
    fn urgency_serialises_as_integer() {
        let json = serde_json::to_string(&UrgencyLevel::High).unwrap();
        assert_eq!(json, "2");
        let level: UrgencyLevel = serde_json::from_str("3").unwrap();
        assert_eq!(level, UrgencyLevel::Critical);
        assert!(serde_json::from_str::<UrgencyLevel>("4").is_err());
    }

    #[test]
    fn timer_json_uses_snake_case_fields() {
        let now = Utc::now();
        let timer = Timer {
            id: TimerId::from("t-1"),
            duration: 60,
            elapsed_time: 20,
            status: TimerStatus::Running,
            urgency_level: UrgencyLevel::Elevated,
            version: 4,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&timer).unwrap();
        assert_eq!(value["id"], "t-1");
        assert_eq!(value["elapsed_time"], 20);
        assert_eq!(value["status"], "running");
        assert_eq!(value["urgency_level"], 1);
    }

    #[test]
    fn change_without_duration_is_noop_when_triple_matches() {
        let now = Utc::now();
        let timer = Timer {
            id: TimerId::new(),
            duration: 10,
            elapsed_time: 0,
            status: TimerStatus::Idle,
            urgency_level: UrgencyLevel::Calm,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        let change = TimerChange {
            elapsed_time: 0,
            status: TimerStatus::Idle,
            urgency_level: UrgencyLevel::Calm,
            duration: None,
        };
        assert!(change.is_noop_for(&timer));
        assert!(!TimerChange { duration: Some(11), ..change }.is_noop_for(&timer));
    }
}
