use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{types::Type, Connection, OptionalExtension, Row};
use tracing::{debug, info, instrument};

use crate::db::init_db;
use crate::error::StoreError;
use crate::store::TimerStore;
use crate::types::{Timer, TimerChange, TimerId, TimerStatus, UpdateOutcome, UrgencyLevel};

const TIMER_COLUMNS: &str =
    "id, duration, elapsed_time, status, urgency_level, version, created_at, updated_at";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed [`TimerStore`].
///
/// Wraps a single connection in a `Mutex`. The connection is held in an
/// `Option` so the process entry point can close it explicitly while other
/// handles still exist; any call after [`SqliteTimerStore::close`] fails
/// with [`StoreError::Unavailable`].
pub struct SqliteTimerStore {
    db: Mutex<Option<Connection>>,
}

impl SqliteTimerStore {
    /// Wrap an already-open connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self, StoreError> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(Some(conn)),
        })
    }

    /// Open (or create) the database file at `path` in WAL mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        info!(path = %path.as_ref().display(), "timer store opened");
        Self::new(conn)
    }

    /// Private in-memory database; used by tests and throwaway runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Flush and close the connection. Idempotent.
    pub fn close(&self) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        match guard.take() {
            Some(conn) => {
                conn.close().map_err(|(_, e)| StoreError::Database(e))?;
                info!("timer store closed");
            }
            None => debug!("timer store already closed"),
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>, StoreError> {
        self.db
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let guard = self.lock()?;
        let conn = guard
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("store is closed".to_string()))?;
        f(conn)
    }
}

impl TimerStore for SqliteTimerStore {
    #[instrument(skip(self))]
    fn create(&self, duration: u32) -> Result<Timer, StoreError> {
        let id = TimerId::new();
        let now = timestamp(Utc::now());
        self.with_conn(|conn| {
            let timer = conn
                .query_row(
                    &format!(
                        "INSERT INTO timers
                         (id, duration, elapsed_time, status, urgency_level, version,
                          created_at, updated_at)
                         VALUES (?1, ?2, 0, ?3, 0, 0, ?4, ?4)
                         RETURNING {TIMER_COLUMNS}"
                    ),
                    rusqlite::params![id.as_str(), duration, TimerStatus::Idle.as_str(), now],
                    row_to_timer,
                )
                .map_err(decode_error)?;
            info!(timer_id = %timer.id, duration, "timer created");
            Ok(timer)
        })
    }

    #[instrument(skip(self, id), fields(timer_id = %id))]
    fn get_by_id(&self, id: &TimerId) -> Result<Option<Timer>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {TIMER_COLUMNS} FROM timers WHERE id = ?1"),
                [id.as_str()],
                row_to_timer,
            )
            .optional()
            .map_err(decode_error)
        })
    }

    #[instrument(skip(self))]
    fn list_all(&self) -> Result<Vec<Timer>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {TIMER_COLUMNS} FROM timers ORDER BY created_at DESC, rowid DESC"
            ))?;
            let timers = stmt
                .query_map([], row_to_timer)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(decode_error)?;
            debug!(count = timers.len(), "timers listed");
            Ok(timers)
        })
    }

    #[instrument(skip(self, id, change), fields(timer_id = %id))]
    fn update(
        &self,
        id: &TimerId,
        expected_version: u64,
        change: &TimerChange,
    ) -> Result<UpdateOutcome, StoreError> {
        let expected = i64::try_from(expected_version)
            .map_err(|_| StoreError::Corrupt(format!("version {expected_version} out of range")))?;
        let now = timestamp(Utc::now());
        self.with_conn(|conn| {
            let updated = conn
                .query_row(
                    &format!(
                        "UPDATE timers
                         SET elapsed_time = ?1, status = ?2, urgency_level = ?3,
                             duration = COALESCE(?4, duration),
                             version = version + 1, updated_at = ?5
                         WHERE id = ?6 AND version = ?7
                         RETURNING {TIMER_COLUMNS}"
                    ),
                    rusqlite::params![
                        change.elapsed_time,
                        change.status.as_str(),
                        change.urgency_level.as_u8(),
                        change.duration,
                        now,
                        id.as_str(),
                        expected,
                    ],
                    row_to_timer,
                )
                .optional()
                .map_err(decode_error)?;

            if let Some(timer) = updated {
                debug!(status = %timer.status, elapsed = timer.elapsed_time, "timer updated");
                return Ok(UpdateOutcome::Updated(timer));
            }

            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM timers WHERE id = ?1)",
                [id.as_str()],
                |row| row.get(0),
            )?;
            if exists {
                debug!("version mismatch, update rejected");
                Ok(UpdateOutcome::Stale)
            } else {
                Ok(UpdateOutcome::Missing)
            }
        })
    }
}

/// Fixed-width UTC timestamp so lexical order equals chronological order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decoding failures are reported as corruption rather than driver errors.
fn decode_error(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            StoreError::Corrupt(e.to_string())
        }
        other => StoreError::Database(other),
    }
}

fn conversion_failure(idx: usize, ty: Type, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, msg.into())
}

/// Map a SQLite row (in `TIMER_COLUMNS` order) to a `Timer`.
fn row_to_timer(row: &Row<'_>) -> rusqlite::Result<Timer> {
    let status: String = row.get(3)?;
    let status = status
        .parse::<TimerStatus>()
        .map_err(|e| conversion_failure(3, Type::Text, e))?;

    let urgency_level = UrgencyLevel::try_from(row.get::<_, u8>(4)?)
        .map_err(|e| conversion_failure(4, Type::Integer, e))?;

    let version = u64::try_from(row.get::<_, i64>(5)?)
        .map_err(|e| conversion_failure(5, Type::Integer, e.to_string()))?;

    Ok(Timer {
        id: TimerId(row.get(0)?),
        duration: row.get(1)?,
        elapsed_time: row.get(2)?,
        status,
        urgency_level,
        version,
        created_at: parse_timestamp(row, 6)?,
        updated_at: parse_timestamp(row, 7)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, Type::Text, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteTimerStore {
        SqliteTimerStore::open_in_memory().expect("in-memory store")
    }

    fn change(elapsed_time: u32, status: TimerStatus, urgency: UrgencyLevel) -> TimerChange {
        TimerChange {
            elapsed_time,
            status,
            urgency_level: urgency,
            duration: None,
        }
    }

    #[test]
    fn create_returns_idle_timer() {
        let store = store();
        let timer = store.create(60).unwrap();
        assert_eq!(timer.duration, 60);
        assert_eq!(timer.elapsed_time, 0);
        assert_eq!(timer.status, TimerStatus::Idle);
        assert_eq!(timer.urgency_level, UrgencyLevel::Calm);
        assert_eq!(timer.version, 0);
        assert_eq!(timer.created_at, timer.updated_at);
        assert!(uuid::Uuid::parse_str(timer.id.as_str()).is_ok());
    }

    #[test]
    fn get_by_id_roundtrips_and_misses_cleanly() {
        let store = store();
        let created = store.create(45).unwrap();
        let fetched = store.get_by_id(&created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(store.get_by_id(&TimerId::new()).unwrap().is_none());
    }

    #[test]
    fn update_rewrites_triple_and_bumps_version() {
        let store = store();
        let timer = store.create(100).unwrap();
        let outcome = store
            .update(
                &timer.id,
                timer.version,
                &change(50, TimerStatus::Running, UrgencyLevel::Elevated),
            )
            .unwrap();
        let UpdateOutcome::Updated(updated) = outcome.clone() else {
            panic!("expected update, got {outcome:?}");
        };
        assert_eq!(updated.elapsed_time, 50);
        assert_eq!(updated.status, TimerStatus::Running);
        assert_eq!(updated.urgency_level, UrgencyLevel::Elevated);
        assert_eq!(updated.duration, 100);
        assert_eq!(updated.version, 1);
        assert_eq!(updated.created_at, timer.created_at);
        assert!(updated.updated_at >= timer.updated_at);

        let persisted = store.get_by_id(&timer.id).unwrap().unwrap();
        assert_eq!(persisted, updated);
    }

    #[test]
    fn update_with_duration_changes_duration() {
        let store = store();
        let timer = store.create(100).unwrap();
        let outcome = store
            .update(
                &timer.id,
                0,
                &TimerChange {
                    duration: Some(30),
                    ..change(0, TimerStatus::Idle, UrgencyLevel::Calm)
                },
            )
            .unwrap();
        assert!(matches!(outcome, UpdateOutcome::Updated(t) if t.duration == 30));
    }

    #[test]
    fn stale_version_is_rejected_without_writing() {
        let store = store();
        let timer = store.create(100).unwrap();
        let running = change(0, TimerStatus::Running, UrgencyLevel::Calm);
        assert!(matches!(
            store.update(&timer.id, 0, &running).unwrap(),
            UpdateOutcome::Updated(_)
        ));
        let outcome = store
            .update(&timer.id, 0, &change(10, TimerStatus::Paused, UrgencyLevel::Calm))
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Stale);

        let persisted = store.get_by_id(&timer.id).unwrap().unwrap();
        assert_eq!(persisted.status, TimerStatus::Running);
        assert_eq!(persisted.version, 1);
    }

    #[test]
    fn update_unknown_id_is_missing() {
        let store = store();
        let outcome = store
            .update(&TimerId::new(), 0, &change(1, TimerStatus::Running, UrgencyLevel::Calm))
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Missing);
    }

    #[test]
    fn elapsed_beyond_duration_is_refused_by_schema() {
        let store = store();
        let timer = store.create(10).unwrap();
        let overrun = change(11, TimerStatus::Running, UrgencyLevel::Critical);
        let result = store.update(&timer.id, 0, &overrun);
        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[test]
    fn list_all_is_newest_first() {
        let store = store();
        let first = store.create(10).unwrap();
        let second = store.create(20).unwrap();
        let third = store.create(30).unwrap();
        let ids: Vec<_> = store.list_all().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    fn corrupt_status(store: &SqliteTimerStore, id: &TimerId) {
        store
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE timers SET status = 'exploded' WHERE id = ?1",
                    [id.as_str()],
                )?;
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn corrupt_status_is_reported_not_panicked() {
        let store = store();
        let timer = store.create(10).unwrap();
        corrupt_status(&store, &timer.id);
        assert!(matches!(store.get_by_id(&timer.id), Err(StoreError::Corrupt(_))));
        assert!(matches!(store.list_all(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn list_all_fails_instead_of_dropping_bad_rows() {
        let store = store();
        let good = store.create(10).unwrap();
        let bad = store.create(20).unwrap();
        corrupt_status(&store, &bad.id);

        let err = store.list_all().unwrap_err();
        assert!(matches!(&err, StoreError::Corrupt(msg) if msg.contains("exploded")));
        assert!(store.get_by_id(&good.id).unwrap().is_some());
    }

    #[test]
    fn closed_store_is_unavailable() {
        let store = store();
        store.close().unwrap();
        store.close().unwrap();
        assert!(matches!(store.create(5), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.list_all(), Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn open_file_persists_across_reopen() {
        let dir = std::env::temp_dir().join(format!("countdown-store-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("timers.db");

        let store = SqliteTimerStore::open(&path).unwrap();
        let timer = store.create(90).unwrap();
        store.close().unwrap();

        let reopened = SqliteTimerStore::open(&path).unwrap();
        assert_eq!(reopened.get_by_id(&timer.id).unwrap().unwrap().duration, 90);
        reopened.close().unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }
}
