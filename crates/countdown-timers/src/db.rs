use rusqlite::Connection;

use crate::error::StoreError;

/// Initialise the timers schema in `conn`.
///
/// Creates the `timers` table (idempotent) and an index on `created_at` so
/// the newest-first listing does not need a full sort.
pub fn init_db(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS timers (
            id             TEXT    NOT NULL PRIMARY KEY,
            duration       INTEGER NOT NULL CHECK (duration > 0),
            elapsed_time   INTEGER NOT NULL DEFAULT 0
                           CHECK (elapsed_time >= 0 AND elapsed_time <= duration),
            status         TEXT    NOT NULL DEFAULT 'idle',
            urgency_level  INTEGER NOT NULL DEFAULT 0
                           CHECK (urgency_level BETWEEN 0 AND 3),
            version        INTEGER NOT NULL DEFAULT 0,
            created_at     TEXT    NOT NULL,   -- RFC 3339, UTC, microseconds
            updated_at     TEXT    NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_timers_created_at ON timers (created_at);
        ",
    )?;
    Ok(())
}
