use rusqlite::Connection;

use crate::error::Result;

/// Initialise the sessions table. Safe to call on every startup.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            tenant_id   TEXT NOT NULL,
            conv_id     TEXT NOT NULL,
            state       TEXT NOT NULL,
            channel     TEXT NOT NULL,
            payload     TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            last_seen_at TEXT NOT NULL,
            PRIMARY KEY (tenant_id, conv_id)
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_last_seen
            ON sessions(last_seen_at);",
    )?;
    Ok(())
}
