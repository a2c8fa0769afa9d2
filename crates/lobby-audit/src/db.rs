use rusqlite::Connection;

use crate::error::Result;

/// Initialise the events table. Safe to call on every startup — `IF NOT
/// EXISTS` throughout, mirroring the rest of this codebase's schema setup.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS events (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            conv_id           TEXT NOT NULL,
            tenant_id         TEXT NOT NULL,
            event_name        TEXT NOT NULL,
            previous_state    TEXT NOT NULL,
            reason            TEXT,
            counters_snapshot TEXT NOT NULL,
            user_message      TEXT NOT NULL,
            ts                TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_events_conv
            ON events(tenant_id, conv_id, ts);",
    )?;
    Ok(())
}
