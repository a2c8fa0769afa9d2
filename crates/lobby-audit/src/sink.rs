use std::sync::Mutex;

use lobby_core::Counters;
use rusqlite::Connection;
use tracing::{instrument, warn};

use crate::error::Result;
use crate::types::EventRecord;

/// Append-only SQLite-backed audit sink (§4.14). Appends are best-effort:
/// failures are logged at `WARN` and swallowed here so a storage hiccup
/// never interrupts the message pipeline (§5, §7).
pub struct AuditSink {
    db: Mutex<Connection>,
}

impl AuditSink {
    /// Wraps an already-open, already-`init_db`'d connection.
    pub fn new(conn: Connection) -> Self {
        Self { db: Mutex::new(conn) }
    }

    /// Never returns an error to the caller — see module docs.
    #[instrument(skip(self, record), fields(conv_id = %record.conv_id, event = %record.event_name))]
    pub fn append(&self, record: &EventRecord) {
        if let Err(e) = self.try_append(record) {
            warn!(error = %e, "audit append failed, continuing without it");
        }
    }

    fn try_append(&self, record: &EventRecord) -> Result<()> {
        let counters_json = serde_json::to_string(&record.counters_snapshot)?;
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO events
             (conv_id, tenant_id, event_name, previous_state, reason, counters_snapshot, user_message, ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                record.conv_id,
                record.tenant_id,
                record.event_name,
                record.previous_state,
                record.reason,
                counters_json,
                record.user_message,
                record.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Event history for one conversation, oldest first. Used by tests to
    /// assert on emitted reasons (§4.14).
    #[instrument(skip(self))]
    pub fn events_for(&self, tenant_id: &str, conv_id: &str) -> Result<Vec<EventRecord>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT conv_id, tenant_id, event_name, previous_state, reason, counters_snapshot, user_message, ts
             FROM events WHERE tenant_id = ?1 AND conv_id = ?2 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(rusqlite::params![tenant_id, conv_id], row_to_record)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<EventRecord> {
    let counters_json: String = row.get(5)?;
    let counters: Counters = serde_json::from_str(&counters_json).unwrap_or_default();
    let ts_str: String = row.get(7)?;
    let timestamp = chrono::DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(|_| chrono::Utc::now());

    Ok(EventRecord {
        conv_id: row.get(0)?,
        tenant_id: row.get(1)?,
        event_name: row.get(2)?,
        previous_state: row.get(3)?,
        reason: row.get(4)?,
        counters_snapshot: counters,
        user_message: row.get(6)?,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;

    fn open() -> AuditSink {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        AuditSink::new(conn)
    }

    #[test]
    fn append_then_query_round_trips() {
        let sink = open();
        let record = EventRecord::new(
            "conv-1",
            "tenant-a",
            "intent_router_triggered",
            "QUALIF_NAME",
            Some("anti_loop_25".to_string()),
            Counters { turn_count: 26, ..Default::default() },
            "bonjour",
            chrono::Utc::now(),
        );
        sink.append(&record);

        let events = sink.events_for("tenant-a", "conv-1").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name, "intent_router_triggered");
        assert_eq!(events[0].reason.as_deref(), Some("anti_loop_25"));
        assert_eq!(events[0].counters_snapshot.turn_count, 26);
    }

    #[test]
    fn query_is_scoped_per_conversation() {
        let sink = open();
        let a = EventRecord::new(
            "conv-1",
            "tenant-a",
            "safe_reply_triggered",
            "START",
            None,
            Counters::default(),
            "...",
            chrono::Utc::now(),
        );
        let b = EventRecord::new(
            "conv-2",
            "tenant-a",
            "safe_reply_triggered",
            "START",
            None,
            Counters::default(),
            "...",
            chrono::Utc::now(),
        );
        sink.append(&a);
        sink.append(&b);

        assert_eq!(sink.events_for("tenant-a", "conv-1").unwrap().len(), 1);
        assert_eq!(sink.events_for("tenant-a", "conv-2").unwrap().len(), 1);
    }
}
