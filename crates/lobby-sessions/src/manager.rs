use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::types::Session;

/// Thread-safe, SQLite-backed session store (§4.5). Sessions survive
/// process restart; under concurrent messages for the same `conv_id` the
/// caller is responsible for serialising access (§5) — this manager only
/// guarantees each individual call is atomic.
pub struct SessionManager {
    db: Mutex<Connection>,
}

impl SessionManager {
    /// Wraps an already-open, already-`init_db`'d connection.
    pub fn new(conn: Connection) -> Self {
        Self { db: Mutex::new(conn) }
    }

    /// Returns an existing session or creates one with `state = START` on
    /// miss (§4.5).
    #[instrument(skip(self), fields(tenant_id, conv_id))]
    pub fn get_or_create(
        &self,
        tenant_id: &str,
        conv_id: &str,
        channel: lobby_core::Channel,
        now: DateTime<Utc>,
    ) -> Result<Session> {
        if let Some(session) = self.get(tenant_id, conv_id)? {
            debug!("session cache hit");
            return Ok(session);
        }

        let session = Session::new(tenant_id, conv_id, channel, now);
        let payload = serde_json::to_string(&session)?;

        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT OR IGNORE INTO sessions
             (tenant_id, conv_id, state, channel, payload, created_at, last_seen_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            rusqlite::params![
                tenant_id,
                conv_id,
                session.state.to_string(),
                channel.to_string(),
                payload,
                now.to_rfc3339(),
            ],
        )?;

        // Read back — handles the race where two callers insert simultaneously.
        let row: String = db.query_row(
            "SELECT payload FROM sessions WHERE tenant_id = ?1 AND conv_id = ?2",
            rusqlite::params![tenant_id, conv_id],
            |row| row.get(0),
        )?;
        Ok(serde_json::from_str(&row)?)
    }

    #[instrument(skip(self), fields(tenant_id, conv_id))]
    pub fn get(&self, tenant_id: &str, conv_id: &str) -> Result<Option<Session>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            "SELECT payload FROM sessions WHERE tenant_id = ?1 AND conv_id = ?2",
            rusqlite::params![tenant_id, conv_id],
            |row| row.get::<_, String>(0),
        ) {
            Ok(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persists the session atomically. Upserts so it also works for a
    /// session that was created then reset.
    #[instrument(skip(self, session), fields(tenant_id = %session.tenant_id, conv_id = %session.conv_id))]
    pub fn save(&self, session: &Session) -> Result<()> {
        let payload = serde_json::to_string(session)?;
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO sessions (tenant_id, conv_id, state, channel, payload, created_at, last_seen_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(tenant_id, conv_id) DO UPDATE SET
                state = excluded.state,
                payload = excluded.payload,
                last_seen_at = excluded.last_seen_at",
            rusqlite::params![
                session.tenant_id,
                session.conv_id,
                session.state.to_string(),
                session.channel.to_string(),
                payload,
                session.created_at.to_rfc3339(),
                session.last_seen_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Updates `last_seen_at` without touching the rest of the payload.
    #[instrument(skip(self))]
    pub fn touch(&self, tenant_id: &str, conv_id: &str, now: DateTime<Utc>) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE sessions SET last_seen_at = ?1 WHERE tenant_id = ?2 AND conv_id = ?3",
            rusqlite::params![now.to_rfc3339(), tenant_id, conv_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(offset_secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + offset_secs, 0).unwrap()
    }

    fn manager() -> SessionManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_db(&conn).unwrap();
        SessionManager::new(conn)
    }

    #[test]
    fn get_or_create_creates_on_miss_and_hits_on_repeat() {
        let mgr = manager();
        let first = mgr.get_or_create("tenant-a", "conv-1", lobby_core::Channel::Text, t(0)).unwrap();
        assert_eq!(first.state, lobby_fsm::State::Start);

        let second = mgr.get_or_create("tenant-a", "conv-1", lobby_core::Channel::Text, t(5)).unwrap();
        assert_eq!(second.created_at, first.created_at);
    }

    #[test]
    fn save_persists_state_changes() {
        let mgr = manager();
        let mut session = mgr.get_or_create("tenant-a", "conv-1", lobby_core::Channel::Voice, t(0)).unwrap();
        session.state = lobby_fsm::State::QualifName;
        session.qualification.name = Some("Jean Dupont".to_string());
        mgr.save(&session).unwrap();

        let reloaded = mgr.get("tenant-a", "conv-1").unwrap().unwrap();
        assert_eq!(reloaded.state, lobby_fsm::State::QualifName);
        assert_eq!(reloaded.qualification.name.as_deref(), Some("Jean Dupont"));
    }

    #[test]
    fn touch_updates_last_seen_without_changing_state() {
        let mgr = manager();
        let session = mgr.get_or_create("tenant-a", "conv-1", lobby_core::Channel::Text, t(0)).unwrap();
        mgr.touch("tenant-a", "conv-1", t(120)).unwrap();
        let reloaded = mgr.get("tenant-a", "conv-1").unwrap().unwrap();
        assert_eq!(reloaded.state, session.state);
    }

    #[test]
    fn different_conversations_are_independent() {
        let mgr = manager();
        mgr.get_or_create("tenant-a", "conv-1", lobby_core::Channel::Text, t(0)).unwrap();
        let other = mgr.get("tenant-a", "conv-2").unwrap();
        assert!(other.is_none());
    }
}
