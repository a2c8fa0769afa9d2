use chrono::{DateTime, Utc};
use lobby_core::Counters;
use lobby_fsm::State;
use serde::{Deserialize, Serialize};

/// Bound on retained turns (§3: "history bounded to N last turns, N ≤ 10").
pub const MAX_HISTORY_TURNS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    Morning,
    Afternoon,
}

/// The appointment slots currently on offer (§3). Mirrors
/// `lobby_backends::SlotOffer` in shape but is kept independent so the
/// session store has no dependency on the calendar backend contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSlot {
    pub index: u8,
    pub start_ts: DateTime<Utc>,
    pub label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Qualification {
    pub name: Option<String>,
    pub motif: Option<String>,
    pub preference: Option<Preference>,
    pub contact: Option<String>,
    pub contact_type: Option<String>,
}

/// A single conversation's full state (§3). Keyed externally by
/// `lobby_core::ConvKey`; the key's two parts are duplicated as plain
/// fields here so they round-trip through SQLite columns untyped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub tenant_id: String,
    pub conv_id: String,
    pub channel: lobby_core::Channel,
    pub state: State,
    pub qualification: Qualification,
    pub pending_slots: Vec<PendingSlot>,
    pub caller_id: Option<String>,
    pub history: Vec<HistoryTurn>,
    pub last_question_asked: Option<String>,
    /// Canonical lowercase name of the most recent strong intent
    /// (`"cancel"`, `"modify"`, `"transfer"`) — used for anti-ping-pong.
    pub last_intent: Option<String>,
    pub counters: Counters,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Session {
    pub fn new(tenant_id: impl Into<String>, conv_id: impl Into<String>, channel: lobby_core::Channel, now: DateTime<Utc>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            conv_id: conv_id.into(),
            channel,
            state: State::Start,
            qualification: Qualification::default(),
            pending_slots: Vec::new(),
            caller_id: None,
            history: Vec::new(),
            last_question_asked: None,
            last_intent: None,
            counters: Counters::default(),
            created_at: now,
            last_seen_at: now,
        }
    }

    /// Appends a turn, evicting the oldest one FIFO once `MAX_HISTORY_TURNS`
    /// is exceeded (§3 invariant).
    pub fn push_history(&mut self, role: Role, text: impl Into<String>, now: DateTime<Utc>) {
        self.history.push(HistoryTurn { role, text: text.into(), timestamp: now });
        if self.history.len() > MAX_HISTORY_TURNS {
            self.history.remove(0);
        }
    }

    /// Returns the session to a fresh `START` state while keeping durable
    /// identity (`tenant_id`, `conv_id`, `channel`, `caller_id`, `created_at`).
    /// Called exactly at session creation and on `INTENT_ROUTER` entry, and
    /// implicitly on TTL expiry (§3, §4.7, P4, P8).
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.state = State::Start;
        self.qualification = Qualification::default();
        self.pending_slots.clear();
        self.history.clear();
        self.last_question_asked = None;
        self.last_intent = None;
        self.counters.reset();
        self.last_seen_at = now;
    }

    /// True iff the session has not been touched within `ttl` (§4.5, P8).
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now.signed_duration_since(self.last_seen_at) > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(offset_secs: i64) -> DateTime<Utc> {
        chrono::DateTime::from_timestamp(1_700_000_000 + offset_secs, 0).unwrap()
    }

    #[test]
    fn history_is_bounded_fifo() {
        let mut s = Session::new("tenant-a", "conv-1", lobby_core::Channel::Text, t(0));
        for i in 0..(MAX_HISTORY_TURNS + 3) {
            s.push_history(Role::User, format!("turn {i}"), t(i as i64));
        }
        assert_eq!(s.history.len(), MAX_HISTORY_TURNS);
        assert_eq!(s.history.first().unwrap().text, "turn 3");
    }

    #[test]
    fn reset_clears_everything_but_identity() {
        let mut s = Session::new("tenant-a", "conv-1", lobby_core::Channel::Voice, t(0));
        s.state = State::QualifName;
        s.qualification.name = Some("Jean Dupont".to_string());
        s.counters.turn_count = 5;
        s.push_history(Role::User, "bonjour", t(1));

        s.reset(t(2));

        assert_eq!(s.state, State::Start);
        assert!(s.qualification.name.is_none());
        assert!(s.history.is_empty());
        assert_eq!(s.counters.turn_count, 0);
        assert_eq!(s.tenant_id, "tenant-a");
        assert_eq!(s.conv_id, "conv-1");
    }

    #[test]
    fn expiry_uses_last_seen_at() {
        let s = Session::new("tenant-a", "conv-1", lobby_core::Channel::Text, t(0));
        let ttl = chrono::Duration::minutes(15);
        assert!(!s.is_expired(t(60), ttl));
        assert!(s.is_expired(t(901), ttl));
    }
}
