use chrono::{DateTime, Utc};
use lobby_core::Counters;
use serde::{Deserialize, Serialize};

/// One audit record (§3): every routing decision that changes state, trips
/// recovery, or escalates produces one of these. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub conv_id: String,
    pub tenant_id: String,
    pub event_name: String,
    pub previous_state: String,
    pub reason: Option<String>,
    pub counters_snapshot: Counters,
    pub user_message: String,
    pub timestamp: DateTime<Utc>,
}

/// Message-length cap applied before a record is persisted (§3: "truncated
/// to 200 chars").
pub const USER_MESSAGE_MAX_CHARS: usize = 200;

impl EventRecord {
    pub fn new(
        conv_id: impl Into<String>,
        tenant_id: impl Into<String>,
        event_name: impl Into<String>,
        previous_state: impl Into<String>,
        reason: Option<String>,
        counters_snapshot: Counters,
        user_message: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let truncated: String = user_message.chars().take(USER_MESSAGE_MAX_CHARS).collect();
        Self {
            conv_id: conv_id.into(),
            tenant_id: tenant_id.into(),
            event_name: event_name.into(),
            previous_state: previous_state.into(),
            reason,
            counters_snapshot,
            user_message: truncated,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_is_truncated() {
        let long = "a".repeat(250);
        let record = EventRecord::new(
            "conv-1",
            "tenant-a",
            "intent_router_triggered",
            "QUALIF_NAME",
            Some("anti_loop_25".to_string()),
            Counters::default(),
            &long,
            Utc::now(),
        );
        assert_eq!(record.user_message.chars().count(), USER_MESSAGE_MAX_CHARS);
    }
}
