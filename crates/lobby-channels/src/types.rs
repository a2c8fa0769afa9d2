use serde::{Deserialize, Serialize};

use lobby_core::Channel as ChannelKind;

/// The inbound contract every adapter normalises its native payload into
/// before calling the engine (§6.1). The core never inspects
/// channel-specific fields beyond these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub tenant_id: String,
    pub channel: ChannelKind,
    pub conv_id: String,
    pub text: String,
    /// Inbound phone number, populated by voice adapters when available.
    pub caller_id: Option<String>,
    pub receipt_timestamp: chrono::DateTime<chrono::Utc>,
}

/// One emitted event, rendered back into the adapter's native format
/// (§6.2). `text` is guaranteed non-empty once it leaves the engine's
/// safe-reply barrier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundEvent {
    pub kind: EventKind,
    pub text: String,
    pub new_state: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Partial,
    Final,
    Transfer,
}

/// Runtime connection state of a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Connected,
    Connecting,
    Disconnected,
    Error(String),
}
