use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{LobbyError, Result};

/// Identifies the small business this conversation belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifies a single conversation within a tenant, as handed to us by the
/// channel adapter. Adapters are responsible for keeping this stable across
/// turns of the same dialogue (e.g. the call SID, the chat thread id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConvId(pub String);

impl ConvId {
    /// Mint a fresh, time-sortable id for channels that don't supply one.
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConvId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConvId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The transport a message arrived on. Phrasing in the prompt catalog varies
/// by channel (§4.4), and some FSM transitions branch on it (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Voice,
    Text,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Voice => write!(f, "voice"),
            Channel::Text => write!(f, "text"),
        }
    }
}

/// Structured `(tenant_id, conv_id)` composite key.
///
/// Sessions, audit events, and the per-conversation lock stripe are all
/// addressed by this key rather than by conv_id alone, since conv_id is only
/// unique within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConvKey {
    pub tenant_id: TenantId,
    pub conv_id: ConvId,
}

impl ConvKey {
    pub fn new(tenant_id: impl Into<String>, conv_id: impl Into<String>) -> Self {
        Self {
            tenant_id: TenantId(tenant_id.into()),
            conv_id: ConvId(conv_id.into()),
        }
    }

    /// Canonical wire-format string: `tenant:{tenant_id}:conv:{conv_id}`.
    pub fn format(&self) -> String {
        format!("tenant:{}:conv:{}", self.tenant_id, self.conv_id)
    }

    /// Parse a wire-format key string back into a `ConvKey`.
    pub fn parse(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix("tenant:")
            .ok_or_else(|| LobbyError::InvalidKey(format!("missing 'tenant:' prefix: {s}")))?;

        let marker = ":conv:";
        let pos = rest
            .find(marker)
            .ok_or_else(|| LobbyError::InvalidKey(format!("missing ':conv:' segment: {s}")))?;

        let tenant_id = &rest[..pos];
        let conv_id = &rest[pos + marker.len()..];

        if tenant_id.is_empty() || conv_id.is_empty() {
            return Err(LobbyError::InvalidKey(format!(
                "key components must not be empty: {s}"
            )));
        }

        Ok(Self::new(tenant_id, conv_id))
    }
}

impl fmt::Display for ConvKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_simple_key() {
        let key = ConvKey::new("cabinet-dupont", "call-123");
        let s = key.format();
        assert_eq!(s, "tenant:cabinet-dupont:conv:call-123");
        assert_eq!(ConvKey::parse(&s).unwrap(), key);
    }

    #[test]
    fn roundtrip_conv_id_with_colons() {
        let key = ConvKey::new("acme", "sip:call:42");
        let s = key.format();
        let parsed = ConvKey::parse(&s).unwrap();
        assert_eq!(parsed.conv_id.as_str(), "sip:call:42");
    }

    #[test]
    fn parse_missing_prefix_errors() {
        assert!(ConvKey::parse("conv:123").is_err());
    }

    #[test]
    fn parse_missing_conv_marker_errors() {
        assert!(ConvKey::parse("tenant:acme:123").is_err());
    }
}
