use std::collections::HashMap;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{LobbyError, Result};

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default calendar/FAQ backend call deadline (§5).
pub const DEFAULT_BACKEND_DEADLINE_MS: u64 = 2_000;

/// Top-level config (lobby.toml + LOBBY_* env overrides, §4.15).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Per-tenant recognised options (§6.5), keyed by tenant id.
    #[serde(default)]
    pub tenants: HashMap<String, TenantConfig>,
    /// Settings used for any tenant id not present in `tenants`.
    #[serde(default)]
    pub default_tenant: TenantConfig,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            database: DatabaseConfig::default(),
            tenants: HashMap::new(),
            default_tenant: TenantConfig::default(),
        }
    }
}

impl LobbyConfig {
    /// Load config from a TOML file with `LOBBY_*` env var overrides.
    ///
    /// Checks in order: explicit path argument, then `~/.lobby/lobby.toml`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: LobbyConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("LOBBY_").split("_"))
            .extract()
            .map_err(|e| LobbyError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Resolve the effective settings for a tenant, falling back to
    /// `default_tenant` for any tenant id not explicitly configured.
    pub fn tenant(&self, tenant_id: &str) -> &TenantConfig {
        self.tenants.get(tenant_id).unwrap_or(&self.default_tenant)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.lobby/lobby.toml", home)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_sessions_db_path")]
    pub sessions_path: String,
    #[serde(default = "default_audit_db_path")]
    pub audit_path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sessions_path: default_sessions_db_path(),
            audit_path: default_audit_db_path(),
        }
    }
}

/// Per-tenant recognised options (§6.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    #[serde(default = "default_business_name")]
    pub business_name: String,
    #[serde(default = "default_faq_threshold")]
    pub faq_threshold: f32,
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: i64,
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    #[serde(default = "default_max_slots_proposed")]
    pub max_slots_proposed: usize,
    #[serde(default = "default_confirm_retry_max")]
    pub confirm_retry_max: u32,
    #[serde(default = "default_max_turns_anti_loop")]
    pub max_turns_anti_loop: u32,
    #[serde(default = "default_max_context_fails")]
    pub max_context_fails: u32,
    #[serde(default = "default_language")]
    pub language: String,
    /// Gates the §9 open-question resolution: skip `CONTACT_CONFIRM` and go
    /// straight to `WAIT_CONFIRM` when a caller id is already known.
    #[serde(default)]
    pub skip_contact_confirm: bool,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            business_name: default_business_name(),
            faq_threshold: default_faq_threshold(),
            session_ttl_minutes: default_session_ttl_minutes(),
            max_message_length: default_max_message_length(),
            max_slots_proposed: default_max_slots_proposed(),
            confirm_retry_max: default_confirm_retry_max(),
            max_turns_anti_loop: default_max_turns_anti_loop(),
            max_context_fails: default_max_context_fails(),
            language: default_language(),
            skip_contact_confirm: false,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_sessions_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.lobby/sessions.db", home)
}
fn default_audit_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.lobby/audit.db", home)
}
fn default_business_name() -> String {
    "notre cabinet".to_string()
}
fn default_faq_threshold() -> f32 {
    0.80
}
fn default_session_ttl_minutes() -> i64 {
    15
}
fn default_max_message_length() -> usize {
    500
}
fn default_max_slots_proposed() -> usize {
    3
}
fn default_confirm_retry_max() -> u32 {
    1
}
fn default_max_turns_anti_loop() -> u32 {
    25
}
fn default_max_context_fails() -> u32 {
    3
}
fn default_language() -> String {
    "fr".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tenant_matches_spec_defaults() {
        let t = TenantConfig::default();
        assert_eq!(t.faq_threshold, 0.80);
        assert_eq!(t.session_ttl_minutes, 15);
        assert_eq!(t.max_message_length, 500);
        assert_eq!(t.max_turns_anti_loop, 25);
        assert_eq!(t.max_context_fails, 3);
        assert!(!t.skip_contact_confirm);
    }

    #[test]
    fn unconfigured_tenant_falls_back_to_default() {
        let config = LobbyConfig::default();
        let t = config.tenant("unknown-tenant");
        assert_eq!(t.business_name, "notre cabinet");
    }
}
