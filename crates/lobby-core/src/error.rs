use thiserror::Error;

#[derive(Debug, Error)]
pub enum LobbyError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid conversation key: {0}")]
    InvalidKey(String),

    #[error("unknown tenant: {0}")]
    UnknownTenant(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl LobbyError {
    /// Short error code, useful for logging/metrics correlation.
    pub fn code(&self) -> &'static str {
        match self {
            LobbyError::Config(_) => "CONFIG_ERROR",
            LobbyError::InvalidKey(_) => "INVALID_KEY",
            LobbyError::UnknownTenant(_) => "UNKNOWN_TENANT",
            LobbyError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, LobbyError>;
