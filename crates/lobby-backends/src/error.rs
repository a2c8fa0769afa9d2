use thiserror::Error;

/// Backend failures (§7: calendar timeout/error, FAQ store unreachable).
/// The engine treats every variant here as "escalate unless a local
/// fallback is configured" — none of these should ever reach the adapter
/// as a raw error.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend call exceeded its {ms}ms deadline")]
    Timeout { ms: u64 },

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("requested slot was already booked")]
    SlotTaken,

    #[error("no matching record found")]
    NotFound,
}

pub type Result<T> = std::result::Result<T, BackendError>;
