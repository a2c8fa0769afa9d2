use thiserror::Error;

/// Internal faults (§7): an invalid transition attempted, a backend or
/// storage failure with no fallback. All are logged at `ERROR` and resolved
/// by escalating the session to `TRANSFERRED` — none ever reach the adapter
/// as a raw error (§7: "never bubble to the adapter as an HTTP 5xx without
/// first emitting the transfer prompt").
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("fsm transition error: {0}")]
    Transition(#[from] lobby_fsm::TransitionError),

    #[error("session store error: {0}")]
    Session(#[from] lobby_sessions::SessionError),

    #[error("backend error: {0}")]
    Backend(#[from] lobby_backends::BackendError),
}
