use std::sync::Arc;
use std::time::Duration;

use lobby_audit::AuditSink;
use lobby_backends::{CalendarBackend, FaqMatcher};
use lobby_core::{Clock, LobbyConfig};
use lobby_sessions::SessionManager;

use crate::locks::LockStripes;

/// Everything the pipeline needs, bundled for dependency injection (§9:
/// "becomes an engine value whose lifecycle is owned by the application
/// entry point; handlers receive it as an explicit dependency").
///
/// Owned by `lobby-gateway`'s `AppState` in production, built directly with
/// in-memory backends and a `FixedClock` in tests.
pub struct EngineContext {
    pub config: Arc<LobbyConfig>,
    pub clock: Arc<dyn Clock>,
    pub sessions: Arc<SessionManager>,
    pub audit: Arc<AuditSink>,
    pub calendar: Arc<dyn CalendarBackend>,
    pub faq: Arc<dyn FaqMatcher>,
    pub locks: Arc<LockStripes>,
    /// Hard deadline applied to every calendar/FAQ call (§5, default 2s).
    pub backend_deadline: Duration,
}

impl EngineContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<LobbyConfig>,
        clock: Arc<dyn Clock>,
        sessions: Arc<SessionManager>,
        audit: Arc<AuditSink>,
        calendar: Arc<dyn CalendarBackend>,
        faq: Arc<dyn FaqMatcher>,
        backend_deadline: Duration,
    ) -> Self {
        Self {
            config,
            clock,
            sessions,
            audit,
            calendar,
            faq,
            locks: Arc::new(LockStripes::new()),
            backend_deadline,
        }
    }
}
