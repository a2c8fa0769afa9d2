use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, routing::post, Router};
use rusqlite::Connection;

use lobby_audit::AuditSink;
use lobby_backends::{InMemoryCalendar, InMemoryFaq};
use lobby_core::{Clock, LobbyConfig, SystemClock};
use lobby_engine::EngineContext;
use lobby_sessions::SessionManager;

/// Central shared state, wired once in `main.rs` and passed as `Arc<AppState>`
/// to every Axum handler (§9: the application entry point owns what the
/// design notes identify as otherwise-global mutable state).
pub struct AppState {
    pub engine: EngineContext,
}

impl AppState {
    pub fn new(config: LobbyConfig) -> anyhow::Result<Self> {
        let sessions_conn = Connection::open(&config.database.sessions_path)?;
        lobby_sessions::init_db(&sessions_conn)?;
        let sessions = Arc::new(SessionManager::new(sessions_conn));

        let audit_conn = Connection::open(&config.database.audit_path)?;
        lobby_audit::init_db(&audit_conn)?;
        let audit = Arc::new(AuditSink::new(audit_conn));

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let calendar = Arc::new(InMemoryCalendar::new(clock.clone()));
        let faq = Arc::new(InMemoryFaq::new(Vec::new()));

        let backend_deadline = Duration::from_millis(lobby_core::config::DEFAULT_BACKEND_DEADLINE_MS);

        let engine = EngineContext::new(Arc::new(config), clock, sessions, audit, calendar, faq, backend_deadline);

        Ok(Self { engine })
    }
}

/// Assembles the full Axum router (§6: `POST /messages`, `GET /health`).
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/messages", post(crate::http::inbound::messages_handler))
        .route("/health", get(crate::http::health::health_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
