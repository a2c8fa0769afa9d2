use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET /health — liveness probe. Adapters are external processes that POST
/// to `/messages`; all this process can report on is its own session and
/// audit storage being reachable.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let sessions_ok = state.engine.sessions.get("__health_check__", "__health_check__").is_ok();

    Json(json!({
        "status": if sessions_ok { "ok" } else { "degraded" },
        "sessions_store": sessions_ok,
    }))
}
