//! POST /messages — the channel adapter contract's inbound side (§6.1).
//! Every adapter (voice, text, messaging) normalises its native payload into
//! an `InboundMessage` and posts it here; the core never sees anything
//! channel-specific beyond that struct.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use lobby_channels::{InboundMessage, OutboundEvent};

use crate::app::AppState;

pub async fn messages_handler(
    State(state): State<Arc<AppState>>,
    Json(inbound): Json<InboundMessage>,
) -> Result<Json<Vec<OutboundEvent>>, (StatusCode, String)> {
    if inbound.tenant_id.trim().is_empty() || inbound.conv_id.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "tenant_id and conv_id are required".to_string()));
    }

    let events = lobby_engine::handle_message(&state.engine, &inbound).await;
    Ok(Json(events))
}
