use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppState;

/// The gateway itself is always up; the payload reports whether the chat
/// backend answers.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let connected = state.backend.check_health().await;
    if !connected {
        tracing::warn!(
            target: "lore::health",
            backend = state.backend.name(),
            url = state.backend.endpoint(),
            "chat backend unreachable"
        );
    }
    Json(json!({
        "status": "healthy",
        "backend": state.backend.name(),
        "proxy_connection": if connected { "connected" } else { "disconnected" },
        "proxy_url": state.backend.endpoint(),
        "version": lore_core::version(),
    }))
}
