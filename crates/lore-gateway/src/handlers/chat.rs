//! Topic chat: one buffered answer per form post, returned as an htmx fragment.

use axum::{
    extract::{Form, Path, State},
    response::Html,
    Json,
};
use lore_core::{find_topic, ChatRequest};
use serde_json::{json, Value};
use std::sync::Arc;

use super::ChatForm;
use crate::{render, AppState};

pub const EMPTY_MESSAGE: &str = "Please enter a message";

pub async fn chat_query(
    State(state): State<Arc<AppState>>,
    Path(topic): Path<String>,
    Form(form): Form<ChatForm>,
) -> Html<String> {
    let message = form.message.trim();
    if message.is_empty() {
        return Html(render::error_fragment(EMPTY_MESSAGE));
    }

    let session_id = state.sessions.resolve(form.session_id.as_deref()).await;
    let topic_name = find_topic(&topic).map(|t| t.name.to_string()).unwrap_or(topic);
    tracing::debug!(target: "lore::chat", topic = %topic_name, session = %session_id, "chat query");

    let request = ChatRequest::new(message)
        .with_session(Some(session_id.clone()))
        .with_topic(topic_name);
    let answer = state.backend.converse(&request).await.log_degraded("converse");

    Html(render::chat_exchange(message, &answer, Some(&session_id)))
}

pub async fn create_session(State(state): State<Arc<AppState>>) -> Json<Value> {
    let session = state.sessions.resolve(None).await;
    Json(json!({ "session": session }))
}
