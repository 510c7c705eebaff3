use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
};
use lore_core::{find_topic, ContentLibrary};
use std::sync::Arc;

use crate::{render, AppState};

pub async fn home() -> Html<String> {
    Html(render::home_page())
}

pub async fn browse_topic(Path(topic): Path<String>) -> (StatusCode, Html<String>) {
    match find_topic(&topic) {
        Some(t) => (StatusCode::OK, Html(render::topic_page(t))),
        None => not_found().await,
    }
}

pub async fn browse_content(
    State(state): State<Arc<AppState>>,
    Path((topic, content_type)): Path<(String, String)>,
) -> (StatusCode, Html<String>) {
    let Some(t) = find_topic(&topic) else {
        return not_found().await;
    };
    if !ContentLibrary::is_content_type(&content_type) {
        return not_found().await;
    }
    let items = state.content.load(t.id, &content_type);
    (StatusCode::OK, Html(render::content_page(t, &content_type, &items)))
}

pub async fn chat_page(Path(topic): Path<String>) -> Html<String> {
    Html(render::chat_page(&topic, find_topic(&topic)))
}

pub async fn not_found() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html(render::not_found_page()))
}
