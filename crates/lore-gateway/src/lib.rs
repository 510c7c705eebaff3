//! Lore gateway: axum router over the lore core.
//!
//! Topic pages, htmx chat fragments, knowledge-base management and a health
//! probe. `main.rs` only wires config, tracing and the listener.

pub mod handlers;
pub mod render;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use lore_core::{AppConfig, ChatBackend, ContentLibrary, KnowledgeBaseStore, SessionManager};
use std::sync::Arc;
use std::time::Instant;
use tower_http::services::ServeDir;

use handlers::{chat, health, knowledge_bases, pages};

/// Uploads are only measured, never stored, but still have to arrive whole.
pub const UPLOAD_LIMIT: usize = 25 * 1024 * 1024;

pub struct AppState {
    pub config: AppConfig,
    pub backend: Arc<dyn ChatBackend>,
    pub sessions: SessionManager,
    pub knowledge_bases: Arc<dyn KnowledgeBaseStore>,
    pub content: ContentLibrary,
}

impl AppState {
    pub fn new(config: AppConfig, backend: Arc<dyn ChatBackend>, knowledge_bases: Arc<dyn KnowledgeBaseStore>) -> Self {
        let sessions = SessionManager::new(Arc::clone(&backend), config.proxy.user_id.clone());
        let content = ContentLibrary::new(&config.content_dir);
        Self {
            config,
            backend,
            sessions,
            knowledge_bases,
            content,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = ServeDir::new(&state.config.static_dir);
    Router::new()
        .route("/", get(pages::home))
        .route("/health", get(health::health))
        .route("/browse/:topic", get(pages::browse_topic))
        .route("/browse/:topic/:content_type", get(pages::browse_content))
        .route("/chat/:topic", get(pages::chat_page))
        .route("/chat/:topic/query", post(chat::chat_query))
        .route("/api/session", post(chat::create_session))
        .route("/knowledge-bases", get(knowledge_bases::index).post(knowledge_bases::create))
        .route("/knowledge-bases/:kb_id", get(knowledge_bases::show))
        .route("/knowledge-bases/:kb_id/upload", post(knowledge_bases::upload))
        .route("/knowledge-bases/:kb_id/query", post(knowledge_bases::query))
        .nest_service("/static", static_dir)
        .fallback(pages::not_found)
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
        .layer(axum::middleware::from_fn(log_requests))
        .with_state(state)
}

async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        target: "lore::http",
        %method,
        %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}
