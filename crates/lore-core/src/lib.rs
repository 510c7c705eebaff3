//! Lore core library: the pieces behind the learning portal's chat surface.
//!
//! Response sanitizer, RAG proxy client (sessions + buffered streamed
//! completions), the OpenRouter fallback backend, session resolution, the
//! in-memory knowledge-base store, and the topic/content catalogs.

pub mod backend;
pub mod config;
pub mod content;
pub mod error;
pub mod knowledge_base;
pub mod openrouter;
pub mod outcome;
pub mod proxy_client;
pub mod sanitizer;
pub mod session;
pub mod topics;

use std::sync::Arc;

pub use backend::{ChatBackend, ChatRequest, KnowledgeBaseContext};
pub use config::{AppConfig, BackendKind, OpenRouterConfig, ProxyConfig};
pub use content::{ContentItem, ContentLibrary, CONTENT_TYPES};
pub use error::{ConfigError, ProxyError, StoreError};
pub use knowledge_base::{
    FileRecord, FileStatus, InMemoryKnowledgeBaseStore, KnowledgeBase, KnowledgeBaseStore, NewKnowledgeBase,
};
pub use openrouter::OpenRouterBackend;
pub use outcome::Outcome;
pub use proxy_client::{parse_frames, FrameParse, ProxyClient};
pub use sanitizer::{escape_html, sanitize};
pub use session::SessionManager;
pub use topics::{find_topic, topics, Topic, DEFAULT_TOPIC};

/// Builds the chat backend selected by `config.backend`.
pub fn backend_from_config(config: &AppConfig) -> Arc<dyn ChatBackend> {
    match config.backend {
        BackendKind::RagProxy => Arc::new(ProxyClient::new(config.proxy.clone())),
        BackendKind::OpenRouter => Arc::new(OpenRouterBackend::new(config.openrouter.clone())),
    }
}

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
