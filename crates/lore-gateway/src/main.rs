//! Lore gateway binary: `.env`, tracing, config, then serve the router.

use lore_core::{backend_from_config, AppConfig, InMemoryKnowledgeBaseStore};
use lore_gateway::{build_router, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[lore] no .env loaded ({}); using process environment", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let backend = backend_from_config(&config);
    tracing::info!(
        target: "lore::startup",
        backend = backend.name(),
        endpoint = backend.endpoint(),
        static_dir = %config.static_dir,
        content_dir = %config.content_dir,
        version = lore_core::version(),
        "chat backend selected"
    );

    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config, backend, Arc::new(InMemoryKnowledgeBaseStore::new())));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(target: "lore::startup", %addr, "Lore gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}
