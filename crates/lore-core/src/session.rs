//! Session manager: reuse the browser's session id or ask the backend for one.

use std::sync::Arc;

use crate::backend::ChatBackend;

pub struct SessionManager {
    backend: Arc<dyn ChatBackend>,
    user_id: String,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn ChatBackend>, user_id: impl Into<String>) -> Self {
        Self {
            backend,
            user_id: user_id.into(),
        }
    }

    /// A non-blank incoming id is used as-is (no revalidation, no expiry);
    /// otherwise a new session is created, falling back to a local id.
    pub async fn resolve(&self, incoming: Option<&str>) -> String {
        if let Some(id) = incoming.map(str::trim).filter(|s| !s.is_empty()) {
            return id.to_string();
        }
        self.backend
            .create_session(&self.user_id)
            .await
            .log_degraded("create_session")
    }
}
