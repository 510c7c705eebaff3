//! Knowledge-base pages, creation, uploads and scoped chat.

use axum::{
    extract::{Form, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use lore_core::{ChatRequest, KnowledgeBaseContext, NewKnowledgeBase, StoreError, DEFAULT_TOPIC};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::chat::EMPTY_MESSAGE;
use super::ChatForm;
use crate::{render, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subject: String,
}

/// Outcome of a knowledge-base form post. API clients get JSON with a
/// matching status; htmx gets a 200 fragment, since it does not swap 4xx
/// bodies into the page.
struct FormReply {
    status: StatusCode,
    success: bool,
    message: String,
    knowledge_base_id: Option<String>,
}

impl FormReply {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            message: message.into(),
            knowledge_base_id: None,
        }
    }

    fn failed(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            message: message.into(),
            knowledge_base_id: None,
        }
    }

    fn respond(self, headers: &HeaderMap) -> Response {
        if from_htmx(headers) {
            let link = self.knowledge_base_id.as_deref();
            return Html(render::form_result(self.success, &self.message, link)).into_response();
        }
        let mut body = json!({ "success": self.success, "message": self.message });
        if let Some(id) = self.knowledge_base_id {
            body["knowledge_base_id"] = Value::String(id);
        }
        (self.status, Json(body)).into_response()
    }
}

fn from_htmx(headers: &HeaderMap) -> bool {
    headers.get("hx-request").and_then(|v| v.to_str().ok()) == Some("true")
}

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render::knowledge_base_index(&state.knowledge_bases.list()))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<CreateForm>,
) -> Response {
    let name = form.name.trim();
    if name.is_empty() {
        return FormReply::failed(StatusCode::BAD_REQUEST, "Knowledge base name is required").respond(&headers);
    }
    let subject = match form.subject.trim() {
        "" => DEFAULT_TOPIC.to_string(),
        s => s.to_string(),
    };
    let kb = state.knowledge_bases.create(NewKnowledgeBase {
        name: name.to_string(),
        description: form.description.trim().to_string(),
        subject,
    });
    FormReply {
        knowledge_base_id: Some(kb.id),
        ..FormReply::ok(format!("Knowledge base '{}' created", kb.name))
    }
    .respond(&headers)
}

pub async fn show(State(state): State<Arc<AppState>>, Path(kb_id): Path<String>) -> (StatusCode, Html<String>) {
    match state.knowledge_bases.get(&kb_id) {
        Some(kb) => (StatusCode::OK, Html(render::knowledge_base_page(&kb))),
        None => (StatusCode::NOT_FOUND, Html(render::not_found_page())),
    }
}

/// Reads every `file` part and records its name and size. The bytes are
/// dropped afterwards.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Path(kb_id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    track_uploads(&state, &kb_id, multipart).await.respond(&headers)
}

async fn track_uploads(state: &AppState, kb_id: &str, mut multipart: Multipart) -> FormReply {
    if state.knowledge_bases.get(kb_id).is_none() {
        return not_found(kb_id);
    }

    let mut tracked = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(target: "lore::upload", kb_id = %kb_id, error = %e, "malformed multipart body");
                return FormReply::failed(StatusCode::BAD_REQUEST, format!("Upload failed: {}", e.body_text()));
            }
        };
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "upload".to_string());
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(target: "lore::upload", kb_id = %kb_id, error = %e, "upload body unreadable");
                return FormReply::failed(StatusCode::BAD_REQUEST, format!("Upload failed: {}", e.body_text()));
            }
        };
        match state.knowledge_bases.attach_file(kb_id, &filename, &bytes) {
            Ok(record) => tracked.push(record),
            Err(StoreError::NotFound(_)) => return not_found(kb_id),
        }
    }

    match tracked.as_slice() {
        [] => FormReply::failed(StatusCode::BAD_REQUEST, "No file provided"),
        [one] => FormReply::ok(format!(
            "File '{}' uploaded ({} bytes), tracked locally",
            one.filename, one.size
        )),
        many => FormReply::ok(format!("{} files uploaded, tracked locally", many.len())),
    }
}

fn not_found(kb_id: &str) -> FormReply {
    tracing::info!(target: "lore::upload", kb_id = %kb_id, "upload to unknown knowledge base");
    FormReply::failed(StatusCode::NOT_FOUND, "Knowledge base not found")
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Path(kb_id): Path<String>,
    Form(form): Form<ChatForm>,
) -> Html<String> {
    let message = form.message.trim();
    if message.is_empty() {
        return Html(render::error_fragment(EMPTY_MESSAGE));
    }
    let Some(kb) = state.knowledge_bases.get(&kb_id) else {
        return Html(render::error_fragment("Knowledge base not found"));
    };

    let session_id = state.sessions.resolve(form.session_id.as_deref()).await;
    let request = ChatRequest::new(message)
        .with_session(Some(session_id.clone()))
        .with_topic(kb.subject.clone())
        .with_knowledge_base(KnowledgeBaseContext::from(&kb));
    let answer = state.backend.converse(&request).await.log_degraded("converse");

    Html(render::chat_exchange(message, &answer, Some(&session_id)))
}
