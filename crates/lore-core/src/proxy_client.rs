//! RAG proxy client: session creation and buffered streamed completions.
//!
//! The proxy answers completions as `data: <json>` lines. `message` frames
//! carry answer text in `data.content`, `error` frames are logged and skipped,
//! and `data: [DONE]` ends the stream. Every failure degrades to a renderable
//! answer; the cause travels in the returned [`Outcome`].

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::backend::{clean_answer, local_session_id, ChatBackend, ChatRequest, KnowledgeBaseContext, EMPTY_ANSWER};
use crate::config::{ProxyConfig, CHAT_TIMEOUT, HEALTH_TIMEOUT};
use crate::error::ProxyError;
use crate::outcome::Outcome;
use crate::sanitizer::escape_html;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Serialize)]
struct SessionRequest<'a> {
    name: String,
    user_id: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    question: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_id: Option<&'a str>,
}

/// What a buffered completion body boiled down to.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrameParse {
    pub answer: String,
    /// Messages from `error` frames, in order.
    pub errors: Vec<String>,
    /// True when the `[DONE]` sentinel was seen.
    pub finished: bool,
}

/// Parses a buffered `data:` frame stream. Never fails: a payload that is not
/// JSON is kept verbatim (plus a line break) rather than dropped.
pub fn parse_frames(body: &str) -> FrameParse {
    let mut parsed = FrameParse::default();

    for line in body.lines() {
        let Some(payload) = line.trim_start().strip_prefix(DATA_PREFIX) else {
            continue;
        };
        let payload = payload.trim();
        if payload.is_empty() {
            continue;
        }
        if payload == DONE_SENTINEL {
            parsed.finished = true;
            break;
        }

        let frame: Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(_) => {
                parsed.answer.push_str(payload);
                parsed.answer.push('\n');
                continue;
            }
        };

        match frame.get("event").and_then(Value::as_str) {
            Some("message") => {
                if let Some(content) = frame.pointer("/data/content").and_then(Value::as_str) {
                    parsed.answer.push_str(content);
                }
            }
            Some("error") => {
                let message = frame
                    .pointer("/data/message")
                    .or_else(|| frame.pointer("/data/content"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| frame.to_string());
                tracing::warn!(target: "lore::proxy", error = %message, "error frame in completion stream");
                parsed.errors.push(message);
            }
            _ => {}
        }
    }

    parsed
}

/// Pulls a session id out of the proxy's create-session response.
fn session_id_from(body: &Value) -> Result<String, ProxyError> {
    if let Some(code) = body.get("code").and_then(Value::as_i64) {
        if code != 0 {
            let message = body.get("message").and_then(Value::as_str).unwrap_or("unknown error");
            return Err(ProxyError::Decode(format!("proxy code {}: {}", code, message)));
        }
    }
    body.pointer("/data/id")
        .or_else(|| body.get("session_id"))
        .or_else(|| body.get("id"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProxyError::Decode("no session id in response".to_string()))
}

pub struct ProxyClient {
    config: ProxyConfig,
    client: reqwest::Client,
}

impl ProxyClient {
    pub fn new(config: ProxyConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(CHAT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn sessions_url(&self) -> String {
        format!("{}/api/v1/chats/{}/sessions", self.base(), self.config.chat_id)
    }

    fn completions_url(&self) -> String {
        format!("{}/api/v1/chats/{}/completions", self.base(), self.config.chat_id)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key.as_deref() {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Asks the proxy for a session; falls back to a `local-` id on any failure.
    pub async fn create_session(&self, user_id: &str) -> Outcome<String> {
        match self.request_session(user_id).await {
            Ok(id) => {
                tracing::info!(target: "lore::proxy", session_id = %id, "proxy session created");
                Outcome::Ok(id)
            }
            Err(cause) => Outcome::degraded(local_session_id(), cause),
        }
    }

    async fn request_session(&self, user_id: &str) -> Result<String, ProxyError> {
        let body = SessionRequest {
            name: format!("{}-{}", user_id, chrono::Utc::now().timestamp()),
            user_id,
        };
        let res = self
            .authorized(self.client.post(self.sessions_url()))
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if status.as_u16() != 200 && status.as_u16() != 201 {
            let body = res.text().await.unwrap_or_default();
            return Err(ProxyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = res.text().await?;
        let parsed: Value =
            serde_json::from_str(&text).map_err(|e| ProxyError::Decode(e.to_string()))?;
        session_id_from(&parsed)
    }

    /// Sends one question and returns the sanitized answer, or a fallback message.
    pub async fn converse(
        &self,
        question: &str,
        session_id: Option<&str>,
        knowledge_base: Option<&KnowledgeBaseContext>,
    ) -> Outcome<String> {
        let question = match knowledge_base {
            Some(ctx) => ctx.prefix(question),
            None => question.to_string(),
        };
        let body = CompletionRequest {
            question,
            stream: true,
            session_id,
            agent_id: self.config.agent_id.as_deref(),
        };

        let raw = match self.request_completion(&body).await {
            Ok(raw) => raw,
            Err(cause) => {
                let message = match &cause {
                    ProxyError::Status { status, .. } => format!(
                        "⚠️ The assistant is unavailable right now (HTTP {}). Please try again shortly.",
                        status
                    ),
                    other => format!("⚠️ Connection error: {}", escape_html(&other.to_string())),
                };
                return Outcome::degraded(message, cause);
            }
        };

        let frames = parse_frames(&raw);
        tracing::debug!(
            target: "lore::proxy",
            chars = frames.answer.len(),
            error_frames = frames.errors.len(),
            finished = frames.finished,
            "completion stream parsed"
        );

        match clean_answer(&frames.answer) {
            Some(answer) => Outcome::Ok(answer),
            None => Outcome::degraded(EMPTY_ANSWER.to_string(), ProxyError::EmptyAnswer),
        }
    }

    async fn request_completion(&self, body: &CompletionRequest<'_>) -> Result<String, ProxyError> {
        let res = self
            .authorized(self.client.post(self.completions_url()))
            .json(body)
            .send()
            .await?;

        let status = res.status();
        if status.as_u16() != 200 {
            let body = res.text().await.unwrap_or_default();
            return Err(ProxyError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res.text().await?)
    }

    /// True when the proxy answers within the health timeout without a 5xx.
    pub async fn check_health(&self) -> bool {
        let probe = self
            .authorized(self.client.get(self.base()))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;
        match probe {
            Ok(res) if res.status().is_server_error() => {
                tracing::warn!(target: "lore::proxy", status = res.status().as_u16(), "proxy health probe got a server error");
                false
            }
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(target: "lore::proxy", error = %e, "proxy health probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl ChatBackend for ProxyClient {
    fn name(&self) -> &'static str {
        "rag_proxy"
    }

    fn endpoint(&self) -> &str {
        &self.config.base_url
    }

    async fn create_session(&self, user_id: &str) -> Outcome<String> {
        ProxyClient::create_session(self, user_id).await
    }

    async fn converse(&self, request: &ChatRequest) -> Outcome<String> {
        ProxyClient::converse(
            self,
            &request.question,
            request.session_id.as_deref(),
            request.knowledge_base.as_ref(),
        )
        .await
    }

    async fn check_health(&self) -> bool {
        ProxyClient::check_health(self).await
    }
}
