//! Direct OpenRouter backend: a single non-streamed chat completion with a
//! topic-expert system prompt. Sessions are always minted locally.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::{clean_answer, local_session_id, ChatBackend, ChatRequest, EMPTY_ANSWER};
use crate::config::{OpenRouterConfig, CHAT_TIMEOUT, HEALTH_TIMEOUT};
use crate::error::ProxyError;
use crate::outcome::Outcome;
use crate::sanitizer::escape_html;

const MAX_TOKENS: u32 = 1000;

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenRouterBackend {
    config: OpenRouterConfig,
    client: reqwest::Client,
}

impl OpenRouterBackend {
    pub fn new(config: OpenRouterConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(CHAT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }

    fn system_prompt(topic: &str) -> String {
        format!(
            "You are an expert in {}. Provide helpful, accurate information.",
            topic
        )
    }

    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, ProxyError> {
        let topic = request.topic.as_deref().unwrap_or("general knowledge");
        let body = CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Self::system_prompt(topic),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt(),
                },
            ],
            max_tokens: MAX_TOKENS,
        };

        let res = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .header("HTTP-Referer", "http://localhost:8000")
            .header("X-Title", "Lore Learning Platform")
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ProxyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = res
            .json()
            .await
            .map_err(|e| ProxyError::Decode(e.to_string()))?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl ChatBackend for OpenRouterBackend {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    fn endpoint(&self) -> &str {
        &self.config.base_url
    }

    async fn create_session(&self, _user_id: &str) -> Outcome<String> {
        Outcome::Ok(local_session_id())
    }

    async fn converse(&self, request: &ChatRequest) -> Outcome<String> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Outcome::degraded(
                "⚠️ OpenRouter API key not configured.".to_string(),
                ProxyError::MissingApiKey,
            );
        };

        match self.complete(api_key, request).await {
            Ok(raw) => match clean_answer(&raw) {
                Some(answer) => Outcome::Ok(answer),
                None => Outcome::degraded(EMPTY_ANSWER.to_string(), ProxyError::EmptyAnswer),
            },
            Err(cause) => {
                let message = match &cause {
                    ProxyError::Status { status, .. } => format!("⚠️ API Error {}", status),
                    other => format!("⚠️ Connection error: {}", escape_html(&other.to_string())),
                };
                Outcome::degraded(message, cause)
            }
        }
    }

    async fn check_health(&self) -> bool {
        let probe = self
            .client
            .get(format!("{}/models", self.config.base_url.trim_end_matches('/')))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;
        match probe {
            Ok(res) if res.status().is_server_error() => {
                tracing::warn!(target: "lore::openrouter", status = res.status().as_u16(), "OpenRouter health probe got a server error");
                false
            }
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(target: "lore::openrouter", error = %e, "OpenRouter health probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_degrades_without_network() {
        let backend = OpenRouterBackend::new(OpenRouterConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".into(),
            ..OpenRouterConfig::default()
        });
        let out = backend.converse(&ChatRequest::new("hi").with_topic("apocrypha")).await;
        assert!(matches!(out.cause(), Some(ProxyError::MissingApiKey)));
        assert_eq!(out.value(), "⚠️ OpenRouter API key not configured.");
    }

    #[tokio::test]
    async fn sessions_are_local() {
        let backend = OpenRouterBackend::new(OpenRouterConfig::default());
        let out = backend.create_session("web-user").await;
        assert!(!out.is_degraded());
        assert!(out.value().starts_with("local-"));
    }

    #[test]
    fn system_prompt_names_topic() {
        assert_eq!(
            OpenRouterBackend::system_prompt("Lost History"),
            "You are an expert in Lost History. Provide helpful, accurate information."
        );
    }
}
