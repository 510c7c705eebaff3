pub mod chat;
pub mod health;
pub mod knowledge_bases;
pub mod pages;

use serde::Deserialize;

/// Chat form body shared by topic and knowledge-base chats.
#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}
