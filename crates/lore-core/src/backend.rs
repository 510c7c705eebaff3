//! The seam between request handlers and whatever answers chat questions.

use async_trait::async_trait;

use crate::knowledge_base::KnowledgeBase;
use crate::outcome::Outcome;
use crate::sanitizer::{escape_html, sanitize};

/// Shown when the upstream answered but said nothing.
pub const EMPTY_ANSWER: &str = "I couldn't find an answer to that. Please try rephrasing your question.";

/// Knowledge-base details folded into the question as natural-language context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBaseContext {
    pub name: String,
    pub subject: String,
}

impl KnowledgeBaseContext {
    pub fn prefix(&self, question: &str) -> String {
        format!(
            "Context: You are answering questions about the knowledge base \"{}\", which covers {}.\n\nQuestion: {}",
            self.name, self.subject, question
        )
    }
}

impl From<&KnowledgeBase> for KnowledgeBaseContext {
    fn from(kb: &KnowledgeBase) -> Self {
        Self {
            name: kb.name.clone(),
            subject: kb.subject.clone(),
        }
    }
}

/// One chat turn as the handlers see it.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub question: String,
    pub session_id: Option<String>,
    pub topic: Option<String>,
    pub knowledge_base: Option<KnowledgeBaseContext>,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_knowledge_base(mut self, context: KnowledgeBaseContext) -> Self {
        self.knowledge_base = Some(context);
        self
    }

    /// The question text actually sent upstream.
    pub fn prompt(&self) -> String {
        match &self.knowledge_base {
            Some(ctx) => ctx.prefix(&self.question),
            None => self.question.clone(),
        }
    }
}

/// External chat service. Every method degrades instead of failing.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Short name for logs and the health payload.
    fn name(&self) -> &'static str;

    /// Base URL reported by the health check.
    fn endpoint(&self) -> &str;

    async fn create_session(&self, user_id: &str) -> Outcome<String>;

    async fn converse(&self, request: &ChatRequest) -> Outcome<String>;

    async fn check_health(&self) -> bool;
}

/// Escapes and sanitizes a raw upstream answer; blank results get a stock reply.
pub fn clean_answer(raw: &str) -> Option<String> {
    let cleaned = sanitize(&escape_html(raw));
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Session id minted locally when the upstream cannot provide one.
pub fn local_session_id() -> String {
    format!("local-{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_without_knowledge_base_is_the_question() {
        let req = ChatRequest::new("What is yarrow?");
        assert_eq!(req.prompt(), "What is yarrow?");
    }

    #[test]
    fn prompt_with_knowledge_base_names_it_and_its_subject() {
        let req = ChatRequest::new("What is yarrow?").with_knowledge_base(KnowledgeBaseContext {
            name: "Herbs".into(),
            subject: "natural_health".into(),
        });
        let prompt = req.prompt();
        assert!(prompt.starts_with("Context: "));
        assert!(prompt.contains("\"Herbs\""));
        assert!(prompt.contains("natural_health"));
        assert!(prompt.ends_with("Question: What is yarrow?"));
    }

    #[test]
    fn clean_answer_escapes_before_sanitizing() {
        assert_eq!(
            clean_answer("<script>x</script> **ok**").as_deref(),
            Some("&lt;script&gt;x&lt;/script&gt; <strong>ok</strong>")
        );
        assert_eq!(clean_answer("  [ID:1]  "), None);
    }

    #[test]
    fn local_session_ids_are_prefixed_and_unique() {
        let a = local_session_id();
        let b = local_session_id();
        assert!(a.starts_with("local-"));
        assert_ne!(a, b);
    }
}
