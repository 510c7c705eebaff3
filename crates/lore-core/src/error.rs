//! Error types for Lore core.

use thiserror::Error;

/// Failures talking to an external chat service. Never surfaced to the page:
/// they ride along as the cause of a degraded [`crate::Outcome`].
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode upstream response: {0}")]
    Decode(String),

    #[error("API key not configured")]
    MissingApiKey,

    #[error("upstream returned an empty answer")]
    EmptyAnswer,
}

/// Knowledge-base lookups and mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("knowledge base {0} not found")]
    NotFound(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}
