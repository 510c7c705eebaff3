//! Application configuration: defaults, an optional TOML file, then `LORE_*`
//! environment overrides.
//!
//! | Key | Env | Default |
//! |-----|-----|---------|
//! | host | LORE_HOST | 127.0.0.1 |
//! | port | LORE_PORT | 8000 |
//! | static_dir | LORE_STATIC_DIR | static |
//! | content_dir | LORE_CONTENT_DIR | content |
//! | backend | LORE_BACKEND | rag_proxy (or openrouter) |
//! | proxy.base_url | LORE_PROXY__BASE_URL | http://localhost:9380 |
//! | proxy.api_key | LORE_PROXY__API_KEY or RAGFLOW_API_KEY | none |
//! | proxy.chat_id | LORE_PROXY__CHAT_ID | default |
//! | proxy.agent_id | LORE_PROXY__AGENT_ID | none |
//! | proxy.user_id | LORE_PROXY__USER_ID | web-user |
//! | openrouter.base_url | LORE_OPENROUTER__BASE_URL | https://openrouter.ai/api/v1 |
//! | openrouter.api_key | LORE_OPENROUTER__API_KEY or OPENROUTER_API_KEY | none |
//! | openrouter.model | LORE_OPENROUTER__MODEL | agentica-org/deepcoder-14b-preview:free |

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_CONFIG_PATH: &str = "config/lore.toml";

/// Chat and session calls.
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(30);
/// Health probes.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    #[serde(rename = "rag_proxy")]
    RagProxy,
    #[serde(rename = "openrouter")]
    OpenRouter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub chat_id: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    pub user_id: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9380".to_string(),
            api_key: None,
            chat_id: "default".to_string(),
            agent_id: None,
            user_id: "web-user".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: None,
            model: "agentica-org/deepcoder-14b-preview:free".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    pub content_dir: String,
    pub backend: BackendKind,
    pub proxy: ProxyConfig,
    pub openrouter: OpenRouterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            static_dir: "static".to_string(),
            content_dir: "content".to_string(),
            backend: BackendKind::RagProxy,
            proxy: ProxyConfig::default(),
            openrouter: OpenRouterConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `LORE_CONFIG` (default `config/lore.toml`, optional) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("LORE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let d = AppConfig::default();
        let built = config::Config::builder()
            .set_default("host", d.host)?
            .set_default("port", i64::from(d.port))?
            .set_default("static_dir", d.static_dir)?
            .set_default("content_dir", d.content_dir)?
            .set_default("backend", "rag_proxy")?
            .set_default("proxy.base_url", d.proxy.base_url)?
            .set_default("proxy.chat_id", d.proxy.chat_id)?
            .set_default("proxy.user_id", d.proxy.user_id)?
            .set_default("openrouter.base_url", d.openrouter.base_url)?
            .set_default("openrouter.model", d.openrouter.model)?
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("LORE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut cfg: AppConfig = built.try_deserialize()?;
        cfg.fill_keys_from_env();
        Ok(cfg)
    }

    /// Plain provider env vars fill keys the layered config left unset.
    fn fill_keys_from_env(&mut self) {
        self.proxy.api_key = non_blank(self.proxy.api_key.take()).or_else(|| env_opt_string("RAGFLOW_API_KEY"));
        self.openrouter.api_key =
            non_blank(self.openrouter.api_key.take()).or_else(|| env_opt_string("OPENROUTER_API_KEY"));
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn env_opt_string(name: &str) -> Option<String> {
    non_blank(std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = AppConfig::load_from(Path::new("definitely/not/here.toml")).unwrap();
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.backend, BackendKind::RagProxy);
        assert_eq!(cfg.proxy.chat_id, "default");
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "port = 9100\nbackend = \"openrouter\"\n\n[proxy]\nbase_url = \"http://rag.local\"\nchat_id = \"c1\"\nuser_id = \"u1\"\napi_key = \"  \"\n"
        )
        .unwrap();

        let cfg = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.backend, BackendKind::OpenRouter);
        assert_eq!(cfg.proxy.base_url, "http://rag.local");
        assert_eq!(cfg.proxy.chat_id, "c1");
        assert_eq!(cfg.openrouter.base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "backend = \"carrier-pigeon\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::Load(_))
        ));
    }
}
