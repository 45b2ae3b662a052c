//! Configuration for prompt construction, providers and logging
//!
//! Values come from an optional TOML file and are then overridden by
//! environment variables prefixed with `PROMPT_ENGINE__`, for example
//! `PROMPT_ENGINE__PROMPT__DEFAULT_TOKEN_LIMIT=4000`.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration, built once at startup and passed by reference
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file plus environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_string_lossy().to_string();
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&path).required(true))
            .add_source(env_source())
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Load configuration from `.env`, an optional `prompt-engine.toml` and the environment
    pub fn load() -> Result<Self> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .add_source(config::File::with_name("prompt-engine").required(false))
            .add_source(env_source())
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix("PROMPT_ENGINE")
        .separator("__")
        .try_parsing(true)
}

/// Prompt construction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Token limit used when a template has no specific limit
    #[serde(default = "default_token_limit")]
    pub default_token_limit: usize,

    /// Per-template token limits, keyed by template id
    #[serde(default = "default_template_limits")]
    pub template_limits: HashMap<String, usize>,

    /// System message used when the input does not carry one
    #[serde(default = "default_system_message")]
    pub default_system_message: String,

    /// Explicit agent name -> template id overrides
    #[serde(default)]
    pub agent_templates: HashMap<String, String>,

    /// Number of trailing history turns the compact template renders
    #[serde(default = "default_compact_history_turns")]
    pub compact_history_turns: usize,

    /// History length above which the compact template is selected
    #[serde(default = "default_compact_history_threshold")]
    pub compact_history_threshold: usize,
}

fn default_token_limit() -> usize {
    8000
}

fn default_template_limits() -> HashMap<String, usize> {
    HashMap::from([("compact".to_string(), 2000)])
}

fn default_system_message() -> String {
    "You are a helpful AI assistant.".to_string()
}

fn default_compact_history_turns() -> usize {
    2
}

fn default_compact_history_threshold() -> usize {
    5
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            default_token_limit: default_token_limit(),
            template_limits: default_template_limits(),
            default_system_message: default_system_message(),
            agent_templates: HashMap::new(),
            compact_history_turns: default_compact_history_turns(),
            compact_history_threshold: default_compact_history_threshold(),
        }
    }
}

/// Connection settings for a single LLM provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Environment variable holding the API key
    pub api_key_env: String,

    /// API base URL
    pub base_url: String,

    /// Model used when a call does not name one
    pub default_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Optional HTTP client timeout; unset means the client never times out
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

impl ProviderConfig {
    pub fn openai() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            default_model: "gpt-4o".to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_ms: None,
        }
    }

    pub fn anthropic() -> Self {
        Self {
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            default_model: "claude-3-5-sonnet-20241022".to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_ms: None,
        }
    }

    pub fn gemini() -> Self {
        Self {
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            default_model: "gemini-1.5-pro".to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_ms: None,
        }
    }

    /// Get the client timeout as Duration, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Per-provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "ProviderConfig::openai")]
    pub openai: ProviderConfig,

    #[serde(default = "ProviderConfig::anthropic")]
    pub anthropic: ProviderConfig,

    #[serde(default = "ProviderConfig::gemini")]
    pub gemini: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: ProviderConfig::openai(),
            anthropic: ProviderConfig::anthropic(),
            gemini: ProviderConfig::gemini(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.prompt.default_token_limit, 8000);
        assert_eq!(config.prompt.template_limits.get("compact"), Some(&2000));
        assert_eq!(config.prompt.compact_history_turns, 2);
        assert_eq!(config.providers.openai.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.providers.anthropic.api_key_env, "ANTHROPIC_API_KEY");
        assert!(config.providers.gemini.timeout().is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_file_with_partial_sections() {
        let dir = std::env::temp_dir().join(format!("prompt-engine-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("engine.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[prompt]
default_token_limit = 4000

[prompt.agent_templates]
reviewer = "structured"

[providers.openai]
api_key_env = "CUSTOM_OPENAI_KEY"
base_url = "http://localhost:9000/v1"
default_model = "gpt-4o-mini"
timeout_ms = 2500
"#
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.prompt.default_token_limit, 4000);
        assert_eq!(
            config.prompt.agent_templates.get("reviewer").map(String::as_str),
            Some("structured")
        );
        assert_eq!(config.providers.openai.api_key_env, "CUSTOM_OPENAI_KEY");
        assert_eq!(config.providers.openai.timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.providers.openai.max_tokens, 1024);
        // Untouched sections keep their defaults
        assert_eq!(config.providers.anthropic.base_url, "https://api.anthropic.com");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_from_missing_file_fails() {
        let result = Config::from_file("/nonexistent/prompt-engine.toml");
        assert!(matches!(result, Err(crate::error::EngineError::Configuration(_))));
    }
}
