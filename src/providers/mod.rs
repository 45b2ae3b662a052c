//! Multi-provider adapter layer
//!
//! Every adapter accepts `CanonicalTool`s, translates them to its provider's
//! wire format, and normalizes responses back to `CanonicalFunctionCall`s.
//! Provider errors never cross this boundary unwrapped; they surface as
//! `EngineError::LlmApi`.

pub mod analysis;
pub mod anthropic;
pub mod gemini;
pub mod models;
pub mod openai;
pub mod tools;

mod http;

pub use analysis::{CodeAnalysis, CodeIssue, CODE_ANALYSIS_SYSTEM_PROMPT};
pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use models::{find_model, AiModel, MODELS};
pub use openai::OpenAiAdapter;
pub use tools::{CanonicalFunctionCall, CanonicalTool, ToolCompletion};

use crate::config::ProvidersConfig;
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
        }
    }

    /// Static capability table
    pub fn supports(&self, capability: Capability) -> bool {
        match (self, capability) {
            (Provider::OpenAi, _) => true,
            (Provider::Anthropic, Capability::ImageGeneration) => false,
            (Provider::Anthropic, _) => true,
            // Function calling on Gemini varies by model; see `AiModel::supports_functions`
            (Provider::Gemini, Capability::ImageGeneration) => false,
            (Provider::Gemini, _) => true,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "gemini" | "google" => Ok(Provider::Gemini),
            other => Err(EngineError::Configuration(format!("unknown provider: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ImageGeneration,
    FunctionCalling,
    JsonMode,
}

/// Per-call options; unset fields fall back to the adapter's configuration
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
    pub json_mode: bool,
}

impl CompletionOptions {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// Raw provider responses, one variant per wire format
#[derive(Debug, Clone)]
pub enum RawToolResponse {
    OpenAi(openai::ResponseMessage),
    Anthropic(Vec<anthropic::ContentBlock>),
    Gemini(Vec<gemini::ResponsePart>),
}

impl RawToolResponse {
    /// Convert to the canonical text + calls shape
    pub fn normalize(self) -> ToolCompletion {
        match self {
            RawToolResponse::OpenAi(message) => openai::normalize(message),
            RawToolResponse::Anthropic(blocks) => anthropic::normalize(blocks),
            RawToolResponse::Gemini(parts) => gemini::normalize(parts),
        }
    }
}

/// A single LLM provider
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    /// Model used when options do not name one
    fn default_model(&self) -> &str;

    /// Single text completion
    async fn generate_completion(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;

    /// Completion with tools available; calls come back normalized
    async fn generate_with_tools(
        &self,
        prompt: &str,
        tools: &[CanonicalTool],
        options: &CompletionOptions,
    ) -> Result<ToolCompletion>;

    /// Structured code review, constrained to the `CodeAnalysis` JSON shape
    async fn analyze_code(&self, code: &str, language: &str) -> Result<CodeAnalysis> {
        let options = CompletionOptions {
            temperature: Some(0.2),
            system_prompt: Some(CODE_ANALYSIS_SYSTEM_PROMPT.to_string()),
            json_mode: true,
            ..Default::default()
        };
        let raw = self
            .generate_completion(&analysis::analysis_prompt(code, language), &options)
            .await?;
        analysis::parse_code_analysis(&raw)
    }

    fn supports_capability(&self, capability: Capability) -> bool {
        self.provider().supports(capability)
    }
}

/// Warn when the catalog says the model cannot call functions; never blocks the call
pub(crate) fn warn_if_functions_unsupported(provider: Provider, model: &str) {
    if find_model(model).is_some_and(|m| !m.supports_functions) {
        warn!(
            "{} model {} is not known to support function calling",
            provider, model
        );
    }
}

/// Build the adapter for `provider`. Fails fast if its API key is missing.
pub fn create_adapter(provider: Provider, config: &ProvidersConfig) -> Result<Arc<dyn ProviderAdapter>> {
    let adapter: Arc<dyn ProviderAdapter> = match provider {
        Provider::OpenAi => Arc::new(OpenAiAdapter::new(config.openai.clone())?),
        Provider::Anthropic => Arc::new(AnthropicAdapter::new(config.anthropic.clone())?),
        Provider::Gemini => Arc::new(GeminiAdapter::new(config.gemini.clone())?),
    };
    info!(provider = %provider, model = adapter.default_model(), "Provider adapter initialized");
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_table() {
        assert!(Provider::OpenAi.supports(Capability::ImageGeneration));
        assert!(Provider::OpenAi.supports(Capability::FunctionCalling));
        assert!(Provider::OpenAi.supports(Capability::JsonMode));

        assert!(!Provider::Anthropic.supports(Capability::ImageGeneration));
        assert!(Provider::Anthropic.supports(Capability::FunctionCalling));
        assert!(Provider::Anthropic.supports(Capability::JsonMode));

        assert!(!Provider::Gemini.supports(Capability::ImageGeneration));
        assert!(Provider::Gemini.supports(Capability::FunctionCalling));
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("google".parse::<Provider>().unwrap(), Provider::Gemini);
        assert!("mistral".parse::<Provider>().is_err());
        assert_eq!(Provider::Anthropic.to_string(), "anthropic");
    }

    #[test]
    fn test_create_adapter_requires_key() {
        let mut config = ProvidersConfig::default();
        config.gemini.api_key_env = "PROMPT_ENGINE_TEST_GEMINI_KEY_NEVER_SET".to_string();
        let result = create_adapter(Provider::Gemini, &config);
        assert!(matches!(result, Err(EngineError::MissingApiKey(_))));
    }

    #[test]
    fn test_normalize_dispatches_per_provider() {
        let blocks: Vec<anthropic::ContentBlock> = serde_json::from_value(serde_json::json!([
            {"type": "text", "text": "Checking."},
            {"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {"city": "Oslo"}}
        ]))
        .unwrap();
        let completion = RawToolResponse::Anthropic(blocks).normalize();
        assert_eq!(completion.text.as_deref(), Some("Checking."));
        assert_eq!(completion.function_calls[0].arguments, "{\"city\":\"Oslo\"}");
    }
}
