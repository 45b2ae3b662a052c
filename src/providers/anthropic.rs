//! Anthropic messages API adapter

use super::http::{build_client, load_api_key, send_json};
use super::tools::{arguments_to_string, CanonicalFunctionCall, CanonicalTool, ObjectSchema, ToolCompletion};
use super::{warn_if_functions_unsupported, CompletionOptions, Provider, ProviderAdapter, RawToolResponse};
use crate::config::ProviderConfig;
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const JSON_ONLY_INSTRUCTION: &str = "Respond only with a single valid JSON object and no other text.";

/// `{name, description, input_schema}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnthropicTool {
    pub name: String,
    pub description: String,
    pub input_schema: ObjectSchema,
}

pub fn to_anthropic_tools(tools: &[CanonicalTool]) -> Vec<AnthropicTool> {
    tools
        .iter()
        .map(|tool| AnthropicTool {
            name: tool.function.name.clone(),
            description: tool.function.description.clone(),
            input_schema: ObjectSchema::from_parameters(&tool.function.parameters, "object"),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

/// One entry of the response `content` array
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

pub(crate) fn normalize(blocks: Vec<ContentBlock>) -> ToolCompletion {
    let mut texts = Vec::new();
    let mut function_calls = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text } => texts.push(text),
            ContentBlock::ToolUse { id, name, input } => function_calls.push(CanonicalFunctionCall {
                id,
                name,
                arguments: arguments_to_string(&input),
            }),
            ContentBlock::Other => {}
        }
    }

    let text = texts.join("");
    ToolCompletion {
        text: (!text.is_empty()).then_some(text),
        function_calls,
    }
}

/// Anthropic adapter
pub struct AnthropicAdapter {
    http: Client,
    config: ProviderConfig,
    api_key: SecretString,
}

impl AnthropicAdapter {
    /// Create an adapter, reading the API key from the configured environment variable
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = load_api_key(&config)?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: ProviderConfig, api_key: SecretString) -> Result<Self> {
        let http = build_client(&config)?;
        Ok(Self { http, config, api_key })
    }

    /// The API has no JSON flag, so JSON mode is an extra system instruction
    fn system_prompt(options: &CompletionOptions) -> Option<String> {
        match (options.system_prompt.as_deref(), options.json_mode) {
            (Some(system), true) => Some(format!("{}\n\n{}", system, JSON_ONLY_INSTRUCTION)),
            (Some(system), false) => Some(system.to_string()),
            (None, true) => Some(JSON_ONLY_INSTRUCTION.to_string()),
            (None, false) => None,
        }
    }

    async fn messages(
        &self,
        prompt: &str,
        tools: Vec<AnthropicTool>,
        options: &CompletionOptions,
        operation: &str,
    ) -> Result<Vec<ContentBlock>> {
        let model = options.model.as_deref().unwrap_or(&self.config.default_model);
        let request = MessagesRequest {
            model,
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: options.temperature.unwrap_or(self.config.temperature),
            system: Self::system_prompt(options),
            messages: vec![Message { role: "user", content: prompt }],
            tools,
        };

        debug!("Calling Anthropic {}: model={}, prompt_len={}", operation, model, prompt.len());

        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));
        let builder = self
            .http
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request);

        let response: MessagesResponse = send_json(builder, Provider::Anthropic, operation).await?;
        Ok(response.content)
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    async fn generate_completion(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let blocks = self.messages(prompt, Vec::new(), options, "completion").await?;
        normalize(blocks)
            .text
            .ok_or_else(|| EngineError::LlmApi("anthropic response contained no text".to_string()))
    }

    async fn generate_with_tools(
        &self,
        prompt: &str,
        tools: &[CanonicalTool],
        options: &CompletionOptions,
    ) -> Result<ToolCompletion> {
        let model = options.model.as_deref().unwrap_or(&self.config.default_model);
        warn_if_functions_unsupported(Provider::Anthropic, model);

        let blocks = self.messages(prompt, to_anthropic_tools(tools), options, "tools").await?;
        Ok(RawToolResponse::Anthropic(blocks).normalize())
    }
}
