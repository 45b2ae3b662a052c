//! OpenAI chat completions adapter

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

/// `{type: "function", function: {name, description, parameters}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiTool {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub function: OpenAiFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiFunction {
    pub name: String,
    pub description: String,
    pub parameters: ObjectSchema,
}

pub fn to_openai_tools(tools: &[CanonicalTool]) -> Vec<OpenAiTool> {
    tools
        .iter()
        .map(|tool| OpenAiTool {
            tool_type: "function",
            function: OpenAiFunction {
                name: tool.function.name.clone(),
                description: tool.function.description.clone(),
                parameters: ObjectSchema::from_parameters(&tool.function.parameters, "object"),
            },
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

/// Assistant message as returned under `choices[0].message`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiToolCall {
    pub id: String,
    pub function: OpenAiFunctionCall,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiFunctionCall {
    pub name: String,
    /// Normally a JSON string, tolerated as an object
    #[serde(default)]
    pub arguments: Value,
}

pub(crate) fn normalize(message: ResponseMessage) -> ToolCompletion {
    let function_calls = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| CanonicalFunctionCall {
            id: call.id,
            name: call.function.name,
            arguments: arguments_to_string(&call.function.arguments),
        })
        .collect();

    ToolCompletion {
        text: message.content.filter(|c| !c.is_empty()),
        function_calls,
    }
}

/// OpenAI adapter
pub struct OpenAiAdapter {
    http: Client,
    config: ProviderConfig,
    api_key: SecretString,
}

impl OpenAiAdapter {
    /// Create an adapter, reading the API key from the configured environment variable
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = load_api_key(&config)?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: ProviderConfig, api_key: SecretString) -> Result<Self> {
        let http = build_client(&config)?;
        Ok(Self { http, config, api_key })
    }

    async fn chat(
        &self,
        prompt: &str,
        tools: Vec<OpenAiTool>,
        options: &CompletionOptions,
        operation: &str,
    ) -> Result<ResponseMessage> {
        let model = options.model.as_deref().unwrap_or(&self.config.default_model);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system_prompt.as_deref() {
            messages.push(ChatMessage { role: "system", content: system });
        }
        messages.push(ChatMessage { role: "user", content: prompt });

        let request = ChatRequest {
            model,
            messages,
            temperature: options.temperature.unwrap_or(self.config.temperature),
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            response_format: options.json_mode.then_some(ResponseFormat { format_type: "json_object" }),
            tools,
        };

        debug!("Calling OpenAI {}: model={}, prompt_len={}", operation, model, prompt.len());

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let builder = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request);

        let response: ChatResponse = send_json(builder, Provider::OpenAi, operation).await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| EngineError::LlmApi("openai response contained no choices".to_string()))
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    async fn generate_completion(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let message = self.chat(prompt, Vec::new(), options, "completion").await?;
        message
            .content
            .ok_or_else(|| EngineError::LlmApi("openai response contained no text".to_string()))
    }

    async fn generate_with_tools(
        &self,
        prompt: &str,
        tools: &[CanonicalTool],
        options: &CompletionOptions,
    ) -> Result<ToolCompletion> {
        let model = options.model.as_deref().unwrap_or(&self.config.default_model);
        warn_if_functions_unsupported(Provider::OpenAi, model);

        let message = self.chat(prompt, to_openai_tools(tools), options, "tools").await?;
        Ok(RawToolResponse::OpenAi(message).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_openai_tools() {
        let tools = vec![CanonicalTool::function("search", "Search the docs")
            .with_parameter("query", json!({"type": "string"}), true)];
        let translated = to_openai_tools(&tools);

        let value = serde_json::to_value(&translated).unwrap();
        assert_eq!(
            value,
            json!([{
                "type": "function",
                "function": {
                    "name": "search",
                    "description": "Search the docs",
                    "parameters": {
                        "type": "object",
                        "properties": {"query": {"type": "string"}},
                        "required": ["query"]
                    }
                }
            }])
        );
    }

    #[test]
    fn test_normalize_string_and_object_arguments() {
        let message: ResponseMessage = serde_json::from_value(json!({
            "content": null,
            "tool_calls": [
                {"id": "call_a", "type": "function", "function": {"name": "f", "arguments": "{\"x\":1}"}},
                {"id": "call_b", "type": "function", "function": {"name": "g", "arguments": {"y": 2}}}
            ]
        }))
        .unwrap();

        let completion = normalize(message);
        assert!(completion.text.is_none());
        assert_eq!(completion.function_calls.len(), 2);
        assert_eq!(completion.function_calls[0].id, "call_a");
        assert_eq!(completion.function_calls[0].arguments, "{\"x\":1}");
        assert_eq!(completion.function_calls[1].arguments, "{\"y\":2}");
    }

    #[test]
    fn test_normalize_text_only() {
        let message: ResponseMessage =
            serde_json::from_value(json!({"content": "Hello", "tool_calls": null})).unwrap();
        let completion = normalize(message);
        assert_eq!(completion.text.as_deref(), Some("Hello"));
        assert!(!completion.has_calls());
    }
}
