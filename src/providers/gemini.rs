//! Google Gemini `generateContent` adapter
//!
//! Gemini wants every tool wrapped in a single `{functionDeclarations: [...]}`
//! object with upper-case schema types. It returns function-call arguments as
//! parsed objects and never assigns call ids, so both are fixed up in
//! `normalize`.

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
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiTool {
    pub function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeminiFunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: ObjectSchema,
}

/// Always exactly one wrapper, holding one declaration per input tool
pub fn to_gemini_tools(tools: &[CanonicalTool]) -> Vec<GeminiTool> {
    let function_declarations = tools
        .iter()
        .map(|tool| GeminiFunctionDeclaration {
            name: tool.function.name.clone(),
            description: tool.function.description.clone(),
            parameters: ObjectSchema::from_parameters(&tool.function.parameters, "OBJECT"),
        })
        .collect();

    vec![GeminiTool { function_declarations }]
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

/// One entry of `candidates[0].content.parts`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiFunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

pub(crate) fn normalize(parts: Vec<ResponsePart>) -> ToolCompletion {
    let mut text = String::new();
    let mut function_calls = Vec::new();

    for part in parts {
        if let Some(chunk) = part.text {
            text.push_str(&chunk);
        }
        if let Some(call) = part.function_call {
            function_calls.push(CanonicalFunctionCall {
                id: format!("call_{}", Uuid::new_v4().simple()),
                name: call.name,
                arguments: arguments_to_string(&call.args),
            });
        }
    }

    ToolCompletion {
        text: (!text.is_empty()).then_some(text),
        function_calls,
    }
}

/// Gemini adapter
pub struct GeminiAdapter {
    http: Client,
    config: ProviderConfig,
    api_key: SecretString,
}

impl GeminiAdapter {
    /// Create an adapter, reading the API key from the configured environment variable
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = load_api_key(&config)?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: ProviderConfig, api_key: SecretString) -> Result<Self> {
        let http = build_client(&config)?;
        Ok(Self { http, config, api_key })
    }

    async fn generate(
        &self,
        prompt: &str,
        tools: Vec<GeminiTool>,
        options: &CompletionOptions,
        operation: &str,
    ) -> Result<Vec<ResponsePart>> {
        let model = options.model.as_deref().unwrap_or(&self.config.default_model);
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart { text: prompt }],
            }],
            system_instruction: options.system_prompt.as_deref().map(|text| SystemInstruction {
                parts: vec![TextPart { text }],
            }),
            generation_config: GenerationConfig {
                temperature: options.temperature.unwrap_or(self.config.temperature),
                max_output_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
                response_mime_type: options.json_mode.then_some("application/json"),
            },
            tools,
        };

        debug!("Calling Gemini {}: model={}, prompt_len={}", operation, model, prompt.len());

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );
        let builder = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request);

        let response: GenerateResponse = send_json(builder, Provider::Gemini, operation).await?;
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .ok_or_else(|| EngineError::LlmApi("gemini response contained no candidates".to_string()))
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    async fn generate_completion(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let parts = self.generate(prompt, Vec::new(), options, "completion").await?;
        normalize(parts)
            .text
            .ok_or_else(|| EngineError::LlmApi("gemini response contained no text".to_string()))
    }

    async fn generate_with_tools(
        &self,
        prompt: &str,
        tools: &[CanonicalTool],
        options: &CompletionOptions,
    ) -> Result<ToolCompletion> {
        let model = options.model.as_deref().unwrap_or(&self.config.default_model);
        warn_if_functions_unsupported(Provider::Gemini, model);

        let wire_tools = if tools.is_empty() { Vec::new() } else { to_gemini_tools(tools) };
        let parts = self.generate(prompt, wire_tools, options, "tools").await?;
        Ok(RawToolResponse::Gemini(parts).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tools() -> Vec<CanonicalTool> {
        vec![
            CanonicalTool::function("get_weather", "Look up the weather")
                .with_parameter("city", json!({"type": "string"}), true),
            CanonicalTool::function("get_time", "Current time, UTC"),
            serde_json::from_value(json!({
                "type": "function",
                "function": {
                    "name": "search ünïcode",
                    "description": "  spaced  ",
                    "parameters": {"properties": {"q": {"type": "string"}}}
                }
            }))
            .unwrap(),
        ]
    }

    #[test]
    fn test_single_wrapper_with_one_declaration_per_tool() {
        let tools = sample_tools();
        let translated = to_gemini_tools(&tools);

        assert_eq!(translated.len(), 1);
        let declarations = &translated[0].function_declarations;
        assert_eq!(declarations.len(), tools.len());
        for (declaration, tool) in declarations.iter().zip(&tools) {
            assert_eq!(declaration.name, tool.function.name);
            assert_eq!(declaration.description, tool.function.description);
            assert_eq!(declaration.parameters.schema_type, "OBJECT");
        }
        assert!(declarations[2].parameters.required.is_empty());
        assert!(declarations[1].parameters.properties.is_empty());
    }

    #[test]
    fn test_wire_shape() {
        let value = serde_json::to_value(to_gemini_tools(&sample_tools()[..1])).unwrap();
        assert_eq!(
            value,
            json!([{
                "functionDeclarations": [{
                    "name": "get_weather",
                    "description": "Look up the weather",
                    "parameters": {
                        "type": "OBJECT",
                        "properties": {"city": {"type": "string"}},
                        "required": ["city"]
                    }
                }]
            }])
        );
    }

    #[test]
    fn test_empty_tool_list_still_yields_one_wrapper() {
        let translated = to_gemini_tools(&[]);
        assert_eq!(translated.len(), 1);
        assert!(translated[0].function_declarations.is_empty());
    }

    #[test]
    fn test_normalize_stringifies_args_and_synthesizes_ids() {
        let parts: Vec<ResponsePart> = serde_json::from_value(json!([
            {"text": "Sure. "},
            {"functionCall": {"name": "get_weather", "args": {"city": "Lima"}}},
            {"functionCall": {"name": "get_time"}}
        ]))
        .unwrap();

        let completion = normalize(parts);
        assert_eq!(completion.text.as_deref(), Some("Sure. "));
        assert_eq!(completion.function_calls.len(), 2);

        let first = &completion.function_calls[0];
        assert_eq!(first.name, "get_weather");
        assert_eq!(first.arguments, "{\"city\":\"Lima\"}");
        assert_eq!(first.parse_arguments().unwrap(), json!({"city": "Lima"}));
        assert!(first.id.starts_with("call_"));

        assert_eq!(completion.function_calls[1].arguments, "{}");
        assert_ne!(first.id, completion.function_calls[1].id);
    }
}
