//! Data models for prompt inputs, context and results

use crate::providers::tools::CanonicalTool;
use serde::{Deserialize, Serialize};

/// Desired shape of the model's answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// The current request. Treated as immutable for the duration of a call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptInput {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
}

impl PromptInput {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_system_message(mut self, message: impl Into<String>) -> Self {
        self.system_message = Some(message.into());
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// The system message, or `fallback` when the input carries none
    pub fn system_message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.system_message.as_deref().unwrap_or(fallback)
    }
}

/// One user/assistant exchange. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub input: String,
    pub response: String,
}

impl ConversationTurn {
    pub fn new(input: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            response: response.into(),
        }
    }

    /// Render as `User:`/`Assistant:` lines
    pub fn render(&self) -> String {
        format!("User: {}\nAssistant: {}", self.input, self.response)
    }

    /// Render with single-letter role prefixes
    pub fn render_compact(&self) -> String {
        format!("U: {}\nA: {}", self.input, self.response)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSnippet {
    pub language: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl CodeSnippet {
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_file: Option<String>,
}

/// Everything surrounding the current request. `history` is oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptContext {
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    #[serde(default)]
    pub memories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub code_snippets: Vec<CodeSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectContext>,
    #[serde(default)]
    pub function_definitions: Vec<CanonicalTool>,
    #[serde(default)]
    pub token_optimization: bool,
}

impl PromptContext {
    pub fn with_history(history: Vec<ConversationTurn>) -> Self {
        Self {
            history,
            ..Default::default()
        }
    }

    /// Whether snippets or project metadata are attached
    pub fn has_code_context(&self) -> bool {
        !self.code_snippets.is_empty() || self.project.is_some()
    }

    /// Whether a summary or memories are attached
    pub fn has_memory_notes(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.is_empty()) || !self.memories.is_empty()
    }
}

/// Truncation bookkeeping produced by the optimizer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptMetadata {
    /// False whenever project, snippets or memory notes were dropped
    pub context_included: bool,
    /// False when no history turn survived
    pub history_included: bool,
    /// True iff fewer turns were kept than supplied
    pub history_truncated: bool,
    /// Number of history turns kept
    pub context_size: usize,
}

/// The final prompt plus what happened while building it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResult {
    pub prompt: String,
    pub estimated_tokens: usize,
    pub truncated: bool,
    pub template_used: String,
    pub metadata: PromptMetadata,
}
