//! Deterministic template selection

use crate::context::models::{OutputFormat, PromptContext, PromptInput};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// The five prompt layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateId {
    Standard,
    Structured,
    Compact,
    FunctionCalling,
    CodeGeneration,
}

impl TemplateId {
    pub const ALL: [TemplateId; 5] = [
        TemplateId::Standard,
        TemplateId::Structured,
        TemplateId::Compact,
        TemplateId::FunctionCalling,
        TemplateId::CodeGeneration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::Standard => "standard",
            TemplateId::Structured => "structured",
            TemplateId::Compact => "compact",
            TemplateId::FunctionCalling => "function-calling",
            TemplateId::CodeGeneration => "code-generation",
        }
    }

    /// Resolve an explicitly requested id; unknown ids fall back to `standard`
    pub fn resolve(name: &str) -> TemplateId {
        name.parse().unwrap_or_else(|_| {
            warn!("Unknown template '{}', falling back to standard", name);
            TemplateId::Standard
        })
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown template id: {0}")]
pub struct UnknownTemplate(pub String);

impl FromStr for TemplateId {
    type Err = UnknownTemplate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateId::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTemplate(s.to_string()))
    }
}

/// Picks a template from the request shape. First matching rule wins:
/// 1. JSON output -> structured
/// 2. language set, or query mentions both "code" and "generate" -> code-generation
/// 3. function definitions present -> function-calling
/// 4. token optimization requested, or long history -> compact
/// 5. code snippets or project present -> structured
/// 6. otherwise -> standard
#[derive(Debug, Clone)]
pub struct TemplateSelector {
    compact_history_threshold: usize,
}

impl Default for TemplateSelector {
    fn default() -> Self {
        Self::new(5)
    }
}

impl TemplateSelector {
    pub fn new(compact_history_threshold: usize) -> Self {
        Self { compact_history_threshold }
    }

    pub fn select(&self, input: &PromptInput, context: &PromptContext) -> TemplateId {
        let template = self.apply_rules(input, context);
        debug!("Selected template: {}", template);
        template
    }

    fn apply_rules(&self, input: &PromptInput, context: &PromptContext) -> TemplateId {
        if input.output_format == Some(OutputFormat::Json) {
            return TemplateId::Structured;
        }

        let query = input.query.to_lowercase();
        if input.language.is_some() || (query.contains("code") && query.contains("generate")) {
            return TemplateId::CodeGeneration;
        }

        if !context.function_definitions.is_empty() {
            return TemplateId::FunctionCalling;
        }

        if context.token_optimization || context.history.len() > self.compact_history_threshold {
            return TemplateId::Compact;
        }

        if context.has_code_context() {
            return TemplateId::Structured;
        }

        TemplateId::Standard
    }
}
