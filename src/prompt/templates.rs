//! Prompt templates
//!
//! Each template is a pure function of the input and the optimized context.
//! Layouts are fixed so callers and tests can rely on exact structure.

use super::selector::TemplateId;
use crate::context::models::{
    CodeSnippet, ConversationTurn, OutputFormat, ProjectContext, PromptContext, PromptInput,
};
use crate::error::{EngineError, Result};
use crate::providers::tools::CanonicalTool;

/// Renders a template into a prompt string
pub trait PromptRenderer: Send + Sync {
    fn render(&self, template: TemplateId, input: &PromptInput, context: &PromptContext) -> Result<String>;
}

/// The built-in templates
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    default_system_message: String,
    compact_history_turns: usize,
}

impl TemplateRenderer {
    pub fn new(default_system_message: impl Into<String>, compact_history_turns: usize) -> Self {
        Self {
            default_system_message: default_system_message.into(),
            compact_history_turns,
        }
    }

    fn system<'a>(&'a self, input: &'a PromptInput) -> &'a str {
        input.system_message_or(&self.default_system_message)
    }

    /// `{system}\n\n{history}\n\nUser: {query}\nAssistant:`
    pub fn standard(&self, input: &PromptInput, context: &PromptContext) -> String {
        let mut sections = vec![self.system(input).to_string()];
        if let Some(notes) = memory_notes(context) {
            sections.push(notes);
        }
        if !context.history.is_empty() {
            sections.push(history_block(&context.history));
        }
        sections.push(format!("User: {}\nAssistant:", input.query));
        sections.join("\n\n")
    }

    /// Labelled sections; empty sections are omitted
    pub fn structured(&self, input: &PromptInput, context: &PromptContext) -> String {
        let mut system = self.system(input).to_string();
        if let Some(notes) = memory_notes(context) {
            system.push_str("\n\n");
            system.push_str(&notes);
        }

        let mut sections = vec![format!("## SYSTEM INSTRUCTIONS\n{}", system)];

        if let Some(project) = context.project.as_ref().and_then(project_block) {
            sections.push(format!("## PROJECT CONTEXT\n{}", project));
        }
        if !context.code_snippets.is_empty() {
            sections.push(format!("## RELEVANT CODE\n{}", snippets_block(&context.code_snippets)));
        }
        if !context.history.is_empty() {
            sections.push(format!("## CONVERSATION HISTORY\n{}", history_block(&context.history)));
        }

        sections.push(format!("## CURRENT QUERY\n{}", input.query));

        let instruction = match input.output_format {
            Some(OutputFormat::Json) => "Respond with a single valid JSON object and no additional text.",
            _ => "Provide a clear, well-structured response.",
        };
        sections.push(format!("## YOUR RESPONSE\n{}", instruction));

        sections.join("\n\n")
    }

    /// Token-minimal layout: `U:`/`A:` prefixes, last few turns, no headers
    pub fn compact(&self, input: &PromptInput, context: &PromptContext) -> String {
        let skip = context.history.len().saturating_sub(self.compact_history_turns);
        let mut lines = vec![self.system(input).to_string()];
        lines.extend(context.history[skip..].iter().map(ConversationTurn::render_compact));
        lines.push(format!("U: {}\nA:", input.query));
        lines.join("\n")
    }

    pub fn function_calling(&self, input: &PromptInput, context: &PromptContext) -> Result<String> {
        if context.function_definitions.is_empty() {
            return Err(EngineError::Template(
                "function-calling template requires at least one function definition".to_string(),
            ));
        }

        let mut sections = vec![
            self.system(input).to_string(),
            "You can call the tools listed below. When a tool would help answer the request, \
             respond with a function call instead of guessing the result."
                .to_string(),
            tools_block(&context.function_definitions)?,
        ];
        if !context.history.is_empty() {
            sections.push(history_block(&context.history));
        }
        sections.push(format!("User: {}\nAssistant:", input.query));
        Ok(sections.join("\n\n"))
    }

    pub fn code_generation(&self, input: &PromptInput, context: &PromptContext) -> String {
        let language = input.language.as_deref();
        let expert = match language {
            Some(language) => format!(
                "You are an expert {} developer. Write correct, idiomatic and well-documented code.",
                language
            ),
            None => "You are an expert software developer. Write correct, idiomatic and \
                     well-documented code."
                .to_string(),
        };

        let mut sections = vec![self.system(input).to_string(), expert];
        if !context.code_snippets.is_empty() {
            sections.push(format!("## RELEVANT CODE\n{}", snippets_block(&context.code_snippets)));
        }
        if !context.history.is_empty() {
            sections.push(history_block(&context.history));
        }
        sections.push(format!("User: {}", input.query));

        if let Some(practices) = language.and_then(best_practices) {
            let items: Vec<String> = practices.iter().map(|p| format!("- {}", p)).collect();
            sections.push(format!("## BEST PRACTICES\n{}", items.join("\n")));
        }

        let closing = match language {
            Some(language) => format!("Please provide the {} implementation.\nAssistant:", language),
            None => "Please provide the implementation.\nAssistant:".to_string(),
        };
        sections.push(closing);
        sections.join("\n\n")
    }
}

impl PromptRenderer for TemplateRenderer {
    fn render(&self, template: TemplateId, input: &PromptInput, context: &PromptContext) -> Result<String> {
        match template {
            TemplateId::Standard => Ok(self.standard(input, context)),
            TemplateId::Structured => Ok(self.structured(input, context)),
            TemplateId::Compact => Ok(self.compact(input, context)),
            TemplateId::FunctionCalling => self.function_calling(input, context),
            TemplateId::CodeGeneration => Ok(self.code_generation(input, context)),
        }
    }
}

/// Canned guidance; only JavaScript/TypeScript and Python have any
pub fn best_practices(language: &str) -> Option<&'static [&'static str]> {
    match language.to_lowercase().as_str() {
        "javascript" | "typescript" | "js" | "ts" => Some(&[
            "Prefer const and let over var",
            "Use async/await instead of raw promise chains",
            "Handle errors explicitly with try/catch around awaited calls",
            "Keep functions small and pure where possible",
            "Add JSDoc or TypeScript types to public functions",
        ]),
        "python" | "py" => Some(&[
            "Follow PEP 8 naming and formatting",
            "Add type hints to function signatures",
            "Write docstrings for public functions and classes",
            "Use context managers for files and other resources",
            "Raise specific exceptions instead of bare except clauses",
        ]),
        _ => None,
    }
}

/// `## AVAILABLE TOOLS` section listing every definition as pretty JSON
pub(crate) fn tools_block(tools: &[CanonicalTool]) -> Result<String> {
    Ok(format!("## AVAILABLE TOOLS\n{}", serde_json::to_string_pretty(tools)?))
}

pub(crate) fn history_block(history: &[ConversationTurn]) -> String {
    history
        .iter()
        .map(ConversationTurn::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn snippets_block(snippets: &[CodeSnippet]) -> String {
    snippets
        .iter()
        .map(|snippet| {
            let fence = format!("```{}\n{}\n```", snippet.language, snippet.code);
            match &snippet.path {
                Some(path) => format!("File: {}\n{}", path, fence),
                None => fence,
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn project_block(project: &ProjectContext) -> Option<String> {
    let mut lines = Vec::new();
    if !project.files.is_empty() {
        lines.push("Files:".to_string());
        lines.extend(project.files.iter().map(|f| format!("- {}", f)));
    }
    if let Some(active) = &project.active_file {
        lines.push(format!("Active file: {}", active));
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

pub(crate) fn memory_notes(context: &PromptContext) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(summary) = context.summary.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("Conversation summary: {}", summary));
    }
    if !context.memories.is_empty() {
        let items: Vec<String> = context.memories.iter().map(|m| format!("- {}", m)).collect();
        parts.push(format!("Relevant memories:\n{}", items.join("\n")));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> TemplateRenderer {
        TemplateRenderer::new("You are helpful.", 2)
    }

    fn history() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::new("first", "one"),
            ConversationTurn::new("second", "two"),
            ConversationTurn::new("third", "three"),
        ]
    }

    #[test]
    fn test_standard_layout() {
        let context = PromptContext::with_history(history()[..2].to_vec());
        let prompt = renderer().standard(&PromptInput::new("next?"), &context);
        assert_eq!(
            prompt,
            "You are helpful.\n\nUser: first\nAssistant: one\n\nUser: second\nAssistant: two\n\nUser: next?\nAssistant:"
        );
    }

    #[test]
    fn test_standard_without_history() {
        let input = PromptInput::new("hi").with_system_message("Be brief.");
        let prompt = renderer().standard(&input, &PromptContext::default());
        assert_eq!(prompt, "Be brief.\n\nUser: hi\nAssistant:");
    }

    #[test]
    fn test_standard_includes_memory_notes() {
        let context = PromptContext {
            summary: Some("Discussed parsers".to_string()),
            memories: vec!["Prefers Rust".to_string()],
            ..Default::default()
        };
        let prompt = renderer().standard(&PromptInput::new("hi"), &context);
        assert_eq!(
            prompt,
            "You are helpful.\n\nConversation summary: Discussed parsers\nRelevant memories:\n- Prefers Rust\n\nUser: hi\nAssistant:"
        );
    }

    #[test]
    fn test_structured_full_layout() {
        let context = PromptContext {
            history: history()[..1].to_vec(),
            code_snippets: vec![CodeSnippet::new("rust", "fn main() {}").with_path("src/main.rs")],
            project: Some(ProjectContext {
                files: vec!["src/main.rs".to_string(), "Cargo.toml".to_string()],
                active_file: Some("src/main.rs".to_string()),
            }),
            ..Default::default()
        };
        let prompt = renderer().structured(&PromptInput::new("review this"), &context);
        let expected = "## SYSTEM INSTRUCTIONS\nYou are helpful.\n\n\
## PROJECT CONTEXT\nFiles:\n- src/main.rs\n- Cargo.toml\nActive file: src/main.rs\n\n\
## RELEVANT CODE\nFile: src/main.rs\n```rust\nfn main() {}\n```\n\n\
## CONVERSATION HISTORY\nUser: first\nAssistant: one\n\n\
## CURRENT QUERY\nreview this\n\n\
## YOUR RESPONSE\nProvide a clear, well-structured response.";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_structured_omits_empty_sections() {
        let input = PromptInput::new("list users").with_output_format(OutputFormat::Json);
        let prompt = renderer().structured(&input, &PromptContext::default());
        assert!(!prompt.contains("## PROJECT CONTEXT"));
        assert!(!prompt.contains("## RELEVANT CODE"));
        assert!(!prompt.contains("## CONVERSATION HISTORY"));
        assert!(prompt.starts_with("## SYSTEM INSTRUCTIONS\n"));
        assert!(prompt.ends_with("## YOUR RESPONSE\nRespond with a single valid JSON object and no additional text."));
    }

    #[test]
    fn test_compact_keeps_last_two_turns_only() {
        let context = PromptContext {
            history: history(),
            code_snippets: vec![CodeSnippet::new("rust", "secret_snippet()")],
            project: Some(ProjectContext {
                files: vec!["hidden.rs".to_string()],
                active_file: None,
            }),
            ..Default::default()
        };
        let prompt = renderer().compact(&PromptInput::new("go on"), &context);
        assert_eq!(
            prompt,
            "You are helpful.\nU: second\nA: two\nU: third\nA: three\nU: go on\nA:"
        );
        assert!(!prompt.contains("secret_snippet"));
        assert!(!prompt.contains("hidden.rs"));
        assert!(!prompt.contains("##"));
    }

    #[test]
    fn test_function_calling_lists_tools() {
        let context = PromptContext {
            function_definitions: vec![CanonicalTool::function("get_weather", "Look up the weather")],
            ..Default::default()
        };
        let prompt = renderer()
            .function_calling(&PromptInput::new("weather in Paris?"), &context)
            .unwrap();
        assert!(prompt.contains("## AVAILABLE TOOLS"));
        assert!(prompt.contains("\"name\": \"get_weather\""));
        assert!(prompt.ends_with("User: weather in Paris?\nAssistant:"));
    }

    #[test]
    fn test_function_calling_without_tools_is_an_error() {
        let result = renderer().render(
            TemplateId::FunctionCalling,
            &PromptInput::new("hi"),
            &PromptContext::default(),
        );
        assert!(matches!(result, Err(EngineError::Template(_))));
    }

    #[test]
    fn test_code_generation_best_practices() {
        let context = PromptContext::default();

        let python = renderer().code_generation(&PromptInput::new("parse csv").with_language("python"), &context);
        assert!(python.contains("## BEST PRACTICES\n- Follow PEP 8"));
        assert!(python.ends_with("Please provide the python implementation.\nAssistant:"));
        let practices_at = python.find("## BEST PRACTICES").unwrap();
        let closing_at = python.find("Please provide").unwrap();
        assert!(practices_at < closing_at);

        let ts = renderer().code_generation(&PromptInput::new("debounce").with_language("TypeScript"), &context);
        assert!(ts.contains("Prefer const and let over var"));

        let rust = renderer().code_generation(&PromptInput::new("parse csv").with_language("rust"), &context);
        assert!(!rust.contains("## BEST PRACTICES"));
        assert!(rust.ends_with("Please provide the rust implementation.\nAssistant:"));
    }

    #[test]
    fn test_best_practices_table() {
        assert!(best_practices("javascript").is_some());
        assert!(best_practices("Python").is_some());
        assert!(best_practices("go").is_none());
    }
}
