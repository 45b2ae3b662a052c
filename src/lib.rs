//! Prompt construction and multi-provider LLM access
//!
//! The prompt side turns a request plus its conversational context into a
//! single prompt string that fits a token limit:
//!
//! - [`context`]: data models, token estimation and the context optimizer
//! - [`prompt`]: template selection, rendering and the [`PromptManager`] facade
//!
//! The provider side sends prompts to OpenAI, Anthropic or Gemini through one
//! [`ProviderAdapter`] interface, translating a canonical tool format to each
//! wire format and back.

pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod observability;
pub mod prompt;
pub mod providers;

pub use config::{Config, LoggingConfig, PromptConfig, ProviderConfig, ProvidersConfig};
pub use context::{
    CharHeuristicEstimator, CodeSnippet, ContextOptimizer, ConversationTurn, MemorySource,
    OutputFormat, ProjectContext, PromptContext, PromptInput, PromptMetadata, PromptResult,
    TokenEstimator,
};
pub use error::{EngineError, Result};
pub use prompt::{PromptManager, PromptRenderer, TemplateId, TemplateRenderer, TemplateSelector};
pub use providers::{
    create_adapter, CanonicalFunctionCall, CanonicalTool, Capability, CompletionOptions, Provider,
    ProviderAdapter, ToolCompletion,
};
