//! Context management with token budget enforcement
//!
//! This module holds the request data model, token estimation, per-template
//! token limits and the optimizer that trims history and auxiliary context
//! to fit a limit.

pub mod memory;
pub mod models;
pub mod optimizer;
pub mod token_budget;
pub mod token_estimator;

pub use memory::{MemorySource, StaticMemory};
pub use models::{
    CodeSnippet, ConversationTurn, OutputFormat, ProjectContext, PromptContext, PromptInput,
    PromptMetadata, PromptResult,
};
pub use optimizer::{ContextOptimizer, OptimizedContext};
pub use token_budget::TokenBudget;
pub use token_estimator::{CharHeuristicEstimator, TiktokenEstimator, TokenEstimator, WordBasedEstimator};
