//! Context optimization under a token limit
//!
//! Allocation order:
//! - Baseline: system message + current query, plus the tool list when the
//!   template renders one. Must fit or the call fails.
//! - Project and code snippets: dropped in that order until both fit.
//! - Memory notes: kept only if they fit what project and snippets left.
//! - History: the longest run of most recent turns that fits what is left.
//!
//! Auxiliary sections are costed as the templates render them.

use super::models::{ConversationTurn, PromptContext, PromptInput, PromptMetadata};
use super::token_estimator::TokenEstimator;
use crate::error::{EngineError, Result};
use crate::metrics::METRICS;
use crate::prompt::selector::TemplateId;
use crate::prompt::templates::{memory_notes, project_block, snippets_block, tools_block};
use std::sync::Arc;
use tracing::{debug, warn};

/// Optimized context plus truncation bookkeeping
#[derive(Debug, Clone)]
pub struct OptimizedContext {
    pub context: PromptContext,
    pub metadata: PromptMetadata,
}

/// Trims context to fit a token limit
pub struct ContextOptimizer {
    estimator: Arc<dyn TokenEstimator>,
    default_system_message: String,
}

impl ContextOptimizer {
    pub fn new(estimator: Arc<dyn TokenEstimator>, default_system_message: impl Into<String>) -> Self {
        Self {
            estimator,
            default_system_message: default_system_message.into(),
        }
    }

    /// Tokens needed for the system message and the current query alone
    pub fn baseline_tokens(&self, input: &PromptInput) -> usize {
        let system = input.system_message_or(&self.default_system_message);
        self.estimator
            .estimate(&format!("{}\n\nUser: {}\nAssistant:", system, input.query))
    }

    /// Baseline plus whatever `template` always renders from the context
    pub fn required_tokens(
        &self,
        template: TemplateId,
        input: &PromptInput,
        context: &PromptContext,
    ) -> Result<usize> {
        let mut required = self.baseline_tokens(input);
        if template == TemplateId::FunctionCalling && !context.function_definitions.is_empty() {
            required += self
                .estimator
                .estimate(&tools_block(&context.function_definitions)?);
        }
        Ok(required)
    }

    /// Trim `context` so that what `template` renders fits `token_limit`
    pub fn optimize(
        &self,
        template: TemplateId,
        input: &PromptInput,
        context: &PromptContext,
        token_limit: usize,
    ) -> Result<OptimizedContext> {
        let baseline = self.required_tokens(template, input, context)?;
        if baseline >= token_limit {
            warn!(
                "Prompt baseline does not fit: {} tokens, limit {}",
                baseline, token_limit
            );
            METRICS.record_token_limit_failure();
            return Err(EngineError::token_limit(baseline, token_limit));
        }
        let mut remaining = token_limit - baseline;

        let mut optimized = context.clone();
        let mut context_included = true;

        let mut project_cost = self.project_cost(&optimized);
        let mut snippets_cost = self.snippets_cost(&optimized);
        if project_cost + snippets_cost > remaining {
            debug!(
                "Code context over budget: {} > {} remaining",
                project_cost + snippets_cost,
                remaining
            );
            if optimized.project.take().is_some() {
                context_included = false;
                project_cost = 0;
            }
            if snippets_cost > remaining && !optimized.code_snippets.is_empty() {
                optimized.code_snippets.clear();
                context_included = false;
                snippets_cost = 0;
            }
        }
        remaining -= project_cost + snippets_cost;

        let memory_cost = self.memory_cost(&optimized);
        if memory_cost > remaining {
            debug!("Memory notes over budget: {} > {} remaining", memory_cost, remaining);
            optimized.summary = None;
            optimized.memories.clear();
            context_included = false;
        } else {
            remaining -= memory_cost;
        }

        if !context_included {
            METRICS.record_context_drop();
        }

        let supplied = context.history.len();
        let kept = self.fit_history_suffix(&context.history, remaining);
        optimized.history = context.history[supplied - kept..].to_vec();

        let history_truncated = kept < supplied;
        if history_truncated {
            debug!("History truncated: kept {} of {} turns", kept, supplied);
            METRICS.record_history_truncation();
        }

        Ok(OptimizedContext {
            context: optimized,
            metadata: PromptMetadata {
                context_included,
                history_included: kept > 0,
                history_truncated,
                context_size: kept,
            },
        })
    }

    /// Number of trailing turns that fit `budget`, walking back from the newest
    fn fit_history_suffix(&self, history: &[ConversationTurn], budget: usize) -> usize {
        let costs: Vec<usize> = history
            .iter()
            .map(|turn| self.estimator.estimate(&turn.render()))
            .collect();

        if costs.iter().sum::<usize>() <= budget {
            return history.len();
        }

        let mut used = 0;
        let mut kept = 0;
        for cost in costs.iter().rev() {
            if used + cost > budget {
                break;
            }
            used += cost;
            kept += 1;
        }
        kept
    }

    fn project_cost(&self, context: &PromptContext) -> usize {
        context
            .project
            .as_ref()
            .and_then(project_block)
            .map_or(0, |block| self.estimator.estimate(&block))
    }

    fn snippets_cost(&self, context: &PromptContext) -> usize {
        if context.code_snippets.is_empty() {
            0
        } else {
            self.estimator.estimate(&snippets_block(&context.code_snippets))
        }
    }

    fn memory_cost(&self, context: &PromptContext) -> usize {
        memory_notes(context).map_or(0, |notes| self.estimator.estimate(&notes))
    }
}
