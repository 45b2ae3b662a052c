//! Prompt orchestration: select, optimize, render, with a one-shot fallback

use super::selector::{TemplateId, TemplateSelector};
use super::templates::{PromptRenderer, TemplateRenderer};
use crate::config::PromptConfig;
use crate::context::memory::MemorySource;
use crate::context::models::{PromptContext, PromptInput, PromptMetadata, PromptResult};
use crate::context::optimizer::ContextOptimizer;
use crate::context::token_budget::TokenBudget;
use crate::context::token_estimator::{CharHeuristicEstimator, TokenEstimator};
use crate::error::{EngineError, Result};
use crate::metrics::METRICS;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds prompts that fit a token budget.
///
/// Holds only immutable configuration, so a single instance can serve
/// concurrent callers without locking.
pub struct PromptManager {
    selector: TemplateSelector,
    optimizer: ContextOptimizer,
    renderer: Arc<dyn PromptRenderer>,
    estimator: Arc<dyn TokenEstimator>,
    budget: TokenBudget,
    agent_templates: HashMap<String, TemplateId>,
}

impl PromptManager {
    /// Create a manager with a custom token estimator
    pub fn new(config: &PromptConfig, estimator: Arc<dyn TokenEstimator>) -> Result<Self> {
        let budget = TokenBudget::from_config(config)?;
        let agent_templates = config
            .agent_templates
            .iter()
            .map(|(agent, template)| (agent.clone(), TemplateId::resolve(template)))
            .collect();

        Ok(Self {
            selector: TemplateSelector::new(config.compact_history_threshold),
            optimizer: ContextOptimizer::new(estimator.clone(), config.default_system_message.clone()),
            renderer: Arc::new(TemplateRenderer::new(
                config.default_system_message.clone(),
                config.compact_history_turns,
            )),
            estimator,
            budget,
            agent_templates,
        })
    }

    /// Create with the length/4 heuristic estimator
    pub fn with_default_estimator(config: &PromptConfig) -> Result<Self> {
        Self::new(config, Arc::new(CharHeuristicEstimator))
    }

    /// Swap the renderer used for all templates
    pub fn with_renderer(mut self, renderer: Arc<dyn PromptRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Template for this request: agent override if one is mapped, else the selector
    pub fn resolve_template(&self, input: &PromptInput, context: &PromptContext) -> TemplateId {
        if let Some(template) = input.agent.as_ref().and_then(|a| self.agent_templates.get(a)) {
            debug!("Agent override selects template {}", template);
            return *template;
        }
        self.selector.select(input, context)
    }

    /// Build a prompt for `input` using as much of `context` as fits.
    ///
    /// Token-limit failures propagate. Any other failure while optimizing or
    /// rendering falls back once to the compact template with no context.
    pub fn create_prompt(&self, input: &PromptInput, context: &PromptContext) -> Result<PromptResult> {
        let template = self.resolve_template(input, context);
        let token_limit = self.budget.limit_for(template);

        match self.build(template, input, context, token_limit) {
            Ok(result) => Ok(result),
            Err(err) if err.is_token_limit() => Err(err),
            Err(err) => {
                warn!(
                    "Prompt construction with template {} failed: {}; using compact fallback",
                    template, err
                );
                METRICS.record_prompt_fallback();
                self.fallback(input)
            }
        }
    }

    /// Fetch context from a memory source, then build the prompt
    pub async fn create_prompt_for_session(
        &self,
        memory: &dyn MemorySource,
        session_id: &str,
        input: &PromptInput,
    ) -> Result<PromptResult> {
        let context = memory.get_context(session_id, &input.query).await?;
        self.create_prompt(input, &context)
    }

    fn build(
        &self,
        template: TemplateId,
        input: &PromptInput,
        context: &PromptContext,
        token_limit: usize,
    ) -> Result<PromptResult> {
        let optimized = self.optimizer.optimize(template, input, context, token_limit)?;
        let prompt = self.renderer.render(template, input, &optimized.context)?;
        let estimated_tokens = self.estimator.estimate(&prompt);

        if estimated_tokens > token_limit {
            warn!(
                "Rendered prompt exceeds limit after template overhead: {} > {}",
                estimated_tokens, token_limit
            );
        }

        let metadata = optimized.metadata;
        let truncated = metadata.history_truncated || !metadata.context_included;

        info!(
            "Built prompt with template {}: {} tokens, {} history turns, truncated={}",
            template, estimated_tokens, metadata.context_size, truncated
        );
        METRICS.record_prompt(template.as_str(), estimated_tokens);

        Ok(PromptResult {
            prompt,
            estimated_tokens,
            truncated,
            template_used: template.as_str().to_string(),
            metadata,
        })
    }

    /// Single-level fallback: compact template, empty context, never retried
    fn fallback(&self, input: &PromptInput) -> Result<PromptResult> {
        let prompt = self
            .renderer
            .render(TemplateId::Compact, input, &PromptContext::default())
            .map_err(|e| EngineError::Template(format!("compact fallback failed: {e}")))?;
        let estimated_tokens = self.estimator.estimate(&prompt);
        METRICS.record_prompt(TemplateId::Compact.as_str(), estimated_tokens);

        Ok(PromptResult {
            prompt,
            estimated_tokens,
            truncated: true,
            template_used: TemplateId::Compact.as_str().to_string(),
            metadata: PromptMetadata::default(),
        })
    }
}
