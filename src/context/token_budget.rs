//! Token limit resolution per prompt template

use crate::config::PromptConfig;
use crate::error::{EngineError, Result};
use crate::prompt::selector::TemplateId;
use std::collections::HashMap;

/// Resolves the token limit that applies to a template
#[derive(Debug, Clone)]
pub struct TokenBudget {
    default_limit: usize,
    template_limits: HashMap<TemplateId, usize>,
}

impl TokenBudget {
    /// Build from prompt configuration, rejecting zero or unknown entries
    pub fn from_config(config: &PromptConfig) -> Result<Self> {
        if config.default_token_limit == 0 {
            return Err(EngineError::Configuration(
                "default_token_limit must be greater than zero".to_string(),
            ));
        }

        let mut template_limits = HashMap::new();
        for (name, limit) in &config.template_limits {
            let template = name.parse::<TemplateId>().map_err(|_| {
                EngineError::Configuration(format!("unknown template in template_limits: {name}"))
            })?;
            if *limit == 0 {
                return Err(EngineError::Configuration(format!(
                    "token limit for template {name} must be greater than zero"
                )));
            }
            template_limits.insert(template, *limit);
        }

        Ok(Self {
            default_limit: config.default_token_limit,
            template_limits,
        })
    }

    pub fn new(default_limit: usize) -> Self {
        Self {
            default_limit,
            template_limits: HashMap::new(),
        }
    }

    pub fn with_template_limit(mut self, template: TemplateId, limit: usize) -> Self {
        self.template_limits.insert(template, limit);
        self
    }

    /// Template-specific limit if configured, else the default
    pub fn limit_for(&self, template: TemplateId) -> usize {
        self.template_limits
            .get(&template)
            .copied()
            .unwrap_or(self.default_limit)
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }
}
