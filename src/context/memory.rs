//! Inbound seam for conversation memory

use super::models::PromptContext;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Supplies history, memories and summaries for a session.
/// Implementations own persistence; the prompt engine only reads.
#[async_trait]
pub trait MemorySource: Send + Sync {
    async fn get_context(&self, session_id: &str, query: &str) -> Result<PromptContext>;
}

/// Fixed per-session contexts held in process
#[derive(Debug, Clone, Default)]
pub struct StaticMemory {
    sessions: HashMap<String, PromptContext>,
}

impl StaticMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, session_id: impl Into<String>, context: PromptContext) -> Self {
        self.sessions.insert(session_id.into(), context);
        self
    }
}

#[async_trait]
impl MemorySource for StaticMemory {
    async fn get_context(&self, session_id: &str, _query: &str) -> Result<PromptContext> {
        let context = self.sessions.get(session_id).cloned().unwrap_or_default();
        debug!(
            "Loaded {} history turns for session {}",
            context.history.len(),
            session_id
        );
        Ok(context)
    }
}
