//! Error taxonomy for prompt construction and provider calls

use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the prompt engine and the provider adapters
#[derive(Debug, Error)]
pub enum EngineError {
    /// The unavoidable baseline (system message + current query) does not fit
    #[error("{message} ({token_count} tokens, limit {max_tokens})")]
    TokenLimitExceeded {
        message: String,
        token_count: usize,
        max_tokens: usize,
    },

    /// Any provider, network or response-decoding failure
    #[error("LLM API error: {0}")]
    LlmApi(String),

    #[error("Missing API key: environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn token_limit(token_count: usize, max_tokens: usize) -> Self {
        Self::TokenLimitExceeded {
            message: "Prompt baseline exceeds the token limit".to_string(),
            token_count,
            max_tokens,
        }
    }

    /// Whether this error is a budget failure rather than a construction failure
    pub fn is_token_limit(&self) -> bool {
        matches!(self, Self::TokenLimitExceeded { .. })
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_limit_error_fields() {
        let err = EngineError::token_limit(120, 100);
        assert!(err.is_token_limit());
        match err {
            EngineError::TokenLimitExceeded { token_count, max_tokens, .. } => {
                assert_eq!(token_count, 120);
                assert_eq!(max_tokens, 100);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display_messages() {
        let err = EngineError::LlmApi("rate limited".to_string());
        assert_eq!(err.to_string(), "LLM API error: rate limited");
        assert!(!err.is_token_limit());

        let err = EngineError::MissingApiKey("OPENAI_API_KEY".to_string());
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: EngineError = parse_err.into();
        assert!(matches!(err, EngineError::Serialization(_)));
    }
}
