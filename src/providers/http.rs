//! HTTP plumbing shared by the provider adapters

use super::Provider;
use crate::config::ProviderConfig;
use crate::error::{EngineError, Result};
use crate::metrics::METRICS;
use reqwest::{Client, RequestBuilder};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, error};

/// Read the API key named by the config; absence is fatal
pub(crate) fn load_api_key(config: &ProviderConfig) -> Result<SecretString> {
    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(SecretString::new(key)),
        _ => Err(EngineError::MissingApiKey(config.api_key_env.clone())),
    }
}

pub(crate) fn build_client(config: &ProviderConfig) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| EngineError::Internal(format!("failed to build HTTP client: {e}")))
}

/// Error envelope used by all three providers: `{"error": {"message": ...}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Send a request and decode the JSON body. Every failure becomes `LlmApi`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: Provider,
    operation: &str,
) -> Result<T> {
    let start = Instant::now();
    let result = execute(request, provider).await;

    let status = if result.is_ok() { "success" } else { "error" };
    METRICS.record_provider_request(provider.as_str(), operation, status, start.elapsed());

    match &result {
        Ok(_) => debug!("{} {} succeeded in {:?}", provider, operation, start.elapsed()),
        Err(e) => error!("{} {} failed: {}", provider, operation, e),
    }
    result
}

async fn execute<T: DeserializeOwned>(request: RequestBuilder, provider: Provider) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| EngineError::LlmApi(format!("{provider} request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);
        return Err(EngineError::LlmApi(format!("{provider} returned {status}: {message}")));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| EngineError::LlmApi(format!("{provider} returned an invalid response: {e}")))
}
