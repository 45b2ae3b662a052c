//! Metrics collection for observability

use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, Counter, CounterVec, HistogramOpts, HistogramVec, Opts,
    Registry,
};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Duration;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Prompt construction metrics
    pub prompts_built: CounterVec,
    pub prompt_tokens: HistogramVec,
    pub prompt_fallbacks: Counter,

    // Context optimization metrics
    pub history_truncations: Counter,
    pub context_drops: Counter,
    pub token_limit_failures: Counter,

    // Provider metrics
    pub provider_requests: CounterVec,
    pub provider_request_duration: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let prompts_built = register_counter_vec_with_registry!(
            Opts::new("prompts_built_total", "Total prompts built"),
            &["template"],
            registry
        )?;

        let prompt_tokens = register_histogram_vec_with_registry!(
            HistogramOpts::new("prompt_estimated_tokens", "Estimated tokens per built prompt")
                .buckets(vec![64.0, 256.0, 512.0, 1024.0, 2048.0, 4096.0, 8192.0, 16384.0]),
            &["template"],
            registry
        )?;

        let prompt_fallbacks = register_counter_with_registry!(
            Opts::new("prompt_fallbacks_total", "Prompts rebuilt with the compact fallback"),
            registry
        )?;

        let history_truncations = register_counter_with_registry!(
            Opts::new("history_truncations_total", "Prompts whose history was truncated"),
            registry
        )?;

        let context_drops = register_counter_with_registry!(
            Opts::new("context_drops_total", "Prompts that dropped auxiliary context"),
            registry
        )?;

        let token_limit_failures = register_counter_with_registry!(
            Opts::new("token_limit_failures_total", "Requests whose baseline exceeded the limit"),
            registry
        )?;

        let provider_requests = register_counter_vec_with_registry!(
            Opts::new("provider_requests_total", "Total LLM provider requests"),
            &["provider", "operation", "status"],
            registry
        )?;

        let provider_request_duration = register_histogram_vec_with_registry!(
            "provider_request_duration_seconds",
            "LLM provider request duration in seconds",
            &["provider", "operation"],
            registry
        )?;

        Ok(Self {
            registry,
            prompts_built,
            prompt_tokens,
            prompt_fallbacks,
            history_truncations,
            context_drops,
            token_limit_failures,
            provider_requests,
            provider_request_duration,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a successfully built prompt
    pub fn record_prompt(&self, template: &str, estimated_tokens: usize) {
        self.prompts_built.with_label_values(&[template]).inc();
        self.prompt_tokens
            .with_label_values(&[template])
            .observe(estimated_tokens as f64);
    }

    pub fn record_prompt_fallback(&self) {
        self.prompt_fallbacks.inc();
    }

    pub fn record_history_truncation(&self) {
        self.history_truncations.inc();
    }

    pub fn record_context_drop(&self) {
        self.context_drops.inc();
    }

    pub fn record_token_limit_failure(&self) {
        self.token_limit_failures.inc();
    }

    /// Record one provider round trip
    pub fn record_provider_request(
        &self,
        provider: &str,
        operation: &str,
        status: &str,
        elapsed: Duration,
    ) {
        self.provider_requests
            .with_label_values(&[provider, operation, status])
            .inc();
        self.provider_request_duration
            .with_label_values(&[provider, operation])
            .observe(elapsed.as_secs_f64());
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }

        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let metrics = Metrics::new();
        assert!(metrics.is_ok());
    }

    #[test]
    fn test_record_prompt() {
        let metrics = Metrics::new().unwrap();
        metrics.record_prompt("standard", 120);
        metrics.record_prompt("standard", 300);
        metrics.record_prompt("compact", 40);

        assert_eq!(metrics.prompts_built.with_label_values(&["standard"]).get(), 2.0);
        assert_eq!(metrics.prompts_built.with_label_values(&["compact"]).get(), 1.0);
    }

    #[test]
    fn test_record_provider_request() {
        let metrics = Metrics::new().unwrap();
        metrics.record_provider_request("gemini", "tools", "error", Duration::from_millis(12));

        assert_eq!(
            metrics
                .provider_requests
                .with_label_values(&["gemini", "tools", "error"])
                .get(),
            1.0
        );
    }

    #[test]
    fn test_export_uses_own_registry() {
        let metrics = Metrics::new().unwrap();
        metrics.record_token_limit_failure();
        metrics.record_history_truncation();

        let exported = metrics.export_prometheus();
        assert!(exported.contains("token_limit_failures_total 1"));
        assert!(exported.contains("history_truncations_total 1"));
    }
}
