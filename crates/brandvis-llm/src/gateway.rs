//! Provider gateway: gate, retry, normalize, and absorb failures.

use std::sync::Arc;
use std::time::Duration;

use brandvis_core::AppConfig;

use crate::error::ProviderError;
use crate::gate::ProviderGate;
use crate::gemini::GeminiClient;
use crate::normalize::parse_lines;
use crate::openai::OpenAiClient;
use crate::provider::LlmProvider;
use crate::retry::retry_with_backoff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    /// No retries at all.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff_base_ms: 500,
        }
    }
}

/// One provider behind its process-wide gate.
///
/// [`ProviderGateway::query`] never fails: quota exhaustion, transport
/// errors, and malformed replies are logged and collapse to an empty list.
#[derive(Clone)]
pub struct ProviderGateway {
    provider: Arc<dyn LlmProvider>,
    gate: ProviderGate,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ProviderGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderGateway")
            .field("provider", &self.provider.name())
            .field("gate", &self.gate)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ProviderGateway {
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, gate: ProviderGate, retry: RetryPolicy) -> Self {
        Self {
            provider,
            gate,
            retry,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.provider.name()
    }

    #[must_use]
    pub fn gate(&self) -> &ProviderGate {
        &self.gate
    }

    /// Ask the provider and return its reply as normalized lines.
    ///
    /// Empty `prompt` or `system` yields an empty list without a call. Each
    /// attempt holds a gate permit only while the request is in flight, so
    /// back-off sleeps do not starve other callers.
    pub async fn query(&self, prompt: &str, system: &str) -> Vec<String> {
        let provider = self.provider.name();
        if prompt.trim().is_empty() || system.trim().is_empty() {
            tracing::debug!(provider, "skipping provider call with empty input");
            return Vec::new();
        }

        let result = retry_with_backoff(
            provider,
            self.retry.max_retries,
            self.retry.backoff_base_ms,
            || async move {
                let _permit = self.gate.acquire().await;
                self.provider.complete(system, prompt).await
            },
        )
        .await;

        match result {
            Ok(text) => {
                let lines: Vec<String> = parse_lines(&text).collect();
                tracing::debug!(provider, lines = lines.len(), "provider reply received");
                lines
            }
            Err(err) => {
                tracing::warn!(
                    provider,
                    kind = %err.kind(),
                    error = %err,
                    "provider call failed; treating reply as empty"
                );
                Vec::new()
            }
        }
    }
}

/// The two gateways every analysis uses, built once per process.
#[derive(Debug, Clone)]
pub struct Gateways {
    pub openai: ProviderGateway,
    pub gemini: ProviderGateway,
}

impl Gateways {
    /// Build both gateways from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Network`] if an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let retry = RetryPolicy {
            max_retries: config.provider_max_retries,
            backoff_base_ms: config.provider_retry_backoff_ms,
        };

        let openai = OpenAiClient::with_base_url(
            &config.openai_api_key,
            &config.openai_model,
            config.provider_timeout_secs,
            &config.openai_base_url,
        )?;
        let gemini = GeminiClient::with_base_url(
            &config.gemini_api_key,
            &config.gemini_model,
            config.provider_timeout_secs,
            &config.gemini_base_url,
        )?;

        Ok(Self {
            openai: ProviderGateway::new(
                Arc::new(openai),
                ProviderGate::new(config.openai_max_concurrency),
                retry,
            ),
            gemini: ProviderGateway::new(
                Arc::new(gemini),
                ProviderGate::with_min_interval(
                    config.gemini_max_concurrency,
                    Duration::from_millis(config.gemini_min_interval_ms),
                ),
                retry,
            ),
        })
    }
}
