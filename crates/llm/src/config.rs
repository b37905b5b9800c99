use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use switchboard_common::{Result, SwitchboardError};

use crate::anthropic::AnthropicClient;
use crate::client::{LlmClient, LlmRequest, LlmResponse};
use crate::openai::{OpenAiClient, DEFAULT_BASE_URL};
use crate::retry::{RetryConfig, RetryingClient};

/// Reasoning-service configuration, shared by the classifier and the
/// search adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider type: "openai" or "anthropic"
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Falls back to OPENAI_API_KEY / ANTHROPIC_API_KEY when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override (OpenAI-compatible gateways, local test servers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_provider() -> String {
    "openai".into()
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_timeout() -> u64 {
    30_000
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            api_url: None,
            temperature: None,
            max_tokens: None,
            timeout_ms: default_timeout(),
            max_concurrent_requests: default_max_concurrent(),
            retry: RetryConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from config or environment variables.
    ///
    /// Priority:
    /// 1. Explicit api_key in config
    /// 2. Environment variable based on provider:
    ///    - "openai" -> OPENAI_API_KEY
    ///    - "anthropic" -> ANTHROPIC_API_KEY
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }

        let env_var = match self.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            "anthropic" => "ANTHROPIC_API_KEY",
            _ => return None,
        };

        std::env::var(env_var).ok().filter(|k| !k.is_empty())
    }

    fn targets_public_openai(&self) -> bool {
        match self.api_url.as_deref() {
            None => true,
            Some(url) => url.trim_end_matches('/') == DEFAULT_BASE_URL,
        }
    }
}

pub struct SemaphoredClient {
    inner: Arc<dyn LlmClient>,
    semaphore: Arc<tokio::sync::Semaphore>,
}

impl SemaphoredClient {
    pub fn new(inner: Arc<dyn LlmClient>, max_concurrent: usize) -> Self {
        Self {
            inner,
            semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent.max(1))),
        }
    }
}

#[async_trait]
impl LlmClient for SemaphoredClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| SwitchboardError::Provider(format!("Semaphore acquire failed: {e}")))?;
        self.inner.complete(request).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Build the provider client wrapped in concurrency and retry limits.
pub fn build_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let api_key = config.resolve_api_key();

    let base_client: Arc<dyn LlmClient> = match config.provider.as_str() {
        "openai" => {
            if api_key.is_none() && config.targets_public_openai() {
                return Err(SwitchboardError::Config(
                    "OPENAI_API_KEY not set. Export it, add it to .env, or set provider.api_key"
                        .to_string(),
                ));
            }
            Arc::new(
                OpenAiClient::new(config.api_url.clone(), config.model.clone(), api_key)?
                    .with_timeout(config.timeout_ms)?
                    .with_sampling_defaults(config.temperature, config.max_tokens),
            )
        }
        "anthropic" => {
            let api_key = api_key.ok_or_else(|| {
                SwitchboardError::Config("Anthropic requires an API key".to_string())
            })?;
            let mut client = AnthropicClient::new(config.model.clone(), api_key)?
                .with_timeout(config.timeout_ms)?
                .with_sampling_defaults(config.temperature, config.max_tokens);
            if let Some(ref url) = config.api_url {
                client = client.with_base_url(url.clone());
            }
            Arc::new(client)
        }
        other => {
            return Err(SwitchboardError::Config(format!(
                "Unknown LLM provider: {other}"
            )));
        }
    };

    Ok(layer_client(base_client, config))
}

/// Stack the limiter under the retry loop so no permit is held while
/// waiting out a backoff.
fn layer_client(base: Arc<dyn LlmClient>, config: &LlmConfig) -> Arc<dyn LlmClient> {
    let semaphored = SemaphoredClient::new(base, config.max_concurrent_requests);
    Arc::new(RetryingClient::new(semaphored, config.retry.clone()))
}
