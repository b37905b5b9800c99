use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use switchboard_common::{Result, SwitchboardError};
use tracing::warn;

use crate::client::{LlmClient, LlmRequest, LlmResponse};

static RETRY_AFTER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)retry-after:?\s*(\d+)").ok());

/// Backoff policy for read-only reasoning-service calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

pub struct RetryingClient<T: LlmClient> {
    inner: T,
    config: RetryConfig,
}

impl<T: LlmClient> RetryingClient<T> {
    pub fn new(inner: T, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    fn is_retryable(error: &SwitchboardError) -> bool {
        if matches!(error, SwitchboardError::Timeout { .. }) {
            return true;
        }
        let lower = error.to_string().to_lowercase();
        lower.contains("429")
            || lower.contains("rate limit")
            || lower.contains("500")
            || lower.contains("502")
            || lower.contains("503")
            || lower.contains("504")
            || lower.contains("server error")
            || lower.contains("bad gateway")
            || lower.contains("service unavailable")
            || lower.contains("gateway timeout")
    }

    fn parse_retry_after(error_msg: &str) -> Option<u64> {
        let secs = RETRY_AFTER
            .as_ref()?
            .captures(error_msg)?
            .get(1)?
            .as_str()
            .parse::<u64>()
            .ok()?;
        Some(secs.saturating_mul(1000))
    }

    fn compute_delay(&self, attempt: u32) -> u64 {
        let base = self.config.initial_delay_ms as f64
            * self.config.backoff_multiplier.powi(attempt as i32);
        let jitter = (base * 0.1 * rand_jitter(attempt)) as u64;
        let delay = (base as u64).saturating_add(jitter);
        delay.min(self.config.max_delay_ms)
    }
}

/// Deterministic jitter derived from the attempt number.
fn rand_jitter(attempt: u32) -> f64 {
    let x = attempt.wrapping_mul(2654435761);
    (x % 100) as f64 / 100.0
}

#[async_trait]
impl<T: LlmClient> LlmClient for RetryingClient<T> {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let mut attempt = 0;
        loop {
            let err = match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if attempt >= self.config.max_retries || !Self::is_retryable(&err) {
                return Err(err);
            }

            let error_msg = err.to_string();
            let delay = Self::parse_retry_after(&error_msg)
                .map(|d| d.min(self.config.max_delay_ms))
                .unwrap_or_else(|| self.compute_delay(attempt));

            warn!(
                attempt = attempt + 1,
                max_retries = self.config.max_retries,
                delay_ms = delay,
                error = %error_msg,
                "Retrying LLM request"
            );

            tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
            attempt += 1;
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn default_retry_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.initial_delay_ms, 500);
        assert_eq!(config.max_delay_ms, 10_000);
        assert!((config.backoff_multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn retryable_error_detection() {
        let provider = |m: &str| SwitchboardError::Provider(m.to_string());
        assert!(RetryingClient::<DummyClient>::is_retryable(&provider(
            "OpenAI API error 429 Too Many Requests: rate limit exceeded"
        )));
        assert!(RetryingClient::<DummyClient>::is_retryable(&provider(
            "Anthropic API error 500 Internal Server Error"
        )));
        assert!(RetryingClient::<DummyClient>::is_retryable(&provider(
            "503 Service Unavailable"
        )));
        assert!(RetryingClient::<DummyClient>::is_retryable(
            &SwitchboardError::Timeout { timeout_ms: 30_000 }
        ));
        assert!(!RetryingClient::<DummyClient>::is_retryable(&provider(
            "API error 401 Unauthorized"
        )));
        assert!(!RetryingClient::<DummyClient>::is_retryable(
            &SwitchboardError::Config("missing model".into())
        ));
    }

    #[test]
    fn parse_retry_after_from_error() {
        let msg = "429 Too Many Requests, Retry-After: 5";
        let delay = RetryingClient::<DummyClient>::parse_retry_after(msg);
        assert_eq!(delay, Some(5000));
    }

    #[test]
    fn parse_retry_after_with_non_ascii_body() {
        let msg = format!(
            "Provider error: OpenAI API error 429 Too Many Requests: {}, Retry-After: 1",
            "\u{130}".repeat(20)
        );
        assert_eq!(RetryingClient::<DummyClient>::parse_retry_after(&msg), Some(1000));
        assert_eq!(
            RetryingClient::<DummyClient>::parse_retry_after("\u{130}\u{130} no header here"),
            None
        );
    }

    #[tokio::test]
    async fn rate_limit_with_non_ascii_body_is_retried() {
        let client = RetryingClient::new(
            FlakyClient {
                failures: 1,
                calls: AtomicU32::new(0),
                error: || {
                    SwitchboardError::Provider(format!(
                        "OpenAI API error 429 Too Many Requests: {}, Retry-After: 0",
                        "\u{130}".repeat(20)
                    ))
                },
            },
            fast_config(2),
        );

        let response = client.complete(LlmRequest::default()).await.unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn compute_delay_respects_max() {
        let client = RetryingClient {
            inner: DummyClient,
            config: RetryConfig {
                max_retries: 5,
                initial_delay_ms: 500,
                max_delay_ms: 2000,
                backoff_multiplier: 10.0,
            },
        };
        let delay = client.compute_delay(5);
        assert!(delay <= 2000);
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let client = RetryingClient::new(
            FlakyClient {
                failures: 2,
                calls: AtomicU32::new(0),
                error: || SwitchboardError::Provider("503 Service Unavailable".into()),
            },
            fast_config(3),
        );

        let response = client.complete(LlmRequest::default()).await.unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let client = RetryingClient::new(
            FlakyClient {
                failures: 10,
                calls: AtomicU32::new(0),
                error: || SwitchboardError::Timeout { timeout_ms: 10 },
            },
            fast_config(2),
        );

        let err = client.complete(LlmRequest::default()).await.unwrap_err();
        assert!(matches!(err, SwitchboardError::Timeout { .. }));
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let client = RetryingClient::new(
            FlakyClient {
                failures: 10,
                calls: AtomicU32::new(0),
                error: || SwitchboardError::Provider("OpenAI API error 401 Unauthorized".into()),
            },
            fast_config(3),
        );

        assert!(client.complete(LlmRequest::default()).await.is_err());
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 1);
    }

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 1.0,
        }
    }

    struct FlakyClient {
        failures: u32,
        calls: AtomicU32,
        error: fn() -> SwitchboardError,
    }

    #[async_trait]
    impl LlmClient for FlakyClient {
        async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err((self.error)());
            }
            Ok(LlmResponse {
                content: "ok".to_string(),
                model: "flaky".to_string(),
                usage: None,
                finish_reason: None,
            })
        }
        fn model_name(&self) -> &str {
            "flaky"
        }
    }

    struct DummyClient;

    #[async_trait]
    impl LlmClient for DummyClient {
        async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse> {
            Ok(LlmResponse {
                content: "dummy".to_string(),
                model: "dummy".to_string(),
                usage: None,
                finish_reason: None,
            })
        }
        fn model_name(&self) -> &str {
            "dummy"
        }
    }
}
