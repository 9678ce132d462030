use crate::common::ConformanceError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];
const MAX_ERROR_BODY_CHARS: usize = 1000;

/// Backoff schedule for transient REST failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 8,
            backoff_base: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        std::cmp::min(self.max_backoff, self.backoff_base.saturating_mul(factor))
    }
}

/// A decoded REST response: HTTP status plus the JSON body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// Exchange-level result code (`code` field), if present.
    pub fn code(&self) -> Option<i64> {
        self.body.get("code").and_then(Value::as_i64)
    }
}

// Common REST transport definition
#[async_trait]
pub trait ExchangeTrait: Send + Sync {
    fn api_base(&self) -> &str;
    fn client(&self) -> &reqwest::Client;
    fn exchange_name(&self) -> &str;

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }

    /// GET `endpoint` relative to [api_base](ExchangeTrait::api_base).
    /// Retries 429/5xx and connect/timeout errors with backoff; any other
    /// non-200 final status becomes [ConformanceError::ApiError].
    async fn get<Q>(&self, endpoint: &str, query: &Q) -> Result<ApiResponse, ConformanceError>
    where
        Q: Serialize + ?Sized + Sync,
    {
        let url = format!("{}{}", self.api_base(), endpoint.trim_start_matches('/'));
        let policy = self.retry_policy();
        let mut attempt: u32 = 0;

        loop {
            let started = Instant::now();
            let result = self.client().get(&url).query(query).send().await;
            let elapsed_ms = started.elapsed().as_millis();

            let response = match result {
                Ok(r) => r,
                Err(e) => {
                    if (e.is_connect() || e.is_timeout()) && attempt < policy.max_retries {
                        tracing::warn!(
                            "{} GET {} failed in {}ms (attempt {}): {}",
                            self.exchange_name(),
                            endpoint,
                            elapsed_ms,
                            attempt + 1,
                            e
                        );
                        tokio::time::sleep(policy.backoff(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                    tracing::error!(
                        "{} GET {} failed in {}ms: {}",
                        self.exchange_name(),
                        endpoint,
                        elapsed_ms,
                        e
                    );
                    return Err(e.into());
                }
            };

            let status = response.status().as_u16();
            tracing::debug!(
                "{} GET {} -> {} in {}ms",
                self.exchange_name(),
                response.url().path(),
                status,
                elapsed_ms
            );

            if RETRY_STATUSES.contains(&status) && attempt < policy.max_retries {
                tokio::time::sleep(policy.backoff(attempt)).await;
                attempt += 1;
                continue;
            }

            if status != 200 {
                let text = response.text().await.unwrap_or_default();
                let body: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
                tracing::warn!(
                    "{} GET {}: unexpected status {} (expected 200): {}",
                    self.exchange_name(),
                    endpoint,
                    status,
                    body
                );
                return Err(ConformanceError::ApiError { status, body });
            }

            let body: Value = response.json().await?;
            return Ok(ApiResponse { status, body });
        }
    }

    async fn health_check(&self) -> Result<(), ConformanceError>;
}

/// Ordered source of decoded WebSocket messages.
///
/// `recv` suspends until a message is available or `timeout` elapses, in
/// which case it returns [ConformanceError::Timeout]. Any other error is a
/// transport failure and callers propagate it.
#[async_trait]
pub trait MessageSource: Send {
    async fn recv(&mut self, timeout: Duration) -> Result<Value, ConformanceError>;
}

/// A message source that can also manage its own subscriptions.
#[async_trait]
pub trait BookSession: MessageSource {
    /// Sends a subscribe request and returns the request id used.
    async fn subscribe(
        &mut self,
        channels: &[String],
        extra_params: Option<&serde_json::Map<String, Value>>,
    ) -> Result<u64, ConformanceError>;

    async fn unsubscribe(&mut self, channels: &[String]) -> Result<u64, ConformanceError>;
}
