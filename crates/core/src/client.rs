//! Retrying API client
//!
//! Wraps a request executor with bounded retry: exponential backoff on rate
//! limiting, credential-invalidate-and-retry on token expiry, and immediate
//! surfacing of fatal failures. This is the only place the cached credential
//! is ever invalidated.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use storeship_domain::constants::{BACKOFF_BASE_SECS, DEFAULT_MAX_ATTEMPTS};
use storeship_domain::{PublishError, Result};
use tracing::{debug, warn};

use crate::outcome::{CallOutcome, RequestSpec, RetryCause};
use crate::ports::{RequestExecutor, TokenProvider};

/// API client with bounded retry semantics.
#[derive(Clone)]
pub struct ApiClient {
    executor: Arc<dyn RequestExecutor>,
    tokens: Arc<dyn TokenProvider>,
    max_attempts: u32,
    backoff_base: Duration,
}

impl ApiClient {
    /// Create a client with the default attempt bound.
    pub fn new(executor: Arc<dyn RequestExecutor>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            executor,
            tokens,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: Duration::from_secs(BACKOFF_BASE_SECS),
        }
    }

    /// Override the total number of attempts (initial try + retries).
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Override the backoff unit (production: one second).
    #[must_use]
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Issue `spec`, retrying recoverable failures up to the attempt bound.
    ///
    /// Rate limiting waits `2^attempt` backoff units before the next try;
    /// credential expiry invalidates the cached token and retries
    /// immediately.
    ///
    /// # Errors
    /// - `PublishError::Credential` when token minting itself fails (never
    ///   retried)
    /// - `PublishError::Network` on transport failure
    /// - `PublishError::Api` on a fatal response, or when the final attempt
    ///   still failed with a retryable cause
    pub async fn call(&self, spec: &RequestSpec) -> Result<Value> {
        for attempt in 1..=self.max_attempts {
            let token = self.tokens.bearer_token().await?;
            debug!(attempt, method = %spec.method, path = %spec.path, "issuing API request");

            match self.executor.execute(spec, &token.value).await? {
                CallOutcome::Success(payload) => return Ok(payload),
                CallOutcome::Retryable(cause) if attempt < self.max_attempts => {
                    self.recover(&cause, attempt, spec).await;
                }
                CallOutcome::Retryable(cause) => {
                    return Err(PublishError::Api {
                        endpoint: spec.path.clone(),
                        code: None,
                        cause: format!("{cause} after {attempt} attempts"),
                    });
                }
                CallOutcome::Fatal(detail) => {
                    return Err(PublishError::Api {
                        endpoint: spec.path.clone(),
                        code: detail.code,
                        cause: detail.detail,
                    });
                }
            }
        }

        Err(PublishError::Internal("api client exhausted attempts without a result".into()))
    }

    async fn recover(&self, cause: &RetryCause, attempt: u32, spec: &RequestSpec) {
        match cause {
            RetryCause::RateLimited { retry_after } => {
                let delay = retry_after.unwrap_or_else(|| self.backoff_delay(attempt));
                warn!(
                    attempt,
                    path = %spec.path,
                    delay_secs = delay.as_secs(),
                    "rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            RetryCause::CredentialExpired => {
                warn!(attempt, path = %spec.path, "token rejected, minting a fresh one");
                self.tokens.invalidate().await;
            }
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.min(8);
        self.backoff_base.saturating_mul(1u32 << shift)
    }
}
