//! Retry with exponential back-off for completion calls.
//!
//! [`RetryingTransport`] decorates any [`CompletionTransport`] so every
//! completion attempt inherits the same retry policy.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::completion::{CompletionRequest, CompletionTransport};
use crate::error::DiscoveryError;

/// Number of retries and the base of the back-off schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1_000,
        }
    }
}

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// Retriable: transport failures and every non-success HTTP status,
/// including 429. Malformed output and configuration errors are returned
/// as-is.
pub(crate) fn is_retriable(err: &DiscoveryError) -> bool {
    match err {
        DiscoveryError::Transport(_)
        | DiscoveryError::RateLimited
        | DiscoveryError::Api { .. } => true,
        DiscoveryError::Http(e) => e.is_timeout() || e.is_connect() || e.status().is_some(),
        DiscoveryError::MalformedOutput(_)
        | DiscoveryError::NotConfigured(_)
        | DiscoveryError::InvalidEndpoint { .. }
        | DiscoveryError::GateClosed => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Retry | Sleep before it          |
/// |-------|--------------------------|
/// | 1     | 1 000 ms × 2¹ = 2 s      |
/// | 2     | 1 000 ms × 2² = 4 s      |
/// | 3     | 1 000 ms × 2³ = 8 s      |
///
/// When retries run out the last error is returned.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, DiscoveryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DiscoveryError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = policy
                    .backoff_base_ms
                    .saturating_mul(1u64 << attempt.min(16));
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %err,
                    "completion call failed, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// Transport decorator that applies a [`RetryPolicy`] to every request.
pub struct RetryingTransport {
    inner: Arc<dyn CompletionTransport>,
    policy: RetryPolicy,
}

impl RetryingTransport {
    #[must_use]
    pub fn new(inner: Arc<dyn CompletionTransport>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl CompletionTransport for RetryingTransport {
    async fn post(&self, request: &CompletionRequest) -> Result<String, DiscoveryError> {
        retry_with_backoff(self.policy, || self.inner.post(request)).await
    }
}
