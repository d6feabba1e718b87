//! Resilience around provider calls.
//!
//! Every attempt passes through a per-provider [`CircuitBreaker`]; attempts
//! that fail with a transient condition are retried with exponential backoff.
//!
//! - **Transient** failures (network, timeout, 408/429/5xx, provider
//!   rate-limit codes) are retried and count toward opening the breaker.
//! - **Permanent** failures surface after one attempt and leave the breaker alone.
//! - **Circuit open** fails fast and is not retried.
//! - **Cancellation** aborts waiting and always surfaces as `Cancelled`.

mod circuit_breaker;
mod classify;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use classify::{FailureClass, RETRYABLE_API_CODES, RETRYABLE_HTTP_STATUSES};
pub use retry::RetryPolicy;

use crate::config::{FromEnv, env_parse};
use crate::error::{NotificationError, NotificationResult};
use crate::providers::{EmailClient, EmailMessage, SmsClient, SmsMessage};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Retry and breaker settings shared by every provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResilienceConfig {
    pub retry: RetryPolicy,
    pub breaker: CircuitBreakerConfig,
}

impl ResilienceConfig {
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_breaker(mut self, breaker: CircuitBreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }
}

impl FromEnv for ResilienceConfig {
    fn from_env() -> NotificationResult<Self> {
        let max_retries: u32 = env_parse("NOTIFY_RETRY_MAX", 3)?;
        let base_delay_ms: u64 = env_parse("NOTIFY_RETRY_BASE_DELAY_MS", 2000)?;
        let threshold: u32 = env_parse("NOTIFY_BREAKER_THRESHOLD", 5)?;
        let break_secs: u64 = env_parse("NOTIFY_BREAKER_BREAK_SECS", 30)?;

        if threshold == 0 {
            return Err(NotificationError::Config(
                "NOTIFY_BREAKER_THRESHOLD must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            retry: RetryPolicy::new(max_retries, Duration::from_millis(base_delay_ms)),
            breaker: CircuitBreakerConfig::new()
                .with_failure_threshold(threshold)
                .with_break_duration(Duration::from_secs(break_secs)),
        })
    }
}

/// Retry plus circuit breaker for one provider.
#[derive(Debug)]
pub struct ResiliencePolicy {
    provider: &'static str,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
}

impl ResiliencePolicy {
    pub fn new(provider: &'static str, config: ResilienceConfig) -> Self {
        Self {
            provider,
            retry: config.retry,
            breaker: CircuitBreaker::new(provider, config.breaker),
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run `operation` under the policy.
    pub async fn execute<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> NotificationResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = NotificationResult<T>>,
    {
        let mut retries = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(NotificationError::Cancelled);
            }

            let err = match self.attempt(cancel, operation()).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() || !self.retry.allows(retries) {
                return Err(err);
            }

            retries += 1;
            let delay = self.retry.delay_for(retries);
            warn!(
                provider = self.provider,
                attempt = retries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Transient provider failure, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(NotificationError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn attempt<T, Fut>(&self, cancel: &CancellationToken, call: Fut) -> NotificationResult<T>
    where
        Fut: Future<Output = NotificationResult<T>>,
    {
        if !self.breaker.try_acquire() {
            debug!(provider = self.provider, "Circuit open, failing fast");
            return Err(NotificationError::CircuitOpen {
                provider: self.provider,
            });
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(NotificationError::Cancelled),
            result = call => result,
        };

        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(err) if err.is_retryable() => self.breaker.record_failure(),
            Err(_) => self.breaker.release(),
        }

        result
    }
}

/// SMS client decorated with a [`ResiliencePolicy`].
pub struct ResilientSmsClient<C> {
    inner: C,
    policy: ResiliencePolicy,
}

impl<C: SmsClient> ResilientSmsClient<C> {
    pub fn new(inner: C, config: ResilienceConfig) -> Self {
        let policy = ResiliencePolicy::new(inner.name(), config);
        Self { inner, policy }
    }

    pub fn policy(&self) -> &ResiliencePolicy {
        &self.policy
    }
}

#[async_trait]
impl<C: SmsClient> SmsClient for ResilientSmsClient<C> {
    async fn send(&self, message: &SmsMessage, cancel: &CancellationToken) -> NotificationResult<()> {
        self.policy
            .execute(cancel, || self.inner.send(message, cancel))
            .await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Email client decorated with a [`ResiliencePolicy`].
pub struct ResilientEmailClient<C> {
    inner: C,
    policy: ResiliencePolicy,
}

impl<C: EmailClient> ResilientEmailClient<C> {
    pub fn new(inner: C, config: ResilienceConfig) -> Self {
        let policy = ResiliencePolicy::new(inner.name(), config);
        Self { inner, policy }
    }

    pub fn policy(&self) -> &ResiliencePolicy {
        &self.policy
    }
}

#[async_trait]
impl<C: EmailClient> EmailClient for ResilientEmailClient<C> {
    async fn send(&self, message: &EmailMessage, cancel: &CancellationToken) -> NotificationResult<()> {
        self.policy
            .execute(cancel, || self.inner.send(message, cancel))
            .await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
