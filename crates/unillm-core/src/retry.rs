//! Bounded retries with exponential backoff and jitter
//!
//! Only transient failures (timeouts, connection failures and resets, HTTP
//! 429) are retried. The attempt counter lives in each `execute` call, so one
//! policy can serve concurrent requests.

use crate::config::ClientConfig;
use crate::error::LlmError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_base: f64,
    max_backoff: Duration,
    max_retry_after: Duration,
}

impl RetryPolicy {
    pub fn new(
        max_retries: u32,
        backoff_base: f64,
        max_backoff: Duration,
        max_retry_after: Duration,
    ) -> Self {
        Self {
            max_retries,
            backoff_base,
            max_backoff,
            max_retry_after,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.max_retries,
            config.backoff_base,
            config.max_backoff(),
            config.max_retry_after(),
        )
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// `min(base^attempt + jitter, max_backoff)` with jitter drawn from `[0, 1)` seconds
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let jitter: f64 = rand::thread_rng().r#gen::<f64>();
        let exp = self.backoff_base.powi(attempt.min(i32::MAX as u32) as i32);
        let seconds = (exp + jitter).min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(seconds.max(0.0))
    }

    /// Wait before the next attempt. A server `Retry-After` replaces the
    /// exponential wait; the two never add up.
    pub fn delay_for(&self, error: &LlmError, attempt: u32) -> Duration {
        match error.retry_after() {
            Some(retry_after) => retry_after.min(self.max_retry_after),
            None => self.backoff_delay(attempt),
        }
    }

    /// Run `operation` until it succeeds, fails permanently, or the retry
    /// budget is spent. `operation` receives the 1-based attempt number and
    /// must rebuild its request from scratch each time.
    pub async fn execute<T, F, Fut>(
        &self,
        cancel: Option<&CancellationToken>,
        mut operation: F,
    ) -> Result<T, LlmError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut attempt: u32 = 1;
        loop {
            let result = match cancel {
                Some(token) => {
                    if token.is_cancelled() {
                        return Err(LlmError::Cancelled);
                    }
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => Err(LlmError::Cancelled),
                        result = operation(attempt) => result,
                    }
                }
                None => operation(attempt).await,
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !error.is_transient() {
                return Err(error);
            }
            if attempt > self.max_retries {
                log::error!("Giving up after {attempt} attempts: {error}");
                return Err(LlmError::retries_exhausted(attempt, error));
            }

            let delay = self.delay_for(&error, attempt);
            log::warn!(
                "Attempt {attempt} failed ({error}); retrying in {:.2}s",
                delay.as_secs_f64()
            );

            match cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(LlmError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
            attempt += 1;
        }
    }
}
