//! Retry with exponential backoff.
//!
//! A failed attempt `n` (starting at 1) is followed by a wait of
//! `base_delay * 2^(n-1)` before attempt `n + 1`. Backoff is deterministic
//! unless a jitter factor is configured.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::{AsyncError, AsyncResult};
use crate::timing::delay;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Optional cap on exponential growth
    pub max_delay: Option<Duration>,
    /// Jitter factor (0.0-1.0) applied as ± a fraction of each delay
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: None,
            jitter_factor: 0.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    /// Cap the delay between attempts.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Randomize each delay by up to ±`jitter_factor` of its value.
    pub fn with_jitter(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let exponential = self.base_delay.saturating_mul(factor);
        let capped = match self.max_delay {
            Some(max) => exponential.min(max),
            None => exponential,
        };

        let capped_ms = capped.as_millis().min(i64::MAX as u128) as i64;
        let jitter_range = (capped_ms as f64 * self.jitter_factor) as i64;
        if jitter_range > 0 {
            let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
            Duration::from_millis(capped_ms.saturating_add(jitter).max(0) as u64)
        } else {
            capped
        }
    }

    fn validate<E>(&self) -> Result<(), AsyncError<E>> {
        if self.max_attempts == 0 {
            return Err(AsyncError::invalid("max_attempts must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(AsyncError::invalid(format!(
                "jitter_factor must be within 0.0..=1.0, got {}",
                self.jitter_factor
            )));
        }
        Ok(())
    }

    /// Run `operation` until it succeeds or the attempt budget is spent.
    ///
    /// The error of the last attempt is returned unchanged inside
    /// [`AsyncError::Operation`].
    pub async fn run<Op, Fut, T, E>(&self, operation: Op) -> AsyncResult<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_when(operation, |_| true).await
    }

    /// Like [`RetryPolicy::run`], but stop as soon as `should_retry` rejects
    /// an error, whatever budget remains.
    pub async fn run_when<Op, Fut, T, E, P>(
        &self,
        mut operation: Op,
        mut should_retry: P,
    ) -> AsyncResult<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&E) -> bool,
    {
        self.validate::<E>()?;

        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if attempt >= self.max_attempts {
                        tracing::debug!(
                            attempts = attempt,
                            "Operation failed after all retry attempts"
                        );
                        return Err(AsyncError::Operation(e));
                    }
                    if !should_retry(&e) {
                        tracing::debug!(attempt, "Operation failed with non-retryable error");
                        return Err(AsyncError::Operation(e));
                    }

                    let wait = self.delay_for(attempt);
                    tracing::debug!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = wait.as_millis() as u64,
                        "Operation failed, retrying"
                    );
                    if !wait.is_zero() {
                        delay(wait).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

/// Retry `operation` with exponential backoff.
///
/// Equivalent to `RetryPolicy::new(max_attempts, base_delay).run(operation)`.
pub async fn retry<Op, Fut, T, E>(
    operation: Op,
    max_attempts: u32,
    base_delay: Duration,
) -> AsyncResult<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    RetryPolicy::new(max_attempts, base_delay).run(operation).await
}

/// Retry `operation` immediately while `should_retry` accepts its errors.
///
/// There is no delay between attempts. A rejected error propagates at once.
pub async fn retry_on_error<Op, Fut, T, E, P>(
    operation: Op,
    should_retry: P,
    max_attempts: u32,
) -> AsyncResult<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
{
    RetryPolicy::new(max_attempts, Duration::ZERO)
        .run_when(operation, should_retry)
        .await
}
