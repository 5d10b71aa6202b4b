//! Condition polling.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::{AsyncError, AsyncResult};
use crate::timing::delay;

/// Polling cadence and budget for [`wait_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Time between two checks of the condition
    pub interval: Duration,
    /// Budget after which waiting fails
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            timeout: Duration::from_millis(10_000),
        }
    }
}

impl WaitOptions {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Poll `condition` with these options.
    pub async fn wait<C>(&self, condition: C) -> AsyncResult<()>
    where
        C: FnMut() -> bool,
    {
        wait_for(condition, self.interval, self.timeout).await
    }
}

/// Resolve once `condition` returns true.
///
/// The condition is checked immediately and then once per `interval`. If it
/// is still false on a check made after more than `timeout` has elapsed, the
/// call fails with [`AsyncError::Timeout`].
///
/// # Errors
///
/// [`AsyncError::InvalidArgument`] if `interval` is zero, since the loop
/// would never yield to the timer.
pub async fn wait_for<C>(mut condition: C, interval: Duration, timeout: Duration) -> AsyncResult<()>
where
    C: FnMut() -> bool,
{
    if interval.is_zero() {
        return Err(AsyncError::invalid("poll interval must be greater than zero"));
    }

    let start = Instant::now();
    let mut checks: u64 = 0;
    loop {
        checks += 1;
        if condition() {
            tracing::trace!(checks, "Wait condition met");
            return Ok(());
        }
        if start.elapsed() > timeout {
            tracing::debug!(
                checks,
                timeout_ms = timeout.as_millis() as u64,
                "Wait condition timed out"
            );
            return Err(AsyncError::Timeout(timeout));
        }
        delay(interval).await;
    }
}
