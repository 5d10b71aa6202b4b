//! Delay, timeout and measurement primitives.
//!
//! Every timer in this crate goes through tokio's clock, so tests can drive
//! these helpers with a paused runtime.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{AsyncError, AsyncResult};

/// Resolve after `duration` has elapsed.
pub async fn delay(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Race `future` against a timer.
///
/// If the timer fires first the future is dropped, which stops whatever work
/// it was doing, and the call fails with [`AsyncError::Timeout`].
pub async fn timeout<F, T, E>(future: F, duration: Duration) -> AsyncResult<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result.map_err(AsyncError::Operation),
        Err(_) => {
            tracing::debug!(timeout_ms = duration.as_millis() as u64, "Operation timed out");
            Err(AsyncError::Timeout(duration))
        }
    }
}

/// Output of [`measure_time`].
#[derive(Debug, Clone, PartialEq)]
pub struct Measured<T> {
    pub result: T,
    pub elapsed: Duration,
}

impl<T> Measured<T> {
    /// Elapsed time in fractional milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

/// Await `future` and report how long it took.
pub async fn measure_time<F>(future: F) -> Measured<F::Output>
where
    F: Future,
{
    let start = Instant::now();
    let result = future.await;
    Measured {
        result,
        elapsed: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_delay_advances_clock() {
        let start = Instant::now();
        delay(Duration::from_millis(250)).await;
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_passes_through_fast_result() {
        let result: AsyncResult<u32, String> = timeout(
            async {
                delay(Duration::from_millis(10)).await;
                Ok(42)
            },
            Duration::from_millis(100),
        )
        .await;

        assert_eq!(result, Ok(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_passes_through_operation_error() {
        let result: AsyncResult<u32, String> =
            timeout(async { Err("boom".to_string()) }, Duration::from_millis(100)).await;

        assert_eq!(result, Err(AsyncError::Operation("boom".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_and_drops_slow_future() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let start = Instant::now();

        let result: AsyncResult<(), String> = timeout(
            async move {
                delay(Duration::from_secs(5)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            },
            Duration::from_millis(300),
        )
        .await;

        assert_eq!(result, Err(AsyncError::Timeout(Duration::from_millis(300))));
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert!(start.elapsed() < Duration::from_millis(400));

        // The losing future was dropped, so it never completes
        delay(Duration::from_secs(10)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_measure_time_reports_elapsed() {
        let measured = measure_time(async {
            delay(Duration::from_millis(1500)).await;
            "done"
        })
        .await;

        assert_eq!(measured.result, "done");
        assert!(measured.elapsed >= Duration::from_millis(1500));
        assert!(measured.elapsed_ms() >= 1500.0);
    }
}
