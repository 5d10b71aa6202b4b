//! Serializable defaults for the async helpers.
//!
//! `TaskSettings` holds plain millisecond values so it can be stored or
//! transmitted as JSON. Missing fields fall back to the built-in defaults,
//! which match the defaults of the individual helpers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::concurrent::DEFAULT_CONCURRENCY;
use crate::retry::RetryPolicy;
use crate::wait::WaitOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSettings {
    /// Concurrency ceiling for bounded runs
    pub concurrency: usize,
    /// Total attempts for retried operations
    pub retry_max_attempts: u32,
    /// Delay after the first failed attempt
    pub retry_base_delay_ms: u64,
    /// Cap on the backoff delay; `None` means uncapped
    pub retry_max_delay_ms: Option<u64>,
    /// Jitter factor (0.0-1.0); zero keeps backoff deterministic
    pub retry_jitter_factor: f64,
    pub wait_interval_ms: u64,
    pub wait_timeout_ms: u64,
    pub debounce_delay_ms: u64,
    pub throttle_delay_ms: u64,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            retry_max_attempts: 3,
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: None,
            retry_jitter_factor: 0.0,
            wait_interval_ms: 100,
            wait_timeout_ms: 10_000,
            debounce_delay_ms: 300,
            throttle_delay_ms: 1000,
        }
    }
}

impl TaskSettings {
    /// Build the retry policy described by these settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
        )
        .with_jitter(self.retry_jitter_factor);

        match self.retry_max_delay_ms {
            Some(max) => policy.with_max_delay(Duration::from_millis(max)),
            None => policy,
        }
    }

    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::new(
            Duration::from_millis(self.wait_interval_ms),
            Duration::from_millis(self.wait_timeout_ms),
        )
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    pub fn throttle_delay(&self) -> Duration {
        Duration::from_millis(self.throttle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_helper_defaults() {
        let settings = TaskSettings::default();

        assert_eq!(settings.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(settings.retry_policy(), RetryPolicy::default());
        assert_eq!(settings.wait_options(), WaitOptions::default());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let json = r#"{"concurrency": 2, "retry_max_delay_ms": 5000}"#;
        let settings: TaskSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.concurrency, 2);
        assert_eq!(settings.retry_max_attempts, 3);
        assert_eq!(
            settings.retry_policy().max_delay,
            Some(Duration::from_millis(5000))
        );
    }

    #[test]
    fn test_serialization_roundtrip() {
        let settings = TaskSettings {
            concurrency: 8,
            retry_jitter_factor: 0.25,
            ..TaskSettings::default()
        };

        let json = serde_json::to_string(&settings).unwrap();
        let restored: TaskSettings = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, settings);
    }
}
