//! Runner configuration

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use utilkit_async::TaskSettings;

/// Runner configuration loaded from environment
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Defaults handed to the async helpers
    pub tasks: TaskSettings,
    /// Simulated workload configuration
    pub demo: DemoConfig,
}

/// Simulated workload configuration
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Number of jobs in the bounded batch
    pub job_count: usize,
    /// Probability (0.0-1.0) that a single job attempt fails
    pub failure_rate: f64,
    /// Simulated work per job attempt (milliseconds)
    pub job_duration_ms: u64,
}

impl RunnerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = TaskSettings::default();

        let tasks = TaskSettings {
            concurrency: parse_or(&lookup, "UTILKIT_CONCURRENCY", defaults.concurrency)?,
            retry_max_attempts: parse_or(
                &lookup,
                "UTILKIT_RETRY_MAX_ATTEMPTS",
                defaults.retry_max_attempts,
            )?,
            retry_base_delay_ms: parse_or(
                &lookup,
                "UTILKIT_RETRY_BASE_DELAY_MS",
                defaults.retry_base_delay_ms,
            )?,
            retry_max_delay_ms: parse_opt(&lookup, "UTILKIT_RETRY_MAX_DELAY_MS")?,
            retry_jitter_factor: parse_or(
                &lookup,
                "UTILKIT_RETRY_JITTER",
                defaults.retry_jitter_factor,
            )?,
            wait_interval_ms: parse_or(
                &lookup,
                "UTILKIT_WAIT_INTERVAL_MS",
                defaults.wait_interval_ms,
            )?,
            wait_timeout_ms: parse_or(&lookup, "UTILKIT_WAIT_TIMEOUT_MS", defaults.wait_timeout_ms)?,
            debounce_delay_ms: parse_or(
                &lookup,
                "UTILKIT_DEBOUNCE_DELAY_MS",
                defaults.debounce_delay_ms,
            )?,
            throttle_delay_ms: parse_or(
                &lookup,
                "UTILKIT_THROTTLE_DELAY_MS",
                defaults.throttle_delay_ms,
            )?,
        };

        if tasks.concurrency == 0 {
            anyhow::bail!("UTILKIT_CONCURRENCY must be at least 1");
        }
        if tasks.retry_max_attempts == 0 {
            anyhow::bail!("UTILKIT_RETRY_MAX_ATTEMPTS must be at least 1");
        }

        let demo = DemoConfig {
            job_count: parse_or(&lookup, "UTILKIT_DEMO_TASKS", 12)?,
            failure_rate: parse_or(&lookup, "UTILKIT_DEMO_FAILURE_RATE", 0.3)?,
            job_duration_ms: parse_or(&lookup, "UTILKIT_DEMO_JOB_MS", 150)?,
        };

        if !(0.0..=1.0).contains(&demo.failure_rate) {
            anyhow::bail!("UTILKIT_DEMO_FAILURE_RATE must be within 0.0..=1.0");
        }

        Ok(Self { tasks, demo })
    }
}

fn parse_or<L, T>(lookup: &L, key: &str, default: T) -> Result<T>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

/// Blank values count as unset
fn parse_opt<L, T>(lookup: &L, key: &str) -> Result<Option<T>>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = RunnerConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.tasks, TaskSettings::default());
        assert_eq!(config.demo.job_count, 12);
    }

    #[test]
    fn test_overrides() {
        let config = RunnerConfig::from_lookup(lookup_from(&[
            ("UTILKIT_CONCURRENCY", "2"),
            ("UTILKIT_RETRY_MAX_DELAY_MS", "4000"),
            ("UTILKIT_WAIT_TIMEOUT_MS", " 500 "),
            ("UTILKIT_DEMO_FAILURE_RATE", "0"),
        ]))
        .unwrap();

        assert_eq!(config.tasks.concurrency, 2);
        assert_eq!(config.tasks.retry_max_delay_ms, Some(4000));
        assert_eq!(config.tasks.wait_timeout_ms, 500);
        assert_eq!(config.demo.failure_rate, 0.0);
    }

    #[test]
    fn test_blank_max_delay_counts_as_unset() {
        let config =
            RunnerConfig::from_lookup(lookup_from(&[("UTILKIT_RETRY_MAX_DELAY_MS", "  ")])).unwrap();

        assert_eq!(config.tasks.retry_max_delay_ms, None);
    }

    #[test]
    fn test_invalid_max_delay_is_reported() {
        let err = RunnerConfig::from_lookup(lookup_from(&[("UTILKIT_RETRY_MAX_DELAY_MS", "soon")]))
            .unwrap_err();

        assert!(err.to_string().contains("UTILKIT_RETRY_MAX_DELAY_MS"));
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let err = RunnerConfig::from_lookup(lookup_from(&[("UTILKIT_CONCURRENCY", "many")]))
            .unwrap_err();

        assert!(err.to_string().contains("UTILKIT_CONCURRENCY"));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        assert!(RunnerConfig::from_lookup(lookup_from(&[("UTILKIT_CONCURRENCY", "0")])).is_err());
    }

    #[test]
    fn test_failure_rate_out_of_range_is_rejected() {
        assert!(
            RunnerConfig::from_lookup(lookup_from(&[("UTILKIT_DEMO_FAILURE_RATE", "1.5")])).is_err()
        );
    }
}
