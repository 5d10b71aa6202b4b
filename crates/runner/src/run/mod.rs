//! Runner entry point: environment, logging, then one pass over each helper.

mod workload;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::RunnerConfig;

pub async fn run() -> Result<()> {
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "utilkit_runner=debug,utilkit_async=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting utilkit runner");

    let config = RunnerConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Concurrency: {}", config.tasks.concurrency);
    tracing::info!(
        "  Retry: {} attempts, {}ms base delay",
        config.tasks.retry_max_attempts,
        config.tasks.retry_base_delay_ms
    );
    tracing::info!(
        "  Demo: {} jobs, failure rate {}",
        config.demo.job_count,
        config.demo.failure_rate
    );

    workload::bounded_batch(&config).await;
    workload::pipeline(&config).await?;
    workload::autosave(&config).await?;
    workload::refresh(&config).await?;
    workload::readiness(&config).await?;

    tracing::info!("utilkit runner finished");
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
