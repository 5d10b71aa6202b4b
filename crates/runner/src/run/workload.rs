//! Simulated workloads, one per helper.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use utilkit_async::{
    concurrent, debounce_async, delay, measure_time, sequence, throttle_async, timeout,
};

use crate::config::RunnerConfig;

/// Sleeps for `work`, then fails with probability `failure_rate`
async fn simulated_job(id: usize, failure_rate: f64, work: Duration) -> Result<usize, String> {
    delay(work).await;
    let failed = rand::thread_rng().gen_bool(failure_rate);
    if failed {
        Err(format!("job {} hit a transient failure", id))
    } else {
        Ok(id)
    }
}

/// Run the configured number of flaky jobs through the bounded runner,
/// each one retried with the configured policy.
pub async fn bounded_batch(config: &RunnerConfig) {
    let policy = config.tasks.retry_policy();
    let attempts = Arc::new(AtomicU32::new(0));
    let failure_rate = config.demo.failure_rate;
    let work = Duration::from_millis(config.demo.job_duration_ms);

    let jobs: Vec<_> = (0..config.demo.job_count)
        .map(|id| {
            let policy = policy.clone();
            let attempts = attempts.clone();
            move || async move {
                policy
                    .run(move || {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        simulated_job(id, failure_rate, work)
                    })
                    .await
            }
        })
        .collect();

    let measured = measure_time(concurrent(jobs, config.tasks.concurrency)).await;
    let attempts = attempts.load(Ordering::SeqCst);
    let elapsed_ms = measured.elapsed.as_millis() as u64;

    match measured.result {
        Ok(ids) => tracing::info!(
            jobs = ids.len(),
            attempts,
            elapsed_ms,
            "Bounded batch completed"
        ),
        Err(e) => tracing::warn!(error = %e, attempts, elapsed_ms, "Bounded batch failed"),
    }
}

/// Three dependent stages, each bounded by a timeout, run strictly in order.
pub async fn pipeline(config: &RunnerConfig) -> Result<()> {
    let stage_budget = Duration::from_millis(config.tasks.wait_timeout_ms);
    let stages: Vec<_> = [("fetch", 120u64), ("transform", 40), ("store", 80)]
        .into_iter()
        .map(|(name, millis)| {
            move || {
                timeout(
                    async move {
                        delay(Duration::from_millis(millis)).await;
                        tracing::debug!(stage = name, "Stage finished");
                        Ok::<_, String>(name)
                    },
                    stage_budget,
                )
            }
        })
        .collect();

    let measured = measure_time(sequence(stages)).await;
    let completed = measured.result?;
    tracing::info!(
        stages = ?completed,
        elapsed_ms = measured.elapsed.as_millis() as u64,
        "Pipeline completed"
    );
    Ok(())
}

/// Simulated keystrokes against a debounced draft save.
pub async fn autosave(config: &RunnerConfig) -> Result<()> {
    let saves = Arc::new(AtomicU32::new(0));
    let counter = saves.clone();
    let save = debounce_async(
        move |draft: String| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                delay(Duration::from_millis(20)).await;
                Ok::<_, String>(draft.len())
            }
        },
        config.tasks.debounce_delay(),
    );

    let keystroke_gap = config.tasks.debounce_delay() / 4;
    let mut pending = Vec::new();
    for draft in ["h", "he", "hel", "hell", "hello"] {
        pending.push(save.call(draft.to_string()));
        delay(keystroke_gap).await;
    }

    let mut saved_lengths = Vec::with_capacity(pending.len());
    for call in pending {
        saved_lengths.push(call.await?);
    }

    tracing::info!(
        keystrokes = saved_lengths.len(),
        saves = saves.load(Ordering::SeqCst),
        saved_length = saved_lengths.last().copied().unwrap_or_default(),
        "Autosave settled"
    );
    Ok(())
}

/// Bursts of refresh requests against a throttled loader.
pub async fn refresh(config: &RunnerConfig) -> Result<()> {
    let loads = Arc::new(AtomicU32::new(0));
    let counter = loads.clone();
    let window = config.tasks.throttle_delay();
    let load = throttle_async(
        move |reason: &'static str| {
            let counter = counter.clone();
            async move {
                let generation = counter.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::debug!(reason, generation, "Loading");
                delay(window / 2).await;
                Ok::<_, String>(generation)
            }
        },
        window,
    );

    let burst = [load.call("startup"), load.call("focus"), load.call("poll")];
    let mut generations = Vec::new();
    for call in burst {
        generations.push(call.await?);
    }

    delay(window).await;
    generations.push(load.call("after window").await?);

    tracing::info!(
        calls = generations.len(),
        loads = loads.load(Ordering::SeqCst),
        generations = ?generations,
        "Refresh bursts settled"
    );
    Ok(())
}

/// Poll for a flag flipped by a background task.
pub async fn readiness(config: &RunnerConfig) -> Result<()> {
    let ready = Arc::new(AtomicBool::new(false));
    let setter = ready.clone();
    tokio::spawn(async move {
        delay(Duration::from_millis(250)).await;
        setter.store(true, Ordering::SeqCst);
    });

    let options = config.tasks.wait_options();
    let measured = measure_time(options.wait(move || ready.load(Ordering::SeqCst))).await;
    measured.result?;

    tracing::info!(
        waited_ms = measured.elapsed.as_millis() as u64,
        interval_ms = options.interval.as_millis() as u64,
        "Service reported ready"
    );
    Ok(())
}
