//! Bounded task runner.
//!
//! Runs a list of asynchronous tasks with at most `limit` of them in flight.
//! Tasks are polled on the caller's task rather than spawned, so the
//! interleaving is cooperative and nothing outlives the returned future.

use std::future::Future;

use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::error::{AsyncError, AsyncResult};

/// Concurrency ceiling used when the caller has no preference.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Run `tasks` with at most `limit` unresolved at any moment.
///
/// Results are returned in submission order: element `i` is the output of
/// the `i`-th task, however the tasks happened to finish.
///
/// The first task error ends the call with [`AsyncError::Operation`]. Tasks
/// still in flight at that point are dropped and tasks not yet started are
/// never started.
///
/// # Errors
///
/// [`AsyncError::InvalidArgument`] if `limit` is zero.
pub async fn concurrent<I, F, Fut, T, E>(tasks: I, limit: usize) -> AsyncResult<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if limit == 0 {
        return Err(AsyncError::invalid("concurrency limit must be at least 1"));
    }

    let mut pending = tasks.into_iter().enumerate();
    let mut running = FuturesUnordered::new();
    let mut results: Vec<Option<T>> = Vec::new();

    loop {
        // Top up the running set before waiting on it
        while running.len() < limit {
            let Some((index, task)) = pending.next() else {
                break;
            };
            results.push(None);
            let future = task();
            running.push(async move { (index, future.await) });
        }

        match running.next().await {
            Some((index, Ok(value))) => {
                if let Some(slot) = results.get_mut(index) {
                    *slot = Some(value);
                }
            }
            Some((index, Err(e))) => {
                tracing::debug!(
                    task_index = index,
                    in_flight = running.len(),
                    "Task failed, abandoning remaining tasks"
                );
                return Err(AsyncError::Operation(e));
            }
            None => break,
        }
    }

    tracing::trace!(completed = results.len(), limit, "Bounded run finished");
    Ok(results.into_iter().flatten().collect())
}
