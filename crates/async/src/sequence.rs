//! Strict one-at-a-time execution.

use std::future::Future;

use crate::error::{AsyncError, AsyncResult};

/// Run `tasks` one after another, each starting only once the previous one
/// has resolved. Results come back in submission order.
///
/// The first failure is returned as [`AsyncError::Operation`]; tasks after
/// it are never invoked.
pub async fn sequence<I, F, Fut, T, E>(tasks: I) -> AsyncResult<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let tasks = tasks.into_iter();
    let mut results = Vec::with_capacity(tasks.size_hint().0);

    for (index, task) in tasks.enumerate() {
        match task().await {
            Ok(value) => results.push(value),
            Err(e) => {
                tracing::debug!(task_index = index, "Sequenced task failed, aborting");
                return Err(AsyncError::Operation(e));
            }
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::delay;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    type TaskFuture = Pin<Box<dyn Future<Output = Result<char, String>> + Send>>;
    type Task = Box<dyn FnOnce() -> TaskFuture + Send>;

    /// Builds a named task that logs its start and end into `log`
    fn step(log: Arc<Mutex<Vec<String>>>, name: char, millis: u64, fail: bool) -> Task {
        Box::new(move || -> TaskFuture {
            Box::pin(async move {
                log.lock().unwrap().push(format!("start {}", name));
                delay(Duration::from_millis(millis)).await;
                log.lock().unwrap().push(format!("end {}", name));
                if fail {
                    Err(format!("{} failed", name))
                } else {
                    Ok(name)
                }
            })
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_strictly_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let tasks = vec![
            step(log.clone(), 'A', 300, false),
            step(log.clone(), 'B', 100, false),
            step(log.clone(), 'C', 200, false),
        ];
        let start = Instant::now();

        let results = sequence(tasks).await;

        assert_eq!(results, Ok(vec!['A', 'B', 'C']));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["start A", "end A", "start B", "end B", "start C", "end C"]
        );
        // No overlap: total time is the sum of the parts
        assert!(start.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_stops_later_tasks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let tasks = vec![
            step(log.clone(), 'A', 10, false),
            step(log.clone(), 'B', 10, true),
            step(log.clone(), 'C', 10, false),
        ];

        let result = sequence(tasks).await;

        assert_eq!(result, Err(AsyncError::Operation("B failed".to_string())));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["start A", "end A", "start B", "end B"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_sequence() {
        let start = Instant::now();
        let tasks: Vec<Task> = Vec::new();

        assert_eq!(sequence(tasks).await, Ok(vec![]));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
