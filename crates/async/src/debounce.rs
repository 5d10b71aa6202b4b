//! Asynchronous debounce.
//!
//! A [`Debounced`] wrapper coalesces bursts of calls into one trailing
//! execution. Every call restarts the quiet-period timer; when the timer
//! finally fires, the wrapped function runs once with the arguments of the
//! most recent call and every caller from that burst receives the same
//! settled result.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{AsyncError, AsyncResult};
use crate::timing::delay;

type BoxedFn<A, T, E> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Mutable cell owned by one debounced function.
struct DebounceState<A, T, E> {
    /// Bumped on every call; a timer only fires if it still matches
    generation: u64,
    /// Arguments of the most recent call in the current burst
    args: Option<A>,
    /// Callers waiting on the current burst's execution
    waiters: Vec<oneshot::Sender<Result<T, E>>>,
    /// Quiet-period timer for the current burst
    timer: Option<JoinHandle<()>>,
}

struct Inner<A, T, E> {
    func: BoxedFn<A, T, E>,
    delay: Duration,
    state: Mutex<DebounceState<A, T, E>>,
}

impl<A, T, E> Inner<A, T, E>
where
    A: Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn lock_state(&self) -> MutexGuard<'_, DebounceState<A, T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fire(self: Arc<Self>, generation: u64) {
        delay(self.delay).await;

        let (args, waiters) = {
            let mut state = self.lock_state();
            if state.generation != generation {
                return;
            }
            state.timer = None;
            let Some(args) = state.args.take() else {
                return;
            };
            (args, std::mem::take(&mut state.waiters))
        };

        tracing::trace!(waiters = waiters.len(), "Debounce window closed, executing");
        let result = (self.func)(args).await;
        for waiter in waiters {
            // A caller that stopped waiting is not an error
            let _ = waiter.send(result.clone());
        }
    }
}

/// A debounced asynchronous function. Clones share the same state cell.
pub struct Debounced<A, T, E> {
    inner: Arc<Inner<A, T, E>>,
}

impl<A, T, E> Clone for Debounced<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, T, E> Debounced<A, T, E>
where
    A: Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Wrap `func` so that it runs only after `delay` has passed without
    /// another call.
    pub fn new<F, Fut>(func: F, delay: Duration) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let func: BoxedFn<A, T, E> = Arc::new(move |args| func(args).boxed());
        Self {
            inner: Arc::new(Inner {
                func,
                delay,
                state: Mutex::new(DebounceState {
                    generation: 0,
                    args: None,
                    waiters: Vec::new(),
                    timer: None,
                }),
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Register a call and restart the quiet-period timer.
    ///
    /// The call is registered immediately, not when the returned future is
    /// first polled. Must be invoked from within a tokio runtime.
    ///
    /// The returned future resolves with the outcome of the execution that
    /// eventually serves this call, or [`AsyncError::Cancelled`] if that
    /// execution was lost (for example the wrapped future panicked).
    pub fn call(&self, args: A) -> impl Future<Output = AsyncResult<T, E>> + Send + 'static {
        let (tx, rx) = oneshot::channel();

        {
            let mut state = self.inner.lock_state();
            state.generation = state.generation.wrapping_add(1);
            state.args = Some(args);
            state.waiters.push(tx);

            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            let generation = state.generation;
            let inner = Arc::clone(&self.inner);
            state.timer = Some(tokio::spawn(inner.fire(generation)));
        }

        async move {
            match rx.await {
                Ok(result) => result.map_err(AsyncError::Operation),
                Err(_) => Err(AsyncError::Cancelled),
            }
        }
    }
}

/// Create a debounced wrapper around `func`.
pub fn debounce_async<F, Fut, A, T, E>(func: F, delay: Duration) -> Debounced<A, T, E>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    A: Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    Debounced::new(func, delay)
}
