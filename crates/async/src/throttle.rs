//! Asynchronous throttle.
//!
//! A [`Throttled`] wrapper starts an execution on the first call. Further
//! calls arriving within `delay` of that start join the execution still in
//! flight instead of triggering another. A call made once the window has
//! elapsed, or when nothing is in flight, starts a fresh execution.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::{AsyncError, AsyncResult};

type BoxedFn<A, T, E> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Handle to one execution that any number of callers can await.
type SharedExecution<T, E> = Shared<BoxFuture<'static, AsyncResult<T, E>>>;

struct InFlight<T, E> {
    id: u64,
    execution: SharedExecution<T, E>,
}

/// Mutable cell owned by one throttled function.
struct ThrottleState<T, E> {
    /// Start time of the most recent execution
    last_call: Option<Instant>,
    in_flight: Option<InFlight<T, E>>,
    next_id: u64,
}

struct Inner<A, T, E> {
    func: BoxedFn<A, T, E>,
    delay: Duration,
    state: Mutex<ThrottleState<T, E>>,
}

impl<A, T, E> Inner<A, T, E> {
    fn lock_state(&self) -> MutexGuard<'_, ThrottleState<T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget the in-flight execution once it settles, unless a newer one
    /// has replaced it
    fn settle(&self, id: u64) {
        let mut state = self.lock_state();
        if state.in_flight.as_ref().is_some_and(|f| f.id == id) {
            state.in_flight = None;
        }
    }
}

/// A throttled asynchronous function. Clones share the same state cell.
pub struct Throttled<A, T, E> {
    inner: Arc<Inner<A, T, E>>,
}

impl<A, T, E> Clone for Throttled<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, T, E> Throttled<A, T, E>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wrap `func` so that calls within `delay` of an execution share it.
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
                state: Mutex::new(ThrottleState {
                    last_call: None,
                    in_flight: None,
                    next_id: 0,
                }),
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Check whether an execution is currently in flight.
    pub fn is_in_flight(&self) -> bool {
        self.inner.lock_state().in_flight.is_some()
    }

    /// Invoke the throttled function.
    ///
    /// A fresh execution starts immediately (it does not wait for the
    /// returned future to be polled), so this must be called from within a
    /// tokio runtime. When the call joins an in-flight execution, `args` is
    /// dropped unused.
    ///
    /// The execution is registered before `func` runs and the state lock is
    /// released while it runs, so `func` may use this wrapper again; such a
    /// call joins the execution being started.
    pub fn call(&self, args: A) -> impl Future<Output = AsyncResult<T, E>> + Send + 'static {
        let (tx, rx) = oneshot::channel::<Result<T, E>>();
        let (id, execution) = {
            let mut state = self.inner.lock_state();
            let now = Instant::now();

            let within_window = state
                .last_call
                .is_some_and(|last| now.duration_since(last) < self.inner.delay);
            if within_window {
                if let Some(in_flight) = &state.in_flight {
                    tracing::trace!(execution = in_flight.id, "Joining in-flight execution");
                    return in_flight.execution.clone();
                }
            }

            let id = state.next_id;
            state.next_id = state.next_id.wrapping_add(1);
            state.last_call = Some(now);

            let execution = async move {
                match rx.await {
                    Ok(result) => result.map_err(AsyncError::Operation),
                    Err(_) => Err(AsyncError::Cancelled),
                }
            }
            .boxed()
            .shared();
            state.in_flight = Some(InFlight {
                id,
                execution: execution.clone(),
            });
            (id, execution)
        };

        // Clears the slot however the execution ends, including a panic in
        // `func` itself or in the future it returns
        let settle = SettleOnDrop {
            inner: Arc::clone(&self.inner),
            id,
        };
        let future = (self.inner.func)(args);
        tokio::spawn(async move {
            let result = future.await;
            drop(settle);
            // Joined callers may all have gone away
            let _ = tx.send(result);
        });

        tracing::trace!(execution = id, "Started throttled execution");
        execution
    }
}

/// Forgets execution `id` when dropped.
struct SettleOnDrop<A, T, E> {
    inner: Arc<Inner<A, T, E>>,
    id: u64,
}

impl<A, T, E> Drop for SettleOnDrop<A, T, E> {
    fn drop(&mut self) {
        self.inner.settle(self.id);
    }
}

/// Create a throttled wrapper around `func`.
pub fn throttle_async<F, Fut, A, T, E>(func: F, delay: Duration) -> Throttled<A, T, E>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    Throttled::new(func, delay)
}
