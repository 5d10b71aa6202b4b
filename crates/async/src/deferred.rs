//! Futures settled from the outside.
//!
//! [`Deferred::new`] returns a future together with a [`DeferredHandle`]
//! that resolves or rejects it. The first settlement wins; later ones are
//! ignored. If every handle is dropped without settling, the future fails
//! with [`AsyncError::Cancelled`].

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::{AsyncError, AsyncResult};

/// Future half of a deferred value.
#[derive(Debug)]
pub struct Deferred<T, E> {
    receiver: oneshot::Receiver<Result<T, E>>,
}

/// Settling half of a deferred value. Clones settle the same future.
#[derive(Debug)]
pub struct DeferredHandle<T, E> {
    sender: Arc<Mutex<Option<oneshot::Sender<Result<T, E>>>>>,
}

impl<T, E> Clone for DeferredHandle<T, E> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T, E> Deferred<T, E> {
    /// Create an unsettled future and the handle that settles it.
    pub fn new() -> (Self, DeferredHandle<T, E>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self { receiver },
            DeferredHandle {
                sender: Arc::new(Mutex::new(Some(sender))),
            },
        )
    }
}

impl<T, E> DeferredHandle<T, E> {
    fn settle(&self, outcome: Result<T, E>) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            // The future may already be gone; the settlement still counts
            Some(sender) => {
                let _ = sender.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Resolve the future with `value`. Returns `false` if it was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Reject the future with `error`. Returns `false` if it was already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    pub fn is_settled(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl<T, E> Future for Deferred<T, E> {
    type Output = AsyncResult<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|received| match received {
            Ok(outcome) => outcome.map_err(AsyncError::Operation),
            Err(_) => Err(AsyncError::Cancelled),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::delay;
    use std::time::Duration;

    #[tokio::test]
    async fn test_resolve() {
        let (deferred, handle) = Deferred::<u32, String>::new();

        assert!(!handle.is_settled());
        assert!(handle.resolve(7));
        assert!(handle.is_settled());
        assert_eq!(deferred.await, Ok(7));
    }

    #[tokio::test]
    async fn test_reject() {
        let (deferred, handle) = Deferred::<u32, String>::new();

        assert!(handle.reject("nope".to_string()));
        assert_eq!(deferred.await, Err(AsyncError::Operation("nope".to_string())));
    }

    #[tokio::test]
    async fn test_first_settlement_wins() {
        let (deferred, handle) = Deferred::<u32, String>::new();
        let other = handle.clone();

        assert!(handle.resolve(1));
        assert!(!other.resolve(2));
        assert!(!other.reject("late".to_string()));
        assert_eq!(deferred.await, Ok(1));
    }

    #[tokio::test]
    async fn test_dropped_handle_cancels() {
        let (deferred, handle) = Deferred::<u32, String>::new();
        drop(handle);

        assert_eq!(deferred.await, Err(AsyncError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_from_another_task() {
        let (deferred, handle) = Deferred::<&'static str, String>::new();

        tokio::spawn(async move {
            delay(Duration::from_millis(500)).await;
            handle.resolve("ready");
        });

        assert_eq!(deferred.await, Ok("ready"));
    }
}
