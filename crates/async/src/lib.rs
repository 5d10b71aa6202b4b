//! Asynchronous task helpers for utilkit.
//!
//! This crate provides small, independent adapters over tokio's timer and
//! future machinery. None of the helpers share state with each other; the
//! only long-lived state is the cell owned by a [`Debounced`] or
//! [`Throttled`] wrapper.
//!
//! # Design Principles
//!
//! - **Cooperative by default** - runners interleave on the caller's task
//!   and never spawn; only debounce/throttle spawn their single execution
//! - **Cancellation by drop** - dropping a returned future stops its work
//! - **Errors propagate unchanged** - a failed operation surfaces as
//!   [`AsyncError::Operation`] carrying the caller's own error value
//!
//! # Modules
//!
//! - `concurrent` - bounded task runner
//! - `retry` - exponential backoff and predicate-gated retry
//! - `sequence` - strict one-at-a-time execution
//! - `debounce` / `throttle` - rate-limiting wrappers
//! - `wait` - condition polling
//! - `timing` - delay, timeout and measurement primitives
//! - `deferred` - externally settled futures
//! - `settings` - serializable defaults

pub mod concurrent;
pub mod debounce;
pub mod deferred;
pub mod error;
pub mod retry;
pub mod sequence;
pub mod settings;
pub mod throttle;
pub mod timing;
pub mod wait;

// Re-export commonly used items at crate root for convenience
pub use concurrent::{concurrent, DEFAULT_CONCURRENCY};
pub use debounce::{debounce_async, Debounced};
pub use deferred::{Deferred, DeferredHandle};
pub use error::{AsyncError, AsyncResult};
pub use retry::{retry, retry_on_error, RetryPolicy};
pub use sequence::sequence;
pub use settings::TaskSettings;
pub use throttle::{throttle_async, Throttled};
pub use timing::{delay, measure_time, timeout, Measured};
pub use wait::{wait_for, WaitOptions};
