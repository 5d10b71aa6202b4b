//! Error type shared by every helper in this crate.
//!
//! The helpers are generic over the caller's operation error `E`. A failure
//! of the wrapped operation is carried unchanged in [`AsyncError::Operation`];
//! the other variants describe failures of the helper itself.

use std::convert::Infallible;
use std::time::Duration;

use thiserror::Error;

/// Result alias for helper calls. Helpers whose operations cannot fail use
/// the default `E = Infallible`.
pub type AsyncResult<T, E = Infallible> = Result<T, AsyncError<E>>;

/// Failure of an asynchronous helper call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsyncError<E> {
    /// Malformed configuration, such as a zero concurrency limit or attempt count.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The wrapped operation failed. The original error is preserved.
    #[error("{0}")]
    Operation(E),

    /// A timing budget elapsed before the operation finished.
    #[error("Operation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// A shared execution was dropped before it settled.
    #[error("Operation was cancelled before it settled")]
    Cancelled,
}

impl<E> AsyncError<E> {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Check if this error carries a failure of the wrapped operation.
    pub fn is_operation(&self) -> bool {
        matches!(self, Self::Operation(_))
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Borrow the wrapped operation's error, if that is what failed.
    pub fn operation(&self) -> Option<&E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Take the wrapped operation's error, if that is what failed.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Convert the operation error while keeping helper failures intact.
    pub fn map_operation<F, O>(self, f: F) -> AsyncError<O>
    where
        F: FnOnce(E) -> O,
    {
        match self {
            Self::InvalidArgument(message) => AsyncError::InvalidArgument(message),
            Self::Operation(e) => AsyncError::Operation(f(e)),
            Self::Timeout(after) => AsyncError::Timeout(after),
            Self::Cancelled => AsyncError::Cancelled,
        }
    }
}

impl AsyncError<Infallible> {
    /// Widen an error from an infallible helper into any operation error type.
    pub fn widen<E>(self) -> AsyncError<E> {
        self.map_operation(|never| match never {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_displays_original_message() {
        let err: AsyncError<String> = AsyncError::Operation("disk full".to_string());
        assert_eq!(err.to_string(), "disk full");
        assert!(err.is_operation());
        assert_eq!(err.into_operation().as_deref(), Some("disk full"));
    }

    #[test]
    fn test_timeout_display() {
        let err: AsyncError<String> = AsyncError::Timeout(Duration::from_millis(300));
        assert_eq!(err.to_string(), "Operation timed out after 300ms");
        assert!(err.is_timeout());
        assert!(err.operation().is_none());
    }

    #[test]
    fn test_map_operation_keeps_helper_failures() {
        let err: AsyncError<u32> = AsyncError::invalid("limit must be at least 1");
        let mapped = err.map_operation(|code| format!("code {}", code));
        assert_eq!(
            mapped,
            AsyncError::InvalidArgument("limit must be at least 1".to_string())
        );

        let err: AsyncError<u32> = AsyncError::Operation(7);
        assert_eq!(
            err.map_operation(|code| format!("code {}", code)),
            AsyncError::Operation("code 7".to_string())
        );
    }

    #[test]
    fn test_widen_infallible() {
        let err: AsyncError<Infallible> = AsyncError::Timeout(Duration::from_secs(1));
        let widened: AsyncError<std::io::Error> = err.widen();
        assert!(widened.is_timeout());
    }
}
