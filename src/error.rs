//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

/// Boxed error returned by caller-supplied notification handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Failures of a caller-supplied `compute` callback are not wrapped here: the
/// fallible fetch operations hand the caller's own error back unchanged.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A required argument was rejected before any state was touched
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An `expiring` or `expired` handler failed during a sweep
    #[error("Expiration handler failed: {0}")]
    Notification(#[source] BoxError),
}

impl CacheError {
    /// Returns true if this error was raised by a notification handler.
    pub fn is_notification(&self) -> bool {
        matches!(self, CacheError::Notification(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
