//! Error types returned by refreshers and by the cache.
//!
//! This module defines two enums:
//!
//! - [`RefreshError`] — failures of a single refresher invocation. These are
//!   cached as the key's current outcome (negative caching).
//! - [`CacheError`] — what [`Cache::get`](crate::Cache::get) hands back to a caller.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

/// # Errors produced by a refresher invocation.
///
/// A `RefreshError` becomes the cached outcome of its key until the next
/// scheduled refresh succeeds, so it must be cheap to clone.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The computation failed.
    #[error("refresh failed: {reason}")]
    Fail {
        /// The underlying error message.
        reason: String,
    },

    /// The computation observed its cancellation token and gave up.
    #[error("refresh cancelled")]
    Canceled,

    /// The refresher panicked while computing.
    #[error("refresher panicked: {reason}")]
    Panicked {
        /// Panic payload, when it was a string.
        reason: String,
    },
}

impl RefreshError {
    /// Shorthand for [`RefreshError::Fail`].
    pub fn fail(reason: impl Into<String>) -> Self {
        RefreshError::Fail {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use keepwarm::RefreshError;
    ///
    /// assert_eq!(RefreshError::fail("boom").as_label(), "refresh_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RefreshError::Fail { .. } => "refresh_failed",
            RefreshError::Canceled => "refresh_canceled",
            RefreshError::Panicked { .. } => "refresher_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RefreshError::Fail { reason } => format!("error: {reason}"),
            RefreshError::Canceled => "context cancelled".to_string(),
            RefreshError::Panicked { reason } => format!("panic: {reason}"),
        }
    }
}

/// # Errors returned by [`Cache::get`](crate::Cache::get).
///
/// Callers can tell apart their own cancellation, a closed cache and a cached
/// computation failure.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The caller's request token was cancelled before a result was handed over.
    ///
    /// Never cached and never visible to other callers.
    #[error("request cancelled")]
    Canceled,

    /// The cache lifetime token is cancelled; no actor will serve this key.
    #[error("cache is shut down")]
    Closed,

    /// The key is negatively cached: its most recent computation failed.
    #[error(transparent)]
    Refresh(#[from] RefreshError),
}

impl CacheError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use keepwarm::{CacheError, RefreshError};
    ///
    /// assert_eq!(CacheError::Canceled.as_label(), "request_canceled");
    /// let cached: CacheError = RefreshError::fail("boom").into();
    /// assert_eq!(cached.as_label(), "refresh_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CacheError::Canceled => "request_canceled",
            CacheError::Closed => "cache_closed",
            CacheError::Refresh(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CacheError::Canceled => "request cancelled".to_string(),
            CacheError::Closed => "cache closed".to_string(),
            CacheError::Refresh(e) => e.as_message(),
        }
    }

    /// Returns the cached refresher error, if this is one.
    pub fn as_refresh(&self) -> Option<&RefreshError> {
        match self {
            CacheError::Refresh(e) => Some(e),
            _ => None,
        }
    }

    /// True if the caller's own request was cancelled.
    pub fn is_canceled(&self) -> bool {
        matches!(self, CacheError::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_error_converts_into_cache_error() {
        let err: CacheError = RefreshError::fail("db down").into();
        assert_eq!(err.as_refresh(), Some(&RefreshError::fail("db down")));
        assert!(!err.is_canceled());
        assert_eq!(err.to_string(), "refresh failed: db down");
    }

    #[test]
    fn test_cancellation_is_distinct_from_refresh_cancellation() {
        let request = CacheError::Canceled;
        let cached = CacheError::Refresh(RefreshError::Canceled);
        assert!(request.is_canceled());
        assert!(!cached.is_canceled());
        assert_ne!(request.as_label(), cached.as_label());
    }

    #[test]
    fn test_messages_carry_details() {
        assert_eq!(RefreshError::fail("db down").as_message(), "error: db down");
        assert_eq!(RefreshError::Canceled.as_message(), "context cancelled");
        let panicked = RefreshError::Panicked {
            reason: "kaboom".into(),
        };
        assert_eq!(panicked.as_message(), "panic: kaboom");

        assert_eq!(CacheError::Canceled.as_message(), "request cancelled");
        assert_eq!(CacheError::Closed.as_message(), "cache closed");
        assert_eq!(CacheError::Refresh(panicked).as_message(), "panic: kaboom");
    }
}
