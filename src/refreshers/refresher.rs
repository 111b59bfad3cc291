//! # Refresher abstraction.
//!
//! This module defines the [`Refresh`] trait: the async, cancelable computation
//! that produces the value for a key. The common handle type is
//! [`RefresherRef`], an `Arc<dyn Refresh<K, V>>` shared by every key actor.
//!
//! A refresher receives a [`CancellationToken`] and should watch it so that a
//! cache shutdown (or the retirement of the key's actor) aborts long work.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::RefreshError;

/// Shared handle to a refresher.
pub type RefresherRef<K, V> = Arc<dyn Refresh<K, V>>;

/// # Asynchronous, cancelable value computation.
///
/// Called once when a key actor starts and then at most once per scheduling
/// interval while the key stays hot. Never called concurrently for the same key.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use keepwarm::{Refresh, RefreshError};
///
/// struct Lengths;
///
/// #[async_trait]
/// impl Refresh<String, usize> for Lengths {
///     async fn compute(
///         &self,
///         ctx: CancellationToken,
///         key: &String,
///     ) -> Result<usize, RefreshError> {
///         if ctx.is_cancelled() {
///             return Err(RefreshError::Canceled);
///         }
///         Ok(key.len())
///     }
/// }
/// ```
#[async_trait]
pub trait Refresh<K, V>: Send + Sync + 'static {
    /// Computes the value for `key`.
    ///
    /// An `Err` is cached as the key's outcome until the next scheduled attempt
    /// chosen by the negative delay strategy.
    async fn compute(&self, ctx: CancellationToken, key: &K) -> Result<V, RefreshError>;
}
