//! # Function-backed refresher (`RefreshFn`)
//!
//! [`RefreshFn`] wraps a closure `F: Fn(CancellationToken, K) -> Fut`, producing
//! a fresh future per invocation. The key is passed by value (cloned), so the
//! closure can move it straight into an `async move` block.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use keepwarm::{RefreshError, RefreshFn, RefresherRef};
//!
//! let r: RefresherRef<u64, String> =
//!     RefreshFn::arc(|_ctx: CancellationToken, key: u64| async move {
//!         Ok::<_, RefreshError>(format!("value-{key}"))
//!     });
//! # let _ = r;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::RefreshError;
use crate::refreshers::refresher::Refresh;

/// Function-backed refresher implementation.
#[derive(Debug)]
pub struct RefreshFn<F> {
    f: F,
}

impl<F> RefreshFn<F> {
    /// Prefer [`RefreshFn::arc`] when you immediately need a
    /// [`RefresherRef`](crate::RefresherRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the refresher and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut, K, V> Refresh<K, V> for RefreshFn<F>
where
    F: Fn(CancellationToken, K) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<V, RefreshError>> + Send + 'static,
    K: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    async fn compute(&self, ctx: CancellationToken, key: &K) -> Result<V, RefreshError> {
        (self.f)(ctx, key.clone()).await
    }
}
