//! # Refresher abstractions.
//!
//! - [`Refresh`] - trait for async cancelable value computations
//! - [`RefreshFn`] - closure-backed implementation
//! - [`RefresherRef`] - shared reference (`Arc<dyn Refresh<K, V>>`)

mod refresh_fn;
mod refresher;

pub use refresh_fn::RefreshFn;
pub use refresher::{Refresh, RefresherRef};
