//! Refresh scheduling policies.
//!
//! This module groups the knobs that control **how long** a key actor waits
//! before its next refresh check.
//!
//! ## Contents
//! - [`Delay`]         stateful interval generator (`reset` / `next`)
//! - [`BackoffDelay`]  `Delay` backed by a [`BackoffPolicy`]
//! - [`BackoffPolicy`] how intervals evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization to spread refreshes of many keys
//!
//! ## Quick wiring
//! ```text
//! Cache::new(lifetime, refresher, positive: Arc<dyn Delay>, negative: Arc<dyn Delay>)
//!      └─► core::actor::KeyActor uses:
//!           - positive.next() after a success (both reset first)
//!           - negative.next() after a failure (keeps growing)
//! ```

mod backoff;
mod delay;
mod jitter;

pub use backoff::BackoffPolicy;
pub use delay::{BackoffDelay, Delay};
pub use jitter::JitterPolicy;
