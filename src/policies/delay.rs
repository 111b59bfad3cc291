//! # Delay strategies: the stateful side of backoff.
//!
//! A cache owns two [`Delay`] instances: the **positive** one picks the wait
//! after a successful computation, the **negative** one after a failure.
//!
//! ```text
//! outcome Ok  ──► positive.reset(); negative.reset(); wait positive.next()
//! outcome Err ──► wait negative.next()            (no reset: failures back off)
//! ```
//!
//! Both instances are shared by every key actor of one cache, so
//! implementations must be `Send + Sync` and use interior mutability.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Stateful interval generator.
pub trait Delay: Send + Sync + 'static {
    /// Returns to the base interval.
    fn reset(&self);

    /// Returns the interval to wait now and advances internal state for the next call.
    fn next(&self) -> Duration;
}

/// [`Delay`] driven by a [`BackoffPolicy`].
///
/// Each `next()` hands out `policy.next(step)` and bumps `step`; `reset()`
/// brings `step` back to zero.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use keepwarm::{BackoffDelay, BackoffPolicy, Delay};
///
/// let negative = BackoffDelay::new(BackoffPolicy::exponential(
///     Duration::from_millis(200),
///     2.0,
///     Duration::from_secs(1),
/// ));
///
/// assert_eq!(negative.next(), Duration::from_millis(200));
/// assert_eq!(negative.next(), Duration::from_millis(400));
/// negative.reset();
/// assert_eq!(negative.next(), Duration::from_millis(200));
/// ```
pub struct BackoffDelay {
    policy: BackoffPolicy,
    step: AtomicU32,
    /// Last handed-out interval in ms; `u64::MAX` = none since reset.
    prev_ms: AtomicU64,
}

impl BackoffDelay {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            step: AtomicU32::new(0),
            prev_ms: AtomicU64::new(u64::MAX),
        }
    }

    /// Constant interval.
    pub fn constant(every: Duration) -> Self {
        Self::new(BackoffPolicy::constant(every))
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }
}

impl Delay for BackoffDelay {
    fn reset(&self) {
        self.step.store(0, Ordering::Relaxed);
        self.prev_ms.store(u64::MAX, Ordering::Relaxed);
    }

    fn next(&self) -> Duration {
        let step = self
            .step
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| Some(s.saturating_add(1)))
            .unwrap_or_else(|s| s);
        let prev = match self.prev_ms.load(Ordering::Relaxed) {
            u64::MAX => None,
            ms => Some(Duration::from_millis(ms)),
        };

        let delay = self.policy.next(step, prev);
        let ms = delay.as_millis().min(u128::from(u64::MAX - 1)) as u64;
        self.prev_ms.store(ms, Ordering::Relaxed);
        delay
    }
}

impl fmt::Debug for BackoffDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackoffDelay")
            .field("policy", &self.policy)
            .field("step", &self.step.load(Ordering::Relaxed))
            .finish()
    }
}
