//! # Backoff policy: how refresh intervals grow.
//!
//! [`BackoffPolicy`] is the stateless description of an interval schedule.
//! It is parameterized by:
//! - [`BackoffPolicy::first`] the base interval;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the cap.
//!
//! The interval for step `n` is `first × factor^n`, clamped to `max`, then jitter
//! is applied. The base is derived purely from the step number so jitter output
//! never feeds back into the next base.
//!
//! A constant refresh interval is simply `factor = 1.0`.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use keepwarm::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.base(0), Duration::from_millis(100));
//! assert_eq!(backoff.base(1), Duration::from_millis(200));
//! // 100ms × 2^10 = 102.4s → capped at max
//! assert_eq!(backoff.base(10), Duration::from_secs(10));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Interval schedule description.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Base interval (step 0, and the value after every reset).
    pub first: Duration,
    /// Maximum interval.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter applied on top of the base interval.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a schedule with:
    /// - `factor = 1.0` (constant interval);
    /// - `first = 100ms`;
    /// - `max = 30s`.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            jitter: JitterPolicy::None,
            factor: 1.0,
        }
    }
}

impl BackoffPolicy {
    /// Constant interval, no jitter.
    pub fn constant(every: Duration) -> Self {
        Self {
            first: every,
            max: every,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Exponential schedule from `first`, growing by `factor` up to `max`, no jitter.
    pub fn exponential(first: Duration, factor: f64, max: Duration) -> Self {
        Self {
            first,
            max,
            factor,
            jitter: JitterPolicy::None,
        }
    }

    /// Replaces the jitter policy.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Base interval for `step` (0-indexed) before jitter.
    ///
    /// # Notes
    /// - `factor < 1.0` shrinks intervals with higher steps (not typical).
    /// - Non-finite, negative or unrepresentable intermediate values clamp to
    ///   [`BackoffPolicy::max`]; `factor == 0.0` yields zero after step 0.
    pub fn base(&self, step: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let clamped_exp = step.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.first.as_secs_f64() * self.factor.powi(clamped_exp);

        if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs >= max_secs {
            return self.max;
        }
        Duration::try_from_secs_f64(unclamped_secs).map_or(self.max, |d| d.min(self.max))
    }

    /// Interval for `step` with jitter applied.
    ///
    /// `prev` is the interval handed out by the previous step, used only by
    /// [`JitterPolicy::Decorrelated`].
    pub fn next(&self, step: u32, prev: Option<Duration>) -> Duration {
        self.jitter
            .apply(self.base(step), prev, self.first.min(self.max), self.max)
    }
}
