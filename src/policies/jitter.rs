//! # Jitter policy for refresh delays.
//!
//! [`JitterPolicy`] spreads refreshes of many keys that were created together,
//! so they do not all hit the refresher on the same tick.
//!
//! - [`JitterPolicy::None`] — exact delay
//! - [`JitterPolicy::Full`] — random delay in `[0, base]`
//! - [`JitterPolicy::Equal`] — `base/2 + random[0, base/2]`
//! - [`JitterPolicy::Decorrelated`] — random delay in `[floor, prev * 3]`, capped at max

use std::time::Duration;

use rand::Rng;

/// Randomization applied on top of a computed backoff delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use exact backoff delay. Predictable; best for tests.
    #[default]
    None,

    /// Full jitter: random delay in `[0, base]`.
    Full,

    /// Equal jitter: keeps at least half of the base delay.
    Equal,

    /// Decorrelated jitter: grows from the previous delay rather than the
    /// attempt number. Needs the previous delay, which stateful strategies
    /// such as [`BackoffDelay`](crate::BackoffDelay) keep track of.
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to `base`.
    ///
    /// `prev` is the delay handed out last time (if any); `floor` and `max`
    /// bound the decorrelated range and are ignored by the other variants.
    pub fn apply(
        &self,
        base: Duration,
        prev: Option<Duration>,
        floor: Duration,
        max: Duration,
    ) -> Duration {
        match self {
            JitterPolicy::None => base,
            JitterPolicy::Full => random_between(Duration::ZERO, base),
            JitterPolicy::Equal => {
                let half = base / 2;
                half + random_between(Duration::ZERO, base - half)
            }
            JitterPolicy::Decorrelated => {
                let floor = floor.min(max);
                let upper = prev.unwrap_or(floor).saturating_mul(3).min(max).max(floor);
                random_between(floor, upper)
            }
        }
    }
}

/// Uniform pick in `[lo, hi]` at millisecond resolution.
fn random_between(lo: Duration, hi: Duration) -> Duration {
    let lo_ms = lo.as_millis() as u64;
    let hi_ms = hi.as_millis() as u64;
    if hi_ms <= lo_ms {
        return lo;
    }
    Duration::from_millis(rand::rng().random_range(lo_ms..=hi_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOOR: Duration = Duration::from_millis(100);
    const MAX: Duration = Duration::from_secs(30);

    #[test]
    fn test_none_is_identity() {
        let d = Duration::from_millis(1234);
        assert_eq!(JitterPolicy::None.apply(d, None, FLOOR, MAX), d);
    }

    #[test]
    fn test_full_within_base() {
        let base = Duration::from_millis(1000);
        for _ in 0..100 {
            assert!(JitterPolicy::Full.apply(base, None, FLOOR, MAX) <= base);
        }
    }

    #[test]
    fn test_equal_keeps_half() {
        let base = Duration::from_millis(1000);
        for _ in 0..100 {
            let d = JitterPolicy::Equal.apply(base, None, FLOOR, MAX);
            assert!(d >= Duration::from_millis(500), "{d:?} below half");
            assert!(d <= base, "{d:?} above base");
        }
    }

    #[test]
    fn test_decorrelated_bounded_by_prev_and_max() {
        let prev = Some(Duration::from_millis(400));
        for _ in 0..100 {
            let d = JitterPolicy::Decorrelated.apply(Duration::ZERO, prev, FLOOR, MAX);
            assert!(d >= FLOOR);
            assert!(d <= Duration::from_millis(1200));
        }

        let capped = JitterPolicy::Decorrelated.apply(
            Duration::ZERO,
            Some(Duration::from_secs(60)),
            FLOOR,
            Duration::from_secs(1),
        );
        assert!(capped <= Duration::from_secs(1));
    }

    #[test]
    fn test_zero_base() {
        assert_eq!(
            JitterPolicy::Full.apply(Duration::ZERO, None, FLOOR, MAX),
            Duration::ZERO
        );
        assert_eq!(
            JitterPolicy::Equal.apply(Duration::ZERO, None, FLOOR, MAX),
            Duration::ZERO
        );
    }
}
