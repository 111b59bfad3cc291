//! # Cache runtime configuration.
//!
//! Provides [`Config`] centralized settings for one [`Cache`](crate::Cache).
//! Refresh scheduling is not configured here: it is the job of the two
//! [`Delay`](crate::Delay) strategies passed at construction.

use std::time::Duration;

/// Runtime configuration for a cache.
///
/// ## Field semantics
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `mailbox_capacity`: per-key queue of callers waiting for a hand-off (min 1)
/// - `grace`: how long subscribers keep receiving retirement events after the
///   cache lifetime ends (`0s` = stop at once)
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers lagging more than this many events observe `Lagged` and skip.
    pub bus_capacity: usize,

    /// Number of caller requests that may queue in front of one key actor.
    ///
    /// Further callers wait (cancellably) for a slot. This only bounds memory;
    /// every queued caller is still served one at a time.
    pub mailbox_capacity: usize,

    /// Quiet period that ends subscriber delivery after shutdown.
    ///
    /// Actors publish `KeyEvicted`/`ActorRetired` after the lifetime token fires;
    /// the subscriber listener keeps forwarding until no event arrived for `grace`.
    pub grace: Duration,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a mailbox capacity clamped to a minimum of 1.
    #[inline]
    pub fn mailbox_capacity_clamped(&self) -> usize {
        self.mailbox_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `mailbox_capacity = 64`
    /// - `grace = 100ms`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            mailbox_capacity: 64,
            grace: Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacities_are_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            mailbox_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.mailbox_capacity_clamped(), 1);
    }
}
