//! # Cache events emitted by key actors and the dispatcher.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Actor lifecycle**: spawn, initial computation, eviction, retirement
//! - **Refresh flow**: started, completed, failed, scheduled, overrun
//! - **Plumbing**: served hand-offs, stale handles, subscriber trouble
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the key,
//! reasons, and scheduling delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use keepwarm::{BackoffSource, Event, EventKind};
//!
//! let ev = Event::new(EventKind::RefreshScheduled)
//!     .with_key("user:42")
//!     .with_delay(Duration::from_secs(5))
//!     .with_backoff_failure();
//!
//! assert_eq!(ev.kind, EventKind::RefreshScheduled);
//! assert_eq!(ev.key.as_deref(), Some("user:42"));
//! assert_eq!(ev.delay_ms, Some(5_000));
//! assert_eq!(ev.backoff_source, Some(BackoffSource::Failure));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of cache events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `key`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `key`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Actor lifecycle ===
    /// A new key actor was spawned by the dispatcher.
    ///
    /// Sets:
    /// - `key`: key
    ActorSpawned,

    /// The actor finished its initial computation and starts serving.
    ///
    /// Sets:
    /// - `key`: key
    /// - `reason`: error message when the initial outcome is negative
    InitialComputed,

    /// The current outcome was handed to one caller.
    ///
    /// Sets:
    /// - `key`: key
    ValueServed,

    /// A whole scheduling interval passed without a single hand-off; the actor
    /// retires and removes its table entry.
    ///
    /// Sets:
    /// - `key`: key
    KeyEvicted,

    /// The actor stopped because the cache lifetime ended.
    ///
    /// Sets:
    /// - `key`: key
    ActorRetired,

    /// A caller hit a retired handle and is retrying with a fresh actor.
    ///
    /// Sets:
    /// - `key`: key
    StaleHandle,

    // === Refresh flow ===
    /// A background refresh was dispatched.
    ///
    /// Sets:
    /// - `key`: key
    RefreshStarted,

    /// A refresher invocation returned a value.
    ///
    /// Sets:
    /// - `key`: key
    RefreshCompleted,

    /// A refresher invocation returned an error (now negatively cached).
    ///
    /// Sets:
    /// - `key`: key
    /// - `reason`: failure message
    RefreshFailed,

    /// The interval timer was armed.
    ///
    /// Sets:
    /// - `key`: key
    /// - `delay_ms`: delay before the next check (ms)
    /// - `backoff_source`: `Success` or `Failure`
    RefreshScheduled,

    /// Advisory: an interval elapsed while the previous refresh was still in
    /// flight. No second refresh is started.
    ///
    /// Sets:
    /// - `key`: key
    RefreshOverrun,
}

/// Which delay strategy produced a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffSource {
    Success,
    Failure,
}

/// Cache event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    /// Scheduling delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// `Debug` rendering of the key, if applicable.
    pub key: Option<Arc<str>>,
    /// Event classification.
    pub kind: EventKind,
    /// Strategy that produced the schedule (success vs failure).
    pub backoff_source: Option<BackoffSource>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            kind,
            at: SystemTime::now(),
            delay_ms: None,
            reason: None,
            backoff_source: None,
            key: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an already rendered key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches a scheduling delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Marks that this schedule comes from the positive strategy.
    #[inline]
    pub fn with_backoff_success(mut self) -> Self {
        self.backoff_source = Some(BackoffSource::Success);
        self
    }

    /// Marks that this schedule comes from the negative strategy.
    #[inline]
    pub fn with_backoff_failure(mut self) -> Self {
        self.backoff_source = Some(BackoffSource::Failure);
        self
    }

    /// Returns the delay as a [`Duration`], if set.
    #[inline]
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(|ms| Duration::from_millis(u64::from(ms)))
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_key(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_key(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::ValueServed);
        let b = Event::new(EventKind::ValueServed);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_delay_saturates_at_u32() {
        let ev = Event::new(EventKind::RefreshScheduled).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn test_delay_reads_back_in_millis() {
        let ev = Event::new(EventKind::RefreshScheduled).with_delay(Duration::from_micros(1_500));
        assert_eq!(ev.delay(), Some(Duration::from_millis(1)));
        assert_eq!(Event::new(EventKind::ValueServed).delay(), None);
    }
}
