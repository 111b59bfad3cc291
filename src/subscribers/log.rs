//! # LogWriter — events to `tracing`
//!
//! Renders every cache [`Event`] as a `tracing` record. Routine traffic goes to
//! `debug`, refresh failures to `info`, and the advisory overrun plus subscriber
//! trouble to `warn`. Installing a `tracing` subscriber is up to the application.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG keepwarm: actor spawned key="user:1"
//! DEBUG keepwarm: refresh scheduled key="user:1" delay_ms=2000 source=Success
//!  INFO keepwarm: refresh failed key="user:2" reason="refresh failed: timeout"
//!  WARN keepwarm: refresh overrun, previous refresh still in flight key="user:1"
//! DEBUG keepwarm: key evicted key="user:1"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let key = e.key.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::ActorSpawned => {
                tracing::debug!(target: "keepwarm", key, seq = e.seq, "actor spawned");
            }
            EventKind::InitialComputed => {
                tracing::debug!(target: "keepwarm", key, reason, "initialised value");
            }
            EventKind::ValueServed => {
                tracing::trace!(target: "keepwarm", key, "value returned");
            }
            EventKind::RefreshStarted => {
                tracing::debug!(target: "keepwarm", key, "triggering a refresh");
            }
            EventKind::RefreshCompleted => {
                tracing::debug!(target: "keepwarm", key, "refreshed value");
            }
            EventKind::RefreshFailed => {
                tracing::info!(target: "keepwarm", key, reason, "refresh failed");
            }
            EventKind::RefreshScheduled => {
                tracing::debug!(
                    target: "keepwarm",
                    key,
                    delay_ms = e.delay_ms,
                    source = ?e.backoff_source,
                    "refresh scheduled"
                );
            }
            EventKind::RefreshOverrun => {
                tracing::warn!(
                    target: "keepwarm",
                    key,
                    "refresh overrun, previous refresh still in flight"
                );
            }
            EventKind::KeyEvicted => {
                tracing::debug!(target: "keepwarm", key, "key evicted");
            }
            EventKind::ActorRetired => {
                tracing::debug!(target: "keepwarm", key, "maintenance loop exits");
            }
            EventKind::StaleHandle => {
                tracing::debug!(target: "keepwarm", key, "stale handle, respawning actor");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(
                    target: "keepwarm",
                    subscriber = key,
                    reason,
                    "subscriber dropped event"
                );
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(target: "keepwarm", subscriber = key, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
