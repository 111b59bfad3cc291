//! # Run a single refresher invocation.
//!
//! Executes one `compute` call of a [`Refresh`] with the given cancellation
//! token and publishes exactly one terminal event to the [`Bus`]:
//!
//! ```text
//! refresher.compute() → Ok(v)          → publish RefreshCompleted
//!                     → Err(e)         → publish RefreshFailed{reason}
//!                     → panic (caught) → Err(Panicked) → publish RefreshFailed
//! ```
//!
//! ## Rules
//! - A panicking refresher never takes its key actor down with it; the panic is
//!   turned into a cached [`RefreshError::Panicked`].
//! - The token is passed through untouched: the initial computation gets the
//!   cache lifetime token, background refreshes the actor-scoped one.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::core::table::Outcome;
use crate::error::RefreshError;
use crate::events::{Bus, Event, EventKind};
use crate::refreshers::Refresh;
use crate::subscribers::panic_message;

/// Runs `refresher.compute(token, key)` once, publishing its terminal event.
pub(crate) async fn compute_once<K, V>(
    refresher: &dyn Refresh<K, V>,
    token: CancellationToken,
    key: &K,
    label: &Arc<str>,
    bus: &Bus,
) -> Outcome<V>
where
    K: Send + Sync + 'static,
    V: Send + 'static,
{
    let outcome = match AssertUnwindSafe(refresher.compute(token, key))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(panic_err) => Err(RefreshError::Panicked {
            reason: panic_message(panic_err.as_ref()),
        }),
    };

    match &outcome {
        Ok(_) => bus.publish(Event::new(EventKind::RefreshCompleted).with_key(Arc::clone(label))),
        Err(e) => bus.publish(
            Event::new(EventKind::RefreshFailed)
                .with_key(Arc::clone(label))
                .with_reason(e.to_string()),
        ),
    }
    outcome
}
