#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use keepwarm::{
    BackoffDelay, BackoffPolicy, Cache, Event, EventKind, RefreshError, RefreshFn, RefresherRef,
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

pub const PERIOD: Duration = Duration::from_millis(200);

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Refresher that fails its first `fail_first` calls instantly, then sleeps
/// `work` (watching its token) and returns how many calls it has seen.
pub fn counting(
    work: Duration,
    fail_first: usize,
) -> (RefresherRef<&'static str, usize>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let refresher: RefresherRef<&'static str, usize> =
        RefreshFn::arc(move |ctx: CancellationToken, _key: &'static str| {
            let calls = Arc::clone(&counter);
            async move {
                if calls.load(Ordering::SeqCst) < fail_first {
                    calls.fetch_add(1, Ordering::SeqCst);
                    return Err(RefreshError::fail("an error"));
                }
                if !work.is_zero() {
                    tokio::select! {
                        _ = ctx.cancelled() => return Err(RefreshError::Canceled),
                        _ = tokio::time::sleep(work) => {}
                    }
                }
                Ok(calls.fetch_add(1, Ordering::SeqCst) + 1)
            }
        });
    (refresher, calls)
}

/// Cache with a constant positive interval of `2 * PERIOD` and a negative one
/// starting at `PERIOD`, doubling up to `5 * PERIOD`.
pub fn cache_with(
    lifetime: &CancellationToken,
    refresher: RefresherRef<&'static str, usize>,
) -> Cache<&'static str, usize> {
    Cache::new(
        lifetime.clone(),
        refresher,
        Arc::new(BackoffDelay::constant(PERIOD * 2)),
        Arc::new(BackoffDelay::new(BackoffPolicy::exponential(PERIOD, 2.0, PERIOD * 5))),
    )
}

/// Everything already published on `rx`.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

pub fn count(events: &[Event], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind == kind).count()
}
