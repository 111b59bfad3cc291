//! # KeyActor: single-key maintenance loop.
//!
//! One actor exists per actively cached key. It is the sole owner of that key's
//! outcome and schedule; nothing else reads or writes them.
//!
//! ## Architecture
//! ```text
//! Table::acquire (vacant) ──► tokio::spawn(KeyActor::run)
//!
//! compute initial outcome (lifetime token)
//! schedule(outcome) ──► arm timer
//! loop select! {
//!   ├─► lifetime cancelled            → retire (Shutdown)
//!   ├─► mailbox request               → hand outcome to that caller, used = true
//!   ├─► timer, used == false          → serve callers already queued, else retire (Evicted)
//!   ├─► timer, used == true           → used = false
//!   │     ├─ no refresh in flight     → spawn refresh (actor token), re-arm from current outcome
//!   │     └─ refresh in flight        → publish RefreshOverrun, leave timer unarmed
//!   └─► refresh joined                → adopt outcome, re-arm from new outcome
//! }
//! retire: Table::remove(key, own id) → close + drain mailbox → cancel actor token
//! ```
//!
//! ## Rules
//! - At most **one** refresh in flight per actor (single-flight).
//! - Outcomes apply strictly in order: initial, then each joined refresh.
//! - Caller hand-off is one receiver at a time; a hand-off is what marks the key as used.
//! - A caller that gave up before its hand-off does not count as a use; one
//!   still queued when the interval elapses does.
//! - Any delay is legal: deadlines past the representable range saturate.
//! - Retiring actively cancels an in-flight refresh; its result is never observed.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::{select, sync::mpsc, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::{
    core::cache::Shared,
    core::runner::compute_once,
    core::table::{Outcome, Request},
    error::RefreshError,
    events::{Event, EventKind},
};

/// Stand-in deadline for delays that overflow `Instant` (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Why an actor stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ActorExitReason {
    /// A full interval passed without a hand-off.
    Evicted,
    /// The cache lifetime token was cancelled.
    Shutdown,
    /// Every sender of the mailbox disappeared (entry removed behind our back).
    Detached,
}

/// Maintains one key.
pub(crate) struct KeyActor<K, V> {
    key: K,
    /// `Debug` rendering of `key`, shared by every event of this actor.
    label: Arc<str>,
    /// Id of the table handle this actor answers to.
    handle_id: u64,
    shared: Arc<Shared<K, V>>,
    mailbox: mpsc::Receiver<Request<V>>,
}

impl<K, V> KeyActor<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        key: K,
        handle_id: u64,
        shared: Arc<Shared<K, V>>,
        mailbox: mpsc::Receiver<Request<V>>,
    ) -> Self {
        let label: Arc<str> = Arc::from(format!("{key:?}"));
        Self {
            key,
            label,
            handle_id,
            shared,
            mailbox,
        }
    }

    pub(crate) fn label(&self) -> Arc<str> {
        Arc::clone(&self.label)
    }

    /// Runs the actor until eviction or shutdown, then retires it.
    pub(crate) async fn run(mut self) -> ActorExitReason {
        let lifetime = self.shared.lifetime.clone();
        let actor_token = lifetime.child_token();
        let _abort_refresh = actor_token.clone().drop_guard();

        let mut current = compute_once(
            self.shared.refresher.as_ref(),
            lifetime.clone(),
            &self.key,
            &self.label,
            &self.shared.bus,
        )
        .await;
        self.publish_initial(&current);

        let timer = time::sleep_until(deadline(self.schedule(&current)));
        tokio::pin!(timer);
        let mut armed = true;
        let mut used = false;
        let mut in_flight: Option<JoinHandle<Outcome<V>>> = None;

        let reason = loop {
            select! {
                _ = lifetime.cancelled() => break ActorExitReason::Shutdown,

                req = self.mailbox.recv() => match req {
                    Some(req) => {
                        if req.fulfil(current.clone()) {
                            used = true;
                            self.publish(EventKind::ValueServed);
                        }
                    }
                    None => break ActorExitReason::Detached,
                },

                () = &mut timer, if armed => {
                    if !used && !self.serve_queued(&current) {
                        break ActorExitReason::Evicted;
                    }
                    used = false;

                    if in_flight.is_none() {
                        in_flight = Some(self.spawn_refresh(actor_token.clone()));
                        let delay = self.schedule(&current);
                        timer.as_mut().reset(deadline(delay));
                    } else {
                        armed = false;
                        self.publish(EventKind::RefreshOverrun);
                    }
                }

                joined = join_refresh(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    current = joined;
                    let delay = self.schedule(&current);
                    timer.as_mut().reset(deadline(delay));
                    armed = true;
                }
            }
        };

        self.retire(reason).await;
        reason
    }

    /// Picks the next interval for `outcome` and publishes it.
    ///
    /// Success resets both strategies before asking the positive one; failure
    /// only advances the negative one.
    fn schedule(&self, outcome: &Outcome<V>) -> Duration {
        let shared = &self.shared;
        let event = Event::new(EventKind::RefreshScheduled).with_key(Arc::clone(&self.label));

        let (delay, event) = if outcome.is_ok() {
            shared.positive.reset();
            shared.negative.reset();
            let delay = shared.positive.next();
            (delay, event.with_backoff_success())
        } else {
            let delay = shared.negative.next();
            (delay, event.with_backoff_failure())
        };

        shared.bus.publish(event.with_delay(delay));
        delay
    }

    /// Starts a background refresh whose only output is its join handle.
    fn spawn_refresh(&self, token: CancellationToken) -> JoinHandle<Outcome<V>> {
        self.publish(EventKind::RefreshStarted);

        let refresher = Arc::clone(&self.shared.refresher);
        let key = self.key.clone();
        let label = Arc::clone(&self.label);
        let bus = self.shared.bus.clone();

        tokio::spawn(async move {
            compute_once(refresher.as_ref(), token, &key, &label, &bus).await
        })
    }

    /// Hands `outcome` to callers that queued before the interval elapsed.
    ///
    /// Returns `true` once one of them accepts it.
    fn serve_queued(&mut self, outcome: &Outcome<V>) -> bool {
        while let Ok(req) = self.mailbox.try_recv() {
            if req.fulfil(outcome.clone()) {
                self.publish(EventKind::ValueServed);
                return true;
            }
        }
        false
    }

    /// Removes the table entry, then closes and drains the mailbox.
    ///
    /// Callers already queued see their reply slot dropped and retry against a
    /// fresh actor. Draining until `None` also catches senders that were
    /// granted a slot before the close but had not delivered yet.
    async fn retire(mut self, reason: ActorExitReason) {
        self.shared.table.remove(&self.key, self.handle_id);
        self.mailbox.close();
        while let Some(req) = self.mailbox.recv().await {
            drop(req);
        }

        let kind = match reason {
            ActorExitReason::Evicted => EventKind::KeyEvicted,
            ActorExitReason::Shutdown | ActorExitReason::Detached => EventKind::ActorRetired,
        };
        self.publish(kind);
    }

    fn publish_initial(&self, outcome: &Outcome<V>) {
        let mut ev = Event::new(EventKind::InitialComputed).with_key(Arc::clone(&self.label));
        if let Err(e) = outcome {
            ev = ev.with_reason(e.to_string());
        }
        self.shared.bus.publish(ev);
    }

    #[inline]
    fn publish(&self, kind: EventKind) {
        if self.shared.bus.is_idle() {
            return;
        }
        self.shared
            .bus
            .publish(Event::new(kind).with_key(Arc::clone(&self.label)));
    }
}

/// `now + delay`, saturating at [`FAR_FUTURE`] from now.
fn deadline(delay: Duration) -> time::Instant {
    let now = time::Instant::now();
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Awaits the in-flight refresh, or never resolves if there is none.
async fn join_refresh<V>(slot: &mut Option<JoinHandle<Outcome<V>>>) -> Outcome<V> {
    match slot.as_mut() {
        Some(handle) => match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => Err(RefreshError::Panicked {
                reason: join_err.to_string(),
            }),
        },
        None => std::future::pending().await,
    }
}
