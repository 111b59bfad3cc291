//! # Cache: get dispatcher and shared state.
//!
//! [`Cache`] is the client entry point. It owns nothing but the shared table of
//! live actors and the collaborators every actor needs; all per-key state lives
//! in the actors themselves.
//!
//! ## Dispatch
//! ```text
//! get(request, key) loop {
//!   ├─► lifetime cancelled?               → Err(Closed)
//!   ├─► Table::acquire(key)
//!   │     └─ created? → spawn KeyActor(key, mailbox)
//!   ├─► select! {
//!   │     request.cancelled()             → Err(Canceled)   (actor/table untouched)
//!   │     handle.request()
//!   │        ├─ Some(Ok(v))               → Ok(v)
//!   │        ├─ Some(Err(e))              → Err(Refresh(e)) (negatively cached)
//!   │        └─ None (actor retired)      → Table::remove(key, stale id), retry
//!   │   }
//! }
//! ```
//!
//! The retry on a retired handle is what makes "actor retiring" vs "caller
//! arriving" safe: the worst case is one extra initial computation.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use keepwarm::{BackoffDelay, BackoffPolicy, Cache, RefreshError, RefreshFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lifetime = CancellationToken::new();
//!     let cache = Cache::<String, usize>::new(
//!         lifetime.clone(),
//!         RefreshFn::arc(|_ctx: CancellationToken, key: String| async move {
//!             Ok::<_, RefreshError>(key.len())
//!         }),
//!         Arc::new(BackoffDelay::constant(Duration::from_secs(30))),
//!         Arc::new(BackoffDelay::new(BackoffPolicy::exponential(
//!             Duration::from_secs(1),
//!             2.0,
//!             Duration::from_secs(60),
//!         ))),
//!     );
//!
//!     let len = cache.get(&CancellationToken::new(), "hello".to_string()).await?;
//!     assert_eq!(len, 5);
//!
//!     lifetime.cancel();
//!     Ok(())
//! }
//! ```

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use tokio::select;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        actor::KeyActor,
        builder::CacheBuilder,
        config::Config,
        table::{Request, Table},
    },
    error::CacheError,
    events::{Bus, Event, EventKind},
    policies::Delay,
    refreshers::RefresherRef,
};

/// State shared by the dispatcher and every key actor of one cache.
pub(crate) struct Shared<K, V> {
    pub(crate) table: Table<K, V>,
    pub(crate) refresher: RefresherRef<K, V>,
    pub(crate) positive: Arc<dyn Delay>,
    pub(crate) negative: Arc<dyn Delay>,
    pub(crate) bus: Bus,
    /// Cancelled → every actor retires and every in-flight refresh is cancelled.
    pub(crate) lifetime: CancellationToken,
    pub(crate) cfg: Config,
}

/// Self-refreshing, single-flight cache.
///
/// Cloning is cheap; clones share the same actors.
pub struct Cache<K, V> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache with [`Config::default`] and no subscribers.
    ///
    /// - `lifetime` governs every actor this cache ever creates; cancelling it
    ///   stops them all and cancels their in-flight refreshes.
    /// - `positive` picks the wait after a successful computation.
    /// - `negative` picks the wait after a failed one.
    pub fn new(
        lifetime: CancellationToken,
        refresher: RefresherRef<K, V>,
        positive: Arc<dyn Delay>,
        negative: Arc<dyn Delay>,
    ) -> Self {
        Self::builder(lifetime, refresher, positive, negative).build()
    }

    /// Returns a builder for config and subscribers.
    pub fn builder(
        lifetime: CancellationToken,
        refresher: RefresherRef<K, V>,
        positive: Arc<dyn Delay>,
        negative: Arc<dyn Delay>,
    ) -> CacheBuilder<K, V> {
        CacheBuilder::new(lifetime, refresher, positive, negative)
    }

    pub(crate) fn from_shared(shared: Arc<Shared<K, V>>) -> Self {
        Self { shared }
    }

    /// Returns the value for `key`, computing it if no actor holds it yet.
    ///
    /// Suspends until the key's actor hands over its current outcome or
    /// `request` is cancelled. Cancelling `request` only abandons this call:
    /// the shared computation keeps running for other callers.
    ///
    /// # Errors
    /// - [`CacheError::Canceled`] if `request` fired first.
    /// - [`CacheError::Closed`] if the cache lifetime has ended.
    /// - [`CacheError::Refresh`] if the key is negatively cached.
    pub async fn get(&self, request: &CancellationToken, key: K) -> Result<V, CacheError> {
        let shared = &self.shared;

        loop {
            if shared.lifetime.is_cancelled() {
                return Err(CacheError::Closed);
            }

            let (handle, mailbox) = shared
                .table
                .acquire(&key, shared.cfg.mailbox_capacity_clamped());
            if let Some(mailbox) = mailbox {
                self.spawn_actor(key.clone(), handle.id(), mailbox);
            }

            let served = select! {
                biased;
                _ = request.cancelled() => return Err(CacheError::Canceled),
                served = handle.request() => served,
            };

            match served {
                Some(outcome) => return outcome.map_err(CacheError::from),
                None => {
                    shared.table.remove(&key, handle.id());
                    if !shared.bus.is_idle() {
                        let ev = Event::new(EventKind::StaleHandle).with_key(format!("{key:?}"));
                        shared.bus.publish(ev);
                    }
                }
            }
        }
    }

    fn spawn_actor(&self, key: K, handle_id: u64, mailbox: mpsc::Receiver<Request<V>>) {
        let actor = KeyActor::new(key, handle_id, Arc::clone(&self.shared), mailbox);
        self.shared
            .bus
            .publish(Event::new(EventKind::ActorSpawned).with_key(actor.label()));
        tokio::spawn(actor.run());
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Number of live key actors.
    pub fn len(&self) -> usize {
        self.shared.table.len()
    }

    /// True if no key is currently cached.
    pub fn is_empty(&self) -> bool {
        self.shared.table.len() == 0
    }

    /// True if `key` currently has a live actor.
    pub fn contains_key(&self, key: &K) -> bool {
        self.shared.table.contains_key(key)
    }

    /// Snapshot of the keys that currently have a live actor (unordered).
    pub fn keys(&self) -> Vec<K> {
        self.shared.table.keys()
    }

    /// New receiver for every event published from now on.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// The lifetime token actors run under.
    pub fn lifetime(&self) -> &CancellationToken {
        &self.shared.lifetime
    }

    /// Stops every actor; subsequent `get` calls return [`CacheError::Closed`].
    pub fn shutdown(&self) {
        self.shared.lifetime.cancel();
    }

    /// True once the lifetime token is cancelled.
    pub fn is_shut_down(&self) -> bool {
        self.shared.lifetime.is_cancelled()
    }
}
