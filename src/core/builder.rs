//! # Cache builder.
//!
//! [`CacheBuilder`] wires a [`Cache`] together: the event bus, a child of the
//! caller's lifetime token, and (optionally) a subscriber listener task.
//!
//! ```text
//! build()
//!   ├─► Bus::new(cfg.bus_capacity)
//!   ├─► lifetime = parent.child_token()
//!   ├─► subscribers? ──► SubscriberSet + listener task
//!   │                      ├─ forward until lifetime cancelled
//!   │                      ├─ keep forwarding until the bus is quiet for cfg.grace
//!   │                      └─ SubscriberSet::shutdown (drain workers)
//!   └─► Cache { Shared { table, refresher, positive, negative, bus, lifetime, cfg } }
//! ```

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::{sync::broadcast::error::RecvError, time};
use tokio_util::sync::CancellationToken;

use super::{
    cache::{Cache, Shared},
    config::Config,
    table::Table,
};
use crate::{
    events::{Bus, Event},
    policies::Delay,
    refreshers::RefresherRef,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Cache`] with optional config and subscribers.
pub struct CacheBuilder<K, V> {
    lifetime: CancellationToken,
    refresher: RefresherRef<K, V>,
    positive: Arc<dyn Delay>,
    negative: Arc<dyn Delay>,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<K, V> CacheBuilder<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(
        lifetime: CancellationToken,
        refresher: RefresherRef<K, V>,
        positive: Arc<dyn Delay>,
        negative: Arc<dyn Delay>,
    ) -> Self {
        Self {
            lifetime,
            refresher,
            positive,
            negative,
            cfg: Config::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the runtime configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive cache events through dedicated workers with bounded
    /// queues. A non-empty list makes [`build`](Self::build) spawn a listener
    /// task, so it must then run inside a tokio runtime.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the cache.
    ///
    /// The cache runs under a child of the given lifetime token: cancelling the
    /// parent stops it, while [`Cache::shutdown`] leaves the parent alone.
    pub fn build(self) -> Cache<K, V> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let lifetime = self.lifetime.child_token();

        if !self.subscribers.is_empty() {
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            spawn_subscriber_listener(subs, &bus, lifetime.clone(), self.cfg.grace);
        }

        let shared = Arc::new(Shared {
            table: Table::new(),
            refresher: self.refresher,
            positive: self.positive,
            negative: self.negative,
            bus,
            lifetime,
            cfg: self.cfg,
        });
        Cache::from_shared(shared)
    }
}

/// Forwards bus events to the subscriber set until the cache lifetime ends
/// and the bus has been quiet for `grace`, then drains the subscriber workers.
fn spawn_subscriber_listener(
    subs: SubscriberSet,
    bus: &Bus,
    lifetime: CancellationToken,
    grace: Duration,
) {
    let mut rx = bus.subscribe();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = lifetime.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => subs.emit(&ev),
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => on_lagged(&subs, skipped),
                }
            }
        }

        // Actors retire after the lifetime fires and still publish.
        loop {
            match time::timeout(grace, rx.recv()).await {
                Ok(Ok(ev)) => subs.emit(&ev),
                Ok(Err(RecvError::Lagged(skipped))) => on_lagged(&subs, skipped),
                Ok(Err(RecvError::Closed)) | Err(_) => break,
            }
        }
        subs.shutdown().await;
    });
}

fn on_lagged(subs: &SubscriberSet, skipped: u64) {
    tracing::warn!(skipped, "subscriber listener lagged behind the event bus");
    subs.emit(&Event::subscriber_overflow("listener", "lagged"));
}
