//! # keepwarm
//!
//! **Keepwarm** is a self-refreshing, single-flight async cache for Rust.
//!
//! Each key that is read gets its own actor. The actor computes the value once,
//! hands it to every caller, refreshes it in the background on a schedule and
//! retires once a full interval passes without anyone reading it. Failures are
//! cached too ("negative caching") and retried on their own schedule.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  get(k1)     │   │  get(k1)     │   │  get(k2)     │
//!     │ (caller #1)  │   │ (caller #2)  │   │ (caller #3)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Cache (get dispatcher)                                           │
//! │  - Table (key → actor handle, insert-if-absent)                   │
//! │  - Refresher (user computation)                                   │
//! │  - positive / negative Delay (shared by all keys)                 │
//! │  - Bus (broadcast events)                                         │
//! └──────┬─────────────────────────────────────┬──────────────────────┘
//!        ▼                                     ▼
//!     ┌──────────────────────┐              ┌──────────────────────┐
//!     │  KeyActor(k1)        │              │  KeyActor(k2)        │
//!     │  outcome + schedule  │              │  outcome + schedule  │
//!     └┬─────────────────────┘              └┬─────────────────────┘
//!      │ Publishes:                          │
//!      │ - InitialComputed                   │
//!      │ - RefreshScheduled / RefreshOverrun │
//!      │ - KeyEvicted / ActorRetired         │
//!      ▼                                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                   (capacity: Config::bus_capacity)                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                          ┌─────────┼─────────┐
//!                          ▼         ▼         ▼
//!                       worker1  worker2  workerN
//! ```
//!
//! ### Lifecycle of a key
//! ```text
//! first get(k) ──► Table::acquire ──► KeyActor::run()
//!
//! initial compute (lifetime token) ──► schedule
//! loop {
//!   ├─► request        ──► hand current outcome to one caller, used = true
//!   ├─► timer fires
//!   │     ├─ unused    ──► retire (KeyEvicted)
//!   │     ├─ idle      ──► spawn refresh (actor token), keep serving old outcome
//!   │     └─ busy      ──► RefreshOverrun, wait for the refresh
//!   ├─► refresh done   ──► adopt outcome, schedule
//!   │       ├─ Ok  ──► reset positive + negative, positive.next()
//!   │       └─ Err ──► negative.next()
//!   └─► lifetime cancelled ──► retire (ActorRetired)
//! }
//!
//! retire: remove table entry ──► close + drain mailbox ──► cancel in-flight refresh
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                       |
//! |-------------------|---------------------------------------------------------------|------------------------------------------|
//! | **Cache**         | Single-flight reads, background refresh, idle eviction.       | [`Cache`], [`CacheBuilder`]              |
//! | **Refreshers**    | The user computation, as a trait object or closure.           | [`Refresh`], [`RefreshFn`], [`RefresherRef`] |
//! | **Policies**      | Refresh intervals after success and after failure.            | [`Delay`], [`BackoffDelay`], [`BackoffPolicy`] |
//! | **Errors**        | Typed errors for computations and for `get`.                  | [`RefreshError`], [`CacheError`]         |
//! | **Subscriber API**| Hook into cache events (logging, metrics, custom subscribers).| [`Subscribe`], [`LogWriter`]             |
//! | **Configuration** | Centralize runtime settings.                                  | [`Config`]                               |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use keepwarm::{BackoffDelay, BackoffPolicy, Cache, Config, LogWriter, RefreshError, RefreshFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lifetime = CancellationToken::new();
//!     let subs: Vec<Arc<dyn keepwarm::Subscribe>> = vec![Arc::new(LogWriter::new())];
//!
//!     let cache = Cache::<u64, String>::builder(
//!         lifetime.clone(),
//!         RefreshFn::arc(|ctx: CancellationToken, id: u64| async move {
//!             if ctx.is_cancelled() {
//!                 return Err(RefreshError::Canceled);
//!             }
//!             Ok(format!("user-{id}"))
//!         }),
//!         Arc::new(BackoffDelay::constant(Duration::from_secs(30))),
//!         Arc::new(BackoffDelay::new(BackoffPolicy::exponential(
//!             Duration::from_millis(500),
//!             2.0,
//!             Duration::from_secs(30),
//!         ))),
//!     )
//!     .with_config(Config::default())
//!     .with_subscribers(subs)
//!     .build();
//!
//!     let name = cache.get(&CancellationToken::new(), 7).await?;
//!     assert_eq!(name, "user-7");
//!
//!     cache.shutdown();
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod refreshers;
mod subscribers;

// ---- Public re-exports ----

pub use core::{Cache, CacheBuilder, Config};
pub use error::{CacheError, RefreshError};
pub use events::{BackoffSource, Bus, Event, EventKind};
pub use policies::{BackoffDelay, BackoffPolicy, Delay, JitterPolicy};
pub use refreshers::{Refresh, RefreshFn, RefresherRef};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
