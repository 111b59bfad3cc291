//! Cache events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by key actors, the get dispatcher and
//! subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `KeyActor`, `runner::compute_once`, `Cache::get`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the cache's subscriber listener (fans out to `SubscriberSet`)
//!   and any receiver obtained from `Cache::events()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{BackoffSource, Event, EventKind};
