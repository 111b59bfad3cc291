//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and a built-in [`LogWriter`] for events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! KeyActor ── publish(Event) ──► Bus ──► subscriber listener ──► SubscriberSet
//!                                                                  │
//!                                                    ┌─────────────┼──────────┐
//!                                                    ▼             ▼          ▼
//!                                                LogWriter      Metrics    Custom
//! ```

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
