//! Runtime core: dispatch and per-key actors.
//!
//! The public API from this module is [`Cache`], [`CacheBuilder`] and [`Config`].
//!
//! Internal modules:
//! - [`cache`]: get dispatcher and the state shared with actors;
//! - [`table`]: concurrent map of live actors (insert-if-absent / conditional delete);
//! - [`actor`]: one maintenance loop per key (serve, refresh, schedule, evict);
//! - [`runner`]: runs one refresher invocation and publishes its outcome;
//! - [`builder`]: wires config, bus and subscribers;
//! - [`config`]: runtime settings.

mod actor;
mod builder;
mod cache;
mod config;
mod runner;
mod table;

pub use builder::CacheBuilder;
pub use cache::Cache;
pub use config::Config;
