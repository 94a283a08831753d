//! Query cache
//!
//! Memoizes feed listings, feed details, search hits, meta aggregates and
//! resolved configuration in one bounded in-process store.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! max_entries = 1024
//! ```

mod config;
pub mod keys;
mod store;
mod trigger;

pub use config::CacheConfig;
pub use store::QueryCache;
pub use trigger::CacheTrigger;
