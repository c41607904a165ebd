//! Keyed query cache
//!
//! Queries are registered against a [`QueryKey`]. The cache deduplicates
//! concurrent requests for the same key, keeps the last result and re-runs
//! the registered query when the key is invalidated while someone is
//! subscribed to it.

mod key;
mod query_cache;

pub use key::QueryKey;
pub use query_cache::{CacheStats, QueryCache, QueryFn, QueryState, QueryStatus};
