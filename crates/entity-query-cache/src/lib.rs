//! Entity query cache.
//!
//! Fetched entities are held under composite [`QueryKey`]s. Concurrent reads
//! of the same key share one fetch, fresh entries are served without touching
//! the network, and [`QueryCache::invalidate`] marks entries so the next read
//! refetches. Mutations call `invalidate` after the remote write succeeds.
//!
//! Fetches run as detached tokio tasks: a caller that goes away before the
//! result arrives only drops its own handle, the entry is still filled.

mod cache;
mod error;
mod key;

pub use cache::{CacheEvent, QueryCache, QueryOptions, QuerySnapshot};
pub use error::{QueryError, QueryResult};
pub use key::{KeyFilter, QueryKey};
