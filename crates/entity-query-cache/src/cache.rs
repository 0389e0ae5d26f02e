use crate::{KeyFilter, QueryError, QueryKey, QueryResult};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

type Value = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<Value, QueryError>>>;

const EVENT_CAPACITY: usize = 256;

/// Per-read freshness settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a successful result is served without refetching. `None`
    /// keeps it fresh until invalidated.
    pub stale_time: Option<Duration>,
}

impl QueryOptions {
    pub fn stale_after(stale_time: Duration) -> Self {
        Self {
            stale_time: Some(stale_time),
        }
    }
}

/// Change notifications for views that re-render on cache updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Updated(QueryKey),
    Failed(QueryKey),
    Invalidated(QueryKey),
    Removed(QueryKey),
}

/// Point-in-time view of one entry.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
    pub data: Option<T>,
    pub error: Option<QueryError>,
    /// A fetch is running and there is no data to show yet.
    pub is_loading: bool,
    pub is_fetching: bool,
    pub is_stale: bool,
}

impl<T> Default for QuerySnapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            is_fetching: false,
            is_stale: true,
        }
    }
}

struct InFlight {
    id: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct Entry {
    data: Option<Value>,
    error: Option<QueryError>,
    updated_at: Option<Instant>,
    invalidated: bool,
    inflight: Option<InFlight>,
}

impl Entry {
    fn is_fresh(&self, stale_time: Option<Duration>) -> bool {
        if self.invalidated || self.error.is_some() || self.data.is_none() {
            return false;
        }
        match (stale_time, self.updated_at) {
            (None, _) => true,
            (Some(ttl), Some(at)) => at.elapsed() < ttl,
            (Some(_), None) => false,
        }
    }
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    events: broadcast::Sender<CacheEvent>,
    next_fetch_id: AtomicU64,
}

impl Inner {
    /// Record a finished fetch, unless it was superseded by an invalidation,
    /// a direct write or a removal while it ran.
    fn settle(&self, key: &QueryKey, id: u64, result: &Result<Value, QueryError>) {
        let event = {
            let mut entries = self.entries.lock();
            let Some(entry) = entries.get_mut(key) else {
                trace!(%key, "Dropping result for removed entry");
                return;
            };
            if entry.inflight.as_ref().map(|f| f.id) != Some(id) {
                debug!(%key, "Discarding superseded fetch result");
                return;
            }
            entry.inflight = None;
            entry.invalidated = false;
            match result {
                Ok(value) => {
                    entry.data = Some(value.clone());
                    entry.error = None;
                    entry.updated_at = Some(Instant::now());
                    CacheEvent::Updated(key.clone())
                }
                Err(e) => {
                    warn!(%key, error = %e, "Query failed");
                    entry.error = Some(e.clone());
                    CacheEvent::Failed(key.clone())
                }
            }
        };
        let _ = self.events.send(event);
    }

    fn emit(&self, event: CacheEvent) {
        let _ = self.events.send(event);
    }
}

/// Shared cache handle. Clones refer to the same entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                events,
                next_fetch_id: AtomicU64::new(1),
            }),
        }
    }

    /// Read `key`, fetching only when there is no fresh entry.
    ///
    /// Concurrent calls for the same key share a single fetch. A failed
    /// fetch is cached and returned as-is until the key is invalidated.
    /// Must be called from within a tokio runtime.
    pub async fn query<T, F, Fut, E>(
        &self,
        key: &QueryKey,
        options: QueryOptions,
        fetch: F,
    ) -> QueryResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: StdError + Send + Sync + 'static,
    {
        let pending = {
            let mut entries = self.inner.entries.lock();
            let entry = entries.entry(key.clone()).or_default();

            if entry.is_fresh(options.stale_time) {
                if let Some(value) = &entry.data {
                    trace!(%key, "Cache hit");
                    return downcast(key, value);
                }
            }

            match &entry.inflight {
                Some(inflight) => {
                    trace!(%key, "Joining in-flight fetch");
                    inflight.fetch.clone()
                }
                None => {
                    if !entry.invalidated {
                        if let Some(error) = &entry.error {
                            return Err(error.clone());
                        }
                    }
                    let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                    let fetch = self.start_fetch(key.clone(), id, fetch);
                    entry.inflight = Some(InFlight {
                        id,
                        fetch: fetch.clone(),
                    });
                    fetch
                }
            }
        };

        let value = pending.await?;
        downcast(key, &value)
    }

    fn start_fetch<T, F, Fut, E>(&self, key: QueryKey, id: u64, fetch: F) -> SharedFetch
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: StdError + Send + Sync + 'static,
    {
        let inner = self.inner.clone();
        let shared = async move {
            debug!(%key, "Fetching");
            let result = match fetch().await {
                Ok(value) => Ok(Arc::new(value) as Value),
                Err(e) => Err(QueryError::Fetch {
                    key: key.to_string(),
                    source: Arc::new(e),
                }),
            };
            inner.settle(&key, id, &result);
            result
        }
        .boxed()
        .shared();

        tokio::spawn(shared.clone());
        shared
    }

    /// Current state of `key` without fetching.
    pub fn peek<T>(&self, key: &QueryKey, options: QueryOptions) -> QueryResult<QuerySnapshot<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.inner.entries.lock();
        let Some(entry) = entries.get(key) else {
            return Ok(QuerySnapshot::default());
        };
        let data = match &entry.data {
            Some(value) => Some(downcast::<T>(key, value)?),
            None => None,
        };
        Ok(QuerySnapshot {
            is_loading: entry.inflight.is_some() && data.is_none(),
            is_fetching: entry.inflight.is_some(),
            is_stale: !entry.is_fresh(options.stale_time),
            error: entry.error.clone(),
            data,
        })
    }

    /// Mark every matching entry stale. In-flight fetches for those keys are
    /// detached so the next read starts over. Returns how many entries matched.
    ///
    /// A predicate filter runs under the cache lock and must not call back
    /// into the cache.
    pub fn invalidate(&self, filter: &KeyFilter) -> usize {
        let touched: Vec<QueryKey> = {
            let mut entries = self.inner.entries.lock();
            entries
                .iter_mut()
                .filter(|(key, _)| filter.matches(key))
                .map(|(key, entry)| {
                    entry.invalidated = true;
                    entry.inflight = None;
                    key.clone()
                })
                .collect()
        };

        debug!(?filter, count = touched.len(), "Invalidated queries");
        for key in &touched {
            self.inner.emit(CacheEvent::Invalidated(key.clone()));
        }
        touched.len()
    }

    /// Write a value directly, as if a fetch had just returned it.
    pub fn set_data<T>(&self, key: &QueryKey, value: T)
    where
        T: Send + Sync + 'static,
    {
        {
            let mut entries = self.inner.entries.lock();
            let entry = entries.entry(key.clone()).or_default();
            entry.data = Some(Arc::new(value));
            entry.error = None;
            entry.invalidated = false;
            entry.inflight = None;
            entry.updated_at = Some(Instant::now());
        }
        self.inner.emit(CacheEvent::Updated(key.clone()));
    }

    pub fn remove(&self, key: &QueryKey) -> bool {
        let removed = self.inner.entries.lock().remove(key).is_some();
        if removed {
            self.inner.emit(CacheEvent::Removed(key.clone()));
        }
        removed
    }

    /// Drop every entry. Used on sign-out.
    pub fn clear(&self) -> usize {
        let keys: Vec<QueryKey> = self.inner.entries.lock().drain().map(|(k, _)| k).collect();
        for key in &keys {
            self.inner.emit(CacheEvent::Removed(key.clone()));
        }
        debug!(count = keys.len(), "Cleared query cache");
        keys.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.inner.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn downcast<T: Clone + 'static>(key: &QueryKey, value: &Value) -> QueryResult<T> {
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| QueryError::TypeMismatch {
            key: key.to_string(),
            expected: type_name::<T>(),
        })
}
