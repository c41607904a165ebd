//! Query cache with request deduplication and invalidation-driven refetch
//!
//! Each key owns an entry holding the registered query, a generation counter,
//! the in-flight request (if any) and a `watch` channel carrying the current
//! [`QueryState`]. Invalidation bumps the generation: results of requests
//! started before the bump are handed to their callers but never stored.

use super::QueryKey;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Query function registered against a key
pub type QueryFn<V, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<V, E>> + Send + Sync>;

type QueryResult<V, E> = Result<Arc<V>, Arc<E>>;
type SharedFetch<V, E> = Shared<BoxFuture<'static, QueryResult<V, E>>>;
type EntryMap<V, E> = Mutex<HashMap<QueryKey, Entry<V, E>>>;

/// Outcome of the last settled request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    /// Never settled
    #[default]
    Idle,
    Success,
    Error,
}

/// Observable state of one cache entry
#[derive(Debug)]
pub struct QueryState<V, E> {
    pub status: QueryStatus,
    /// Last successful result, kept across later errors
    pub data: Option<Arc<V>>,
    /// Error of the last request, cleared by the next success
    pub error: Option<Arc<E>>,
    pub is_fetching: bool,
    /// Set by invalidation until the next result is stored
    pub is_stale: bool,
    /// Generation the stored result belongs to
    pub generation: u64,
    pub updated_at: Option<Instant>,
}

impl<V, E> QueryState<V, E> {
    /// Fetching with nothing to show yet
    pub fn is_loading(&self) -> bool {
        self.is_fetching && self.data.is_none()
    }
}

impl<V, E> Default for QueryState<V, E> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_fetching: false,
            is_stale: false,
            generation: 0,
            updated_at: None,
        }
    }
}

impl<V, E> Clone for QueryState<V, E> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.is_fetching,
            is_stale: self.is_stale,
            generation: self.generation,
            updated_at: self.updated_at,
        }
    }
}

struct Entry<V, E> {
    query: Option<QueryFn<V, E>>,
    generation: u64,
    in_flight: Option<(u64, SharedFetch<V, E>)>,
    state: watch::Sender<QueryState<V, E>>,
}

impl<V, E> Entry<V, E> {
    fn new() -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            query: None,
            generation: 0,
            in_flight: None,
            state,
        }
    }

    /// Stored data, if it belongs to the current generation and is younger than `stale_time`
    fn fresh_data(&self, stale_time: Duration) -> Option<Arc<V>> {
        let state = self.state.borrow();
        if state.is_stale || state.generation != self.generation {
            return None;
        }
        let updated_at = state.updated_at?;
        if updated_at.elapsed() >= stale_time {
            return None;
        }
        state.data.clone()
    }

    fn is_fresh(&self, stale_time: Duration) -> bool {
        self.fresh_data(stale_time).is_some()
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Entries whose data can be served without a request
    pub fresh_entries: usize,
    /// Entries with a request in flight
    pub fetching_entries: usize,
}

/// Keyed query cache
///
/// Values and errors are shared as `Arc`s, so neither needs to be `Clone`.
pub struct QueryCache<V, E> {
    entries: Arc<EntryMap<V, E>>,
    stale_time: Duration,
}

fn lock<V, E>(entries: &EntryMap<V, E>) -> MutexGuard<'_, HashMap<QueryKey, Entry<V, E>>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Join the in-flight request of the current generation, or start a new one
fn start_fetch<V, E>(
    entries: &Arc<EntryMap<V, E>>,
    key: &QueryKey,
    entry: &mut Entry<V, E>,
    query: QueryFn<V, E>,
) -> SharedFetch<V, E>
where
    V: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    if let Some((generation, pending)) = &entry.in_flight {
        if *generation == entry.generation {
            tracing::trace!("Joining in-flight request for {}", key);
            return pending.clone();
        }
    }

    let generation = entry.generation;
    tracing::debug!("Fetching {} (generation {})", key, generation);
    entry.state.send_modify(|state| state.is_fetching = true);

    let entries = Arc::downgrade(entries);
    let key = key.clone();
    let pending = async move {
        let result = query().await.map(Arc::new).map_err(Arc::new);
        settle(&entries, &key, generation, &result);
        result
    }
    .boxed()
    .shared();

    entry.in_flight = Some((generation, pending.clone()));
    pending
}

/// Record the result of a request started at `generation`
fn settle<V, E>(
    entries: &Weak<EntryMap<V, E>>,
    key: &QueryKey,
    generation: u64,
    result: &QueryResult<V, E>,
) {
    let Some(entries) = entries.upgrade() else {
        return;
    };
    let mut entries = lock(&entries);
    let Some(entry) = entries.get_mut(key) else {
        return;
    };

    if matches!(&entry.in_flight, Some((g, _)) if *g == generation) {
        entry.in_flight = None;
    }
    let superseded = entry.generation != generation;
    let still_fetching = entry.in_flight.is_some();

    if superseded {
        tracing::debug!(
            "Discarding result for {} (generation {} superseded by {})",
            key,
            generation,
            entry.generation
        );
    }

    entry.state.send_modify(|state| {
        state.is_fetching = still_fetching;
        if superseded {
            return;
        }
        match result {
            Ok(data) => {
                state.status = QueryStatus::Success;
                state.data = Some(Arc::clone(data));
                state.error = None;
                state.is_stale = false;
                state.updated_at = Some(Instant::now());
            }
            Err(error) => {
                state.status = QueryStatus::Error;
                state.error = Some(Arc::clone(error));
            }
        }
        state.generation = generation;
    });
}

/// Drive requests to completion in the background
fn spawn_all<V, E>(pending: Vec<SharedFetch<V, E>>)
where
    V: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    if pending.is_empty() {
        return;
    }
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            for fetch in pending {
                handle.spawn(async move {
                    let _ = fetch.await;
                });
            }
        }
        Err(_) => {
            // The request stays registered and runs when the next caller awaits it
            tracing::debug!("No async runtime, deferring {} refetch(es)", pending.len());
        }
    }
}

impl<V, E> QueryCache<V, E>
where
    V: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a cache; results younger than `stale_time` are served without a request
    pub fn new(stale_time: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            stale_time,
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Fetch the value for `key`, registering `query` against it
    ///
    /// Serves fresh data from the cache and joins a request already in flight
    /// for the current generation, so concurrent callers run `query` once.
    pub async fn fetch<F>(&self, key: &QueryKey, query: F) -> QueryResult<V, E>
    where
        F: Fn() -> BoxFuture<'static, Result<V, E>> + Send + Sync + 'static,
    {
        let pending = {
            let mut entries = lock(&self.entries);
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            let query: QueryFn<V, E> = Arc::new(query);
            entry.query = Some(Arc::clone(&query));

            if let Some(data) = entry.fresh_data(self.stale_time) {
                tracing::trace!("Cache hit for {}", key);
                return Ok(data);
            }
            start_fetch(&self.entries, key, entry, query)
        };

        pending.await
    }

    /// Register `query`, subscribe to the key and start a background fetch if needed
    pub fn watch<F>(&self, key: &QueryKey, query: F) -> watch::Receiver<QueryState<V, E>>
    where
        F: Fn() -> BoxFuture<'static, Result<V, E>> + Send + Sync + 'static,
    {
        let (receiver, pending) = {
            let mut entries = lock(&self.entries);
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            let query: QueryFn<V, E> = Arc::new(query);
            entry.query = Some(Arc::clone(&query));

            let receiver = entry.state.subscribe();
            let pending = if entry.is_fresh(self.stale_time) {
                Vec::new()
            } else {
                vec![start_fetch(&self.entries, key, entry, query)]
            };
            (receiver, pending)
        };

        spawn_all(pending);
        receiver
    }

    /// Subscribe to state changes of a key without registering a query
    pub fn subscribe(&self, key: &QueryKey) -> watch::Receiver<QueryState<V, E>> {
        let mut entries = lock(&self.entries);
        entries
            .entry(key.clone())
            .or_insert_with(Entry::new)
            .state
            .subscribe()
    }

    /// Invalidate every key starting with `prefix`
    ///
    /// Stored data is kept but marked stale. Keys with live subscribers and a
    /// registered query are refetched right away. Returns the number of keys
    /// invalidated.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut refetches = Vec::new();
        let mut count = 0;
        {
            let mut entries = lock(&self.entries);
            for (key, entry) in entries.iter_mut() {
                if !key.starts_with(prefix) {
                    continue;
                }
                entry.generation += 1;
                entry.state.send_modify(|state| state.is_stale = true);
                count += 1;

                if entry.state.receiver_count() > 0 {
                    if let Some(query) = entry.query.clone() {
                        refetches.push(start_fetch(&self.entries, key, entry, query));
                    }
                }
            }
        }

        tracing::debug!(
            "Invalidated {} key(s) under {}, {} refetch(es)",
            count,
            prefix,
            refetches.len()
        );
        spawn_all(refetches);
        count
    }

    /// Refetch `key` in the background without superseding a request in flight
    ///
    /// Joins the request of the current generation when there is one, so a
    /// refresh period shorter than the query never starves subscribers.
    /// Returns `false` when no query is registered for the key.
    pub fn refetch(&self, key: &QueryKey) -> bool {
        let pending = {
            let mut entries = lock(&self.entries);
            let Some(entry) = entries.get_mut(key) else {
                return false;
            };
            let Some(query) = entry.query.clone() else {
                return false;
            };
            start_fetch(&self.entries, key, entry, query)
        };

        spawn_all(vec![pending]);
        true
    }

    /// Last stored data for a key, fresh or not
    pub fn get(&self, key: &QueryKey) -> Option<Arc<V>> {
        let entries = lock(&self.entries);
        entries
            .get(key)
            .and_then(|entry| entry.state.borrow().data.clone())
    }

    /// Snapshot of the state of a key
    pub fn state(&self, key: &QueryKey) -> Option<QueryState<V, E>> {
        let entries = lock(&self.entries);
        entries.get(key).map(|entry| entry.state.borrow().clone())
    }

    /// Drop a key; its subscribers observe a closed channel
    pub fn remove(&self, key: &QueryKey) -> bool {
        lock(&self.entries).remove(key).is_some()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = lock(&self.entries);
        CacheStats {
            total_entries: entries.len(),
            fresh_entries: entries
                .values()
                .filter(|entry| entry.is_fresh(self.stale_time))
                .count(),
            fetching_entries: entries
                .values()
                .filter(|entry| entry.in_flight.is_some())
                .count(),
        }
    }
}
