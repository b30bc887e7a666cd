//! Entity Cache Module
//!
//! Capacity-bounded LRU cache with lazy TTL expiry and an optional durable
//! backing store.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, DeletePolicy, DurableStore, Entity, LruTracker};
use crate::error::StoreError;

// == Cache Config ==
/// Sizing and durable-store settings for an [`EntityCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of in-memory entries
    pub max_entries: usize,
    /// Age at which an entry stops being served
    pub ttl: Duration,
    /// Upper bound on any single durable-store call
    pub durable_timeout: Duration,
    /// Whether invalidation reaches the durable store
    pub delete_policy: DeletePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            ttl: Duration::from_secs(24 * 60 * 60),
            durable_timeout: Duration::from_millis(500),
            delete_policy: DeletePolicy::Retain,
        }
    }
}

// == Cache State ==
#[derive(Debug)]
struct CacheState<E> {
    entries: HashMap<String, CacheEntry<E>>,
    lru: LruTracker,
    stats: CacheStats,
}

impl<E: Entity> CacheState<E> {
    /// Returns the fresh entity under `id`, dropping it if expired.
    fn lookup(&mut self, id: &str, ttl: Duration) -> Option<E> {
        let expired = self.entries.get(id)?.is_expired(ttl);
        if expired {
            self.drop_entry(id);
            self.stats.record_expirations(1);
            return None;
        }

        self.lru.touch(id);
        self.entries.get(id).map(|entry| entry.value.clone())
    }

    /// Inserts or replaces, evicting the LRU entry first when full.
    fn insert(&mut self, entity: E, max_entries: usize) {
        let id = entity.id().to_string();

        if !self.entries.contains_key(&id) && self.entries.len() >= max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
                debug!("Evicted least recently used entry {}", evicted);
            }
        }

        self.entries.insert(id.clone(), CacheEntry::new(entity));
        self.lru.touch(&id);
        self.stats.set_total_entries(self.entries.len());
    }

    fn drop_entry(&mut self, id: &str) -> bool {
        let removed = self.entries.remove(id).is_some();
        self.lru.remove(id);
        self.stats.set_total_entries(self.entries.len());
        removed
    }
}

// == In-flight Loads ==
#[derive(Debug)]
struct InFlight {
    loaders: usize,
    generation: u64,
}

/// Durable loads in progress, keyed by id.
///
/// `set`, `delete` and `clear` bump the generation of any load in flight
/// for the ids they touch; a load whose generation moved is not
/// re-populated. Only ids with a pending load have an entry.
#[derive(Debug, Default)]
struct LoadRegistry {
    loads: StdMutex<HashMap<String, InFlight>>,
}

impl LoadRegistry {
    fn map(&self) -> MutexGuard<'_, HashMap<String, InFlight>> {
        self.loads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, id: &str) -> LoadTicket<'_> {
        let mut loads = self.map();
        let in_flight = loads.entry(id.to_string()).or_insert(InFlight {
            loaders: 0,
            generation: 0,
        });
        in_flight.loaders += 1;

        LoadTicket {
            registry: self,
            id: id.to_string(),
            generation: in_flight.generation,
        }
    }

    fn invalidate(&self, id: &str) {
        if let Some(in_flight) = self.map().get_mut(id) {
            in_flight.generation += 1;
        }
    }

    fn invalidate_all(&self) {
        for in_flight in self.map().values_mut() {
            in_flight.generation += 1;
        }
    }
}

/// Registration of one pending load. Dropping it, even when the `get`
/// future is cancelled mid-load, releases the registry entry.
struct LoadTicket<'a> {
    registry: &'a LoadRegistry,
    id: String,
    generation: u64,
}

impl LoadTicket<'_> {
    /// Whether no write or invalidation for this id happened since `begin`.
    fn is_current(&self) -> bool {
        self.registry
            .map()
            .get(&self.id)
            .is_some_and(|in_flight| in_flight.generation == self.generation)
    }
}

impl Drop for LoadTicket<'_> {
    fn drop(&mut self) {
        let mut loads = self.registry.map();
        let finished = match loads.get_mut(&self.id) {
            Some(in_flight) => {
                in_flight.loaders -= 1;
                in_flight.loaders == 0
            }
            None => false,
        };
        if finished {
            loads.remove(&self.id);
        }
    }
}

// == Entity Cache ==
/// Bounded cache of entities keyed by their own id.
///
/// In-memory state sits behind one mutex covering the map, the recency
/// order and the stats, so evict-then-insert is atomic. The lock is never
/// held across a durable-store call.
pub struct EntityCache<E: Entity> {
    state: Mutex<CacheState<E>>,
    loads: LoadRegistry,
    durable: Option<Arc<dyn DurableStore<E>>>,
    config: CacheConfig,
}

impl<E: Entity> EntityCache<E> {
    // == Constructor ==
    /// Creates a purely in-memory cache.
    ///
    /// # Panics
    /// If `config.max_entries` is zero.
    pub fn new(config: CacheConfig) -> Self {
        assert!(config.max_entries > 0, "cache capacity must be positive");
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                stats: CacheStats::new(),
            }),
            loads: LoadRegistry::default(),
            durable: None,
            config,
        }
    }

    /// Creates a cache backed by `durable`.
    pub fn with_durable(config: CacheConfig, durable: Arc<dyn DurableStore<E>>) -> Self {
        let mut cache = Self::new(config);
        cache.durable = Some(durable);
        cache
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Get ==
    /// Returns the cached entity for `id`.
    ///
    /// On an in-memory miss the durable store (if any) is consulted and a
    /// found entity is re-populated into memory. Durable faults and timeouts
    /// count as a miss.
    ///
    /// A `set`, `delete` or `clear` that lands while the load is in flight
    /// wins: the loaded copy is then discarded and the current in-memory
    /// state is served instead.
    pub async fn get(&self, id: &str) -> Option<E> {
        let ticket = {
            let mut state = self.state.lock().await;
            if let Some(entity) = state.lookup(id, self.config.ttl) {
                state.stats.record_hit();
                return Some(entity);
            }
            if self.durable.is_none() {
                state.stats.record_miss();
                return None;
            }
            self.loads.begin(id)
        };

        let loaded = match &self.durable {
            Some(durable) => self.bounded("load", id, durable.load(id)).await.flatten(),
            None => None,
        };

        let mut state = self.state.lock().await;
        if let Some(entity) = state.lookup(id, self.config.ttl) {
            state.stats.record_hit();
            return Some(entity);
        }

        match loaded {
            Some(entity) if ticket.is_current() => {
                state.insert(entity.clone(), self.config.max_entries);
                state.stats.record_durable_hit();
                state.stats.record_hit();
                debug!("Re-populated {} from durable store", id);
                Some(entity)
            }
            Some(_) => {
                debug!("Discarded durable copy of {}, invalidated during load", id);
                state.stats.record_miss();
                None
            }
            None => {
                state.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Inserts or replaces `entity` under its own id, then writes it through
    /// to the durable store. A durable failure is logged and otherwise ignored.
    pub async fn set(&self, entity: E) {
        let durable_copy = self.durable.as_ref().map(|_| entity.clone());

        {
            let mut state = self.state.lock().await;
            self.loads.invalidate(entity.id());
            state.insert(entity, self.config.max_entries);
        }

        if let (Some(durable), Some(entity)) = (&self.durable, durable_copy) {
            self.bounded("save", entity.id(), durable.save(&entity)).await;
        }
    }

    // == Has ==
    /// Whether a fresh entry for `id` is in memory. Does not bump recency.
    pub async fn has(&self, id: &str) -> bool {
        let mut state = self.state.lock().await;
        let expired = match state.entries.get(id) {
            Some(entry) => entry.is_expired(self.config.ttl),
            None => return false,
        };
        if expired {
            state.drop_entry(id);
            state.stats.record_expirations(1);
        }
        !expired
    }

    // == Delete ==
    /// Invalidates `id`. Returns whether an in-memory entry was removed.
    pub async fn delete(&self, id: &str) -> bool {
        let removed = {
            let mut state = self.state.lock().await;
            self.loads.invalidate(id);
            state.drop_entry(id)
        };

        if self.config.delete_policy == DeletePolicy::Propagate {
            if let Some(durable) = &self.durable {
                self.bounded("remove", id, durable.remove(id)).await;
            }
        }
        removed
    }

    // == Clear ==
    pub async fn clear(&self) {
        {
            let mut state = self.state.lock().await;
            self.loads.invalidate_all();
            state.entries.clear();
            state.lru.clear();
            state.stats.set_total_entries(0);
        }

        if self.config.delete_policy == DeletePolicy::Propagate {
            if let Some(durable) = &self.durable {
                self.bounded("clear", "*", durable.clear()).await;
            }
        }
    }

    // == Batch Operations ==
    /// Looks up each id in turn; the result order matches `ids`.
    pub async fn get_multiple<S: AsRef<str>>(&self, ids: &[S]) -> Vec<Option<E>> {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            results.push(self.get(id.as_ref()).await);
        }
        results
    }

    pub async fn set_multiple(&self, entities: impl IntoIterator<Item = E>) {
        for entity in entities {
            self.set(entity).await;
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired in-memory entries. Returns the number removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut state = self.state.lock().await;
        let ttl = self.config.ttl;
        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(ttl))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            state.drop_entry(id);
        }
        state.stats.record_expirations(expired.len());
        expired.len()
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.entries.len());
        stats
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Runs one durable call under the configured timeout.
    ///
    /// Returns `None` on failure or timeout after logging and counting it.
    async fn bounded<T>(
        &self,
        op: &str,
        id: &str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Option<T> {
        let timeout = self.config.durable_timeout;
        let outcome = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(timeout.as_millis())),
        };

        match outcome {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Durable store {} failed for {}: {}", op, id, err);
                self.state.lock().await.stats.record_durable_error();
                None
            }
        }
    }
}
