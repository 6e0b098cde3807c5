//! The cache store service object

use crate::clock::{Clock, SystemClock};
use crate::entry::{CacheEntry, TtlMap};
use crate::images::ImageSeenSet;
use crate::types::{
    CacheConfig, CacheStats, CleanupReport, DEFAULT_GENERAL_TTL, DEFAULT_METADATA_TTL,
};
use homebuilder_storage::{load_state, save_state, KeyValueStorage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

/// Storage slot for the persisted projection
pub const CACHE_STORAGE_KEY: &str = "cache-storage";

/// The persisted subset of cache state. The general namespace is never
/// included, so stale cross-session data cannot come back from storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCache {
    #[serde(default)]
    pub metadata_cache: HashMap<String, CacheEntry<Value>>,
    #[serde(default)]
    pub image_cache: Vec<String>,
}

/// Project the metadata namespace and image set into their persisted form
pub fn persisted_projection(metadata: &TtlMap<Value>, images: &ImageSeenSet) -> PersistedCache {
    PersistedCache {
        metadata_cache: metadata.entries().clone(),
        image_cache: images.iter().map(str::to_string).collect(),
    }
}

struct CacheState {
    general: TtlMap<Value>,
    metadata: TtlMap<Value>,
    images: ImageSeenSet,
}

impl CacheState {
    fn empty(config: &CacheConfig) -> Self {
        Self {
            general: TtlMap::new(config.general_ttl, DEFAULT_GENERAL_TTL),
            metadata: TtlMap::new(config.metadata_ttl, DEFAULT_METADATA_TTL),
            images: ImageSeenSet::new(config.image_capacity),
        }
    }
}

/// Expiring key/value memoization with general, metadata and image namespaces
pub struct CacheStore {
    state: Mutex<CacheState>,
    storage: Option<Arc<dyn KeyValueStorage>>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStore {
    /// Memory-only store on the wall clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Memory-only store on a custom clock
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState::empty(&config)),
            storage: None,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Rehydrate the persisted namespaces from `storage` and write through to
    /// it on every later change
    pub fn restore(
        storage: Arc<dyn KeyValueStorage>,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut state = CacheState::empty(&config);
        if let Some(persisted) = load_state::<PersistedCache>(storage.as_ref(), CACHE_STORAGE_KEY) {
            debug!(
                metadata = persisted.metadata_cache.len(),
                images = persisted.image_cache.len(),
                "Restored cache state"
            );
            state.metadata.replace_entries(persisted.metadata_cache);
            state.images = ImageSeenSet::from_ids(persisted.image_cache, config.image_capacity);
        }

        Self {
            state: Mutex::new(state),
            storage: Some(storage),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Drop entries that expired while the store was offline
    pub fn init(&self) -> CleanupReport {
        let report = self.cleanup();
        let stats = self.stats();
        info!(
            metadata = stats.metadata_entries,
            images = stats.images_seen,
            swept = report.total(),
            "Cache store initialized"
        );
        report
    }

    /// Flush the persisted projection one last time
    pub fn dispose(&self) {
        let state = self.lock();
        self.persist(&state);
        debug!("Cache store disposed");
    }

    // General namespace

    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Option<Duration>) {
        let now = self.clock.now();
        self.lock().general.insert(key, value, ttl, now);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let value = self.lock().general.get(key, now).cloned();
        self.record(value.is_some());
        value
    }

    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.lock().general.contains(key, now)
    }

    pub fn remove(&self, key: &str) {
        self.lock().general.remove(key);
    }

    // Metadata namespace

    pub fn set_metadata(&self, key: impl Into<String>, value: Value, ttl: Option<Duration>) {
        let now = self.clock.now();
        let mut state = self.lock();
        state.metadata.insert(key, value, ttl, now);
        self.persist(&state);
    }

    pub fn get_metadata(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let mut state = self.lock();
        let before = state.metadata.len();
        let value = state.metadata.get(key, now).cloned();
        if state.metadata.len() != before {
            self.persist(&state);
        }
        drop(state);
        self.record(value.is_some());
        value
    }

    pub fn has_metadata(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut state = self.lock();
        let before = state.metadata.len();
        let present = state.metadata.contains(key, now);
        if state.metadata.len() != before {
            self.persist(&state);
        }
        present
    }

    pub fn remove_metadata(&self, key: &str) {
        let mut state = self.lock();
        if state.metadata.remove(key) {
            self.persist(&state);
        }
    }

    // Image-seen set

    pub fn add_image_to_cache(&self, id: impl Into<String>) {
        let mut state = self.lock();
        if state.images.insert(id) {
            self.persist(&state);
        }
    }

    pub fn is_image_cached(&self, id: &str) -> bool {
        self.lock().images.contains(id)
    }

    // Whole-store operations

    /// Empty every namespace
    pub fn clear(&self) {
        let mut state = self.lock();
        state.general.clear();
        state.metadata.clear();
        state.images.clear();
        self.persist(&state);
        info!("Cache cleared");
    }

    /// Sweep expired entries from the general and metadata namespaces
    pub fn cleanup(&self) -> CleanupReport {
        let now = self.clock.now();
        let mut state = self.lock();
        let report = CleanupReport {
            general_removed: state.general.sweep(now),
            metadata_removed: state.metadata.sweep(now),
        };
        if report.metadata_removed > 0 {
            self.persist(&state);
        }
        if report.total() > 0 {
            debug!(
                general = report.general_removed,
                metadata = report.metadata_removed,
                "Swept expired cache entries"
            );
        }
        report
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            general_entries: state.general.len(),
            metadata_entries: state.metadata.len(),
            images_seen: state.images.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Current persisted projection
    pub fn projection(&self) -> PersistedCache {
        let state = self.lock();
        persisted_projection(&state.metadata, &state.images)
    }

    /// Insert raw entries into the general and metadata namespaces without
    /// applying TTL defaults or expiry checks
    pub fn insert_raw(
        &self,
        general: impl IntoIterator<Item = (String, CacheEntry<Value>)>,
        metadata: impl IntoIterator<Item = (String, CacheEntry<Value>)>,
    ) {
        let mut state = self.lock();
        for (key, entry) in general {
            state.general.insert_entry(key, entry);
        }
        for (key, entry) in metadata {
            state.metadata.insert_entry(key, entry);
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    // Called with the state lock held so writes land in mutation order
    fn persist(&self, state: &CacheState) {
        if let Some(storage) = &self.storage {
            let projection = persisted_projection(&state.metadata, &state.images);
            save_state(storage.as_ref(), CACHE_STORAGE_KEY, &projection);
        }
    }
}
