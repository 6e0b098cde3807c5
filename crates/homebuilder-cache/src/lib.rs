//! Cache Store
//!
//! Three independent namespaces behind one store:
//! - a general TTL cache (5 minutes by default, memory only)
//! - a metadata TTL cache (30 minutes by default, persisted)
//! - a bounded FIFO set of image identifiers already seen (persisted)
//!
//! Expired entries are evicted lazily on read and proactively by
//! [`CacheStore::cleanup`].

mod clock;
mod entry;
mod images;
mod store;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, TtlMap};
pub use images::ImageSeenSet;
pub use store::{persisted_projection, CacheStore, PersistedCache, CACHE_STORAGE_KEY};
pub use types::{CacheConfig, CacheStats, CleanupReport};
