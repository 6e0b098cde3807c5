//! Cache configuration and reporting types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default TTL for the general namespace
pub const DEFAULT_GENERAL_TTL: Duration = Duration::from_secs(5 * 60);
/// Default TTL for the metadata namespace
pub const DEFAULT_METADATA_TTL: Duration = Duration::from_secs(30 * 60);
/// Most recent image identifiers retained
pub const DEFAULT_IMAGE_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub general_ttl: Duration,
    pub metadata_ttl: Duration,
    pub image_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            general_ttl: DEFAULT_GENERAL_TTL,
            metadata_ttl: DEFAULT_METADATA_TTL,
            image_capacity: DEFAULT_IMAGE_CAPACITY,
        }
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub general_entries: usize,
    pub metadata_entries: usize,
    pub images_seen: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Result of a [`crate::CacheStore::cleanup`] sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub general_removed: usize,
    pub metadata_removed: usize,
}

impl CleanupReport {
    pub fn total(&self) -> usize {
        self.general_removed + self.metadata_removed
    }
}
