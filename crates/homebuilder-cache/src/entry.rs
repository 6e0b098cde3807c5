//! Expiring entries and the map that holds them

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A cached value with its insertion and expiry timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub value: T,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Logically absent once `now` is strictly past `expires_at`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// String-keyed map of expiring entries with a namespace default TTL
#[derive(Debug, Clone)]
pub struct TtlMap<V> {
    entries: HashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<V> TtlMap<V> {
    /// A zero or unrepresentable `default_ttl` is replaced by `fallback_ttl`
    pub fn new(default_ttl: std::time::Duration, fallback_ttl: std::time::Duration) -> Self {
        let default_ttl = to_chrono(default_ttl)
            .or_else(|| to_chrono(fallback_ttl))
            .unwrap_or_else(|| Duration::minutes(5));
        Self {
            entries: HashMap::new(),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store `value`, replacing any previous entry for `key`.
    ///
    /// A missing, zero or unrepresentable TTL falls back to the namespace default
    /// so that `expires_at > created_at` always holds. Expiry times past
    /// [`latest_expiry`] are clamped to it.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: V,
        ttl: Option<std::time::Duration>,
        now: DateTime<Utc>,
    ) {
        let ttl = ttl.and_then(to_chrono).unwrap_or(self.default_ttl);
        let entry = CacheEntry {
            value,
            created_at: now,
            expires_at: now
                .checked_add_signed(ttl)
                .map_or(latest_expiry(), |at| at.min(latest_expiry())),
        };
        self.entries.insert(key.into(), entry);
    }

    /// Insert a prebuilt entry as-is, bypassing TTL defaults
    pub fn insert_entry(&mut self, key: impl Into<String>, entry: CacheEntry<V>) {
        self.entries.insert(key.into(), entry);
    }

    /// Value for `key` if present and unexpired. Expired entries are evicted.
    pub fn get(&mut self, key: &str, now: DateTime<Utc>) -> Option<&V> {
        if self.evict_if_expired(key, now) {
            return None;
        }
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Same expiry check as [`TtlMap::get`], without returning the value
    pub fn contains(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        !self.evict_if_expired(key, now) && self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw entries, expired ones included
    pub fn entries(&self) -> &HashMap<String, CacheEntry<V>> {
        &self.entries
    }

    pub fn replace_entries(&mut self, entries: HashMap<String, CacheEntry<V>>) {
        self.entries = entries;
    }

    fn evict_if_expired(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(now));
        if expired {
            self.entries.remove(key);
            debug!(key, "Evicted expired cache entry");
        }
        expired
    }
}

/// 9999-12-31T23:59:59Z, the last instant with a four-digit RFC 3339 year
fn latest_expiry() -> DateTime<Utc> {
    DateTime::from_timestamp(253_402_300_799, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn to_chrono(ttl: std::time::Duration) -> Option<Duration> {
    if ttl.is_zero() {
        return None;
    }
    Duration::from_std(ttl).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn map() -> TtlMap<String> {
        TtlMap::new(StdDuration::from_secs(300), StdDuration::from_secs(300))
    }

    #[test]
    fn test_get_before_and_after_expiry() {
        let mut m = map();
        let now = Utc::now();
        m.insert("k", "v".to_string(), Some(StdDuration::from_millis(1000)), now);

        assert_eq!(m.get("k", now).map(String::as_str), Some("v"));
        // Exactly at expires_at is still live
        assert!(m.contains("k", now + Duration::milliseconds(1000)));

        let later = now + Duration::milliseconds(1001);
        assert_eq!(m.get("k", later), None);
        assert!(m.is_empty(), "expired entry should be evicted on read");
    }

    #[test]
    fn test_contains_evicts() {
        let mut m = map();
        let now = Utc::now();
        m.insert("k", "v".to_string(), Some(StdDuration::from_secs(1)), now);

        assert!(!m.contains("k", now + Duration::seconds(2)));
        assert_eq!(m.len(), 0);
    }

    #[test]
    fn test_default_and_zero_ttl() {
        let mut m = map();
        let now = Utc::now();
        m.insert("a", "1".to_string(), None, now);
        m.insert("b", "2".to_string(), Some(StdDuration::ZERO), now);

        for key in ["a", "b"] {
            let entry = &m.entries()[key];
            assert_eq!(entry.expires_at - entry.created_at, Duration::minutes(5));
            assert!(entry.expires_at > entry.created_at);
        }
    }

    #[test]
    fn test_zero_namespace_ttl_uses_fallback() {
        let mut m: TtlMap<String> =
            TtlMap::new(StdDuration::ZERO, StdDuration::from_secs(30 * 60));
        let now = Utc::now();
        m.insert("k", "v".to_string(), None, now);

        assert_eq!(m.default_ttl(), Duration::minutes(30));
        assert_eq!(m.entries()["k"].expires_at - now, Duration::minutes(30));
    }

    #[test]
    fn test_huge_ttl_is_clamped() {
        let mut m = map();
        let now = Utc::now();
        m.insert(
            "k",
            "v".to_string(),
            Some(StdDuration::from_secs(10_000_000_000_000)),
            now,
        );

        assert_eq!(m.entries()["k"].expires_at, latest_expiry());
        assert_eq!(m.get("k", now).map(String::as_str), Some("v"));
        assert_eq!(m.sweep(now + Duration::days(365)), 0);
    }

    #[test]
    fn test_overwrite_replaces_entry() {
        let mut m = map();
        let now = Utc::now();
        m.insert("k", "v1".to_string(), None, now);
        m.insert("k", "v2".to_string(), Some(StdDuration::from_secs(10)), now);

        assert_eq!(m.len(), 1);
        assert_eq!(m.get("k", now).map(String::as_str), Some("v2"));
        assert_eq!(m.entries()["k"].expires_at, now + Duration::seconds(10));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut m = map();
        assert!(!m.remove("missing"));
    }

    #[test]
    fn test_sweep_keeps_live_entries() {
        let mut m = map();
        let now = Utc::now();
        for i in 0..3 {
            m.insert_entry(
                format!("old-{i}"),
                CacheEntry {
                    value: "stale".to_string(),
                    created_at: now - Duration::minutes(10),
                    expires_at: now - Duration::minutes(1),
                },
            );
        }
        m.insert("fresh", "live".to_string(), None, now);

        assert_eq!(m.sweep(now), 3);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("fresh", now).map(String::as_str), Some("live"));
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let now = Utc::now();
        let entry = CacheEntry {
            value: 42,
            created_at: now,
            expires_at: now + Duration::minutes(30),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["value"], 42);
        assert!(json["createdAt"].is_string());
        assert!(json["expiresAt"].is_string());
    }
}
