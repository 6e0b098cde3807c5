//! Bounded set of image identifiers that have already been seen

use std::collections::{HashSet, VecDeque};

/// Insertion-ordered, duplicate-free, capacity-bounded identifier set.
///
/// Oldest identifiers are evicted first when the bound is exceeded. Re-adding
/// an identifier already present leaves its position unchanged.
#[derive(Debug, Clone)]
pub struct ImageSeenSet {
    order: VecDeque<String>,
    members: HashSet<String>,
    capacity: usize,
}

impl ImageSeenSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Rebuild from a persisted sequence, dropping duplicates and keeping the
    /// most recent `capacity` identifiers
    pub fn from_ids(ids: impl IntoIterator<Item = String>, capacity: usize) -> Self {
        let mut set = Self::new(capacity);
        for id in ids {
            set.insert(id);
        }
        set
    }

    /// Returns `false` if the identifier was already present
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.members.contains(&id) {
            return false;
        }
        self.members.insert(id.clone());
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Identifiers from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut set = ImageSeenSet::new(100);
        for i in 0..101 {
            assert!(set.insert(format!("img-{i}")));
        }

        assert_eq!(set.len(), 100);
        assert!(!set.contains("img-0"));
        assert!(set.contains("img-1"));
        assert!(set.contains("img-100"));
        assert_eq!(set.iter().next(), Some("img-1"));
    }

    #[test]
    fn test_readd_keeps_position() {
        let mut set = ImageSeenSet::new(3);
        set.insert("a");
        set.insert("b");
        assert!(!set.insert("a"));

        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["a", "b"]);

        // "a" is still the oldest, so it goes first on overflow
        set.insert("c");
        set.insert("d");
        assert!(!set.contains("a"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_from_ids_dedups_and_trims() {
        let ids = ["a", "b", "a", "c", "d"].map(String::from);
        let set = ImageSeenSet::from_ids(ids, 3);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_clear() {
        let mut set = ImageSeenSet::new(10);
        set.insert("a");
        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains("a"));
    }
}
