//! In-memory TTL cache
//!
//! The only caching strategy in the system: a dictionary whose entries
//! expire after a fixed time-to-live. Used by the sports tools to keep
//! schedule lookups from hammering the Sportradar quota.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A map with per-entry expiry. Entries older than the TTL read as absent.
///
/// Interior mutability so tools can share one cache behind an `Arc`.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Get a live entry, evicting it if it has expired
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(key, (Instant::now(), value));
    }

    pub fn clear(&self) {
        self.entries.lock().expect("cache mutex poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("schedule", 42);
        assert_eq!(cache.get(&"schedule"), Some(42));
        assert_eq!(cache.get(&"missing"), None);
    }

    #[test]
    fn test_expired_entry_reads_as_absent() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.insert("schedule", 42);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get(&"schedule"), None);
        // The expired entry was evicted on read
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_refreshes_expiry() {
        let cache = TtlCache::new(Duration::from_millis(50));
        cache.insert("k", 1);
        std::thread::sleep(Duration::from_millis(30));
        cache.insert("k", 2);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get(&"k"), Some(2));
    }

    #[test]
    fn test_clear() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
