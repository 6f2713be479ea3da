//! TTL cache for facade read operations.
//!
//! Keys are `"<namespace>:<detail>"`. Reads populate the cache; mutating
//! operations invalidate whole namespaces explicitly. Stale entries are
//! evicted lazily, on the lookup that finds them expired.

use dashmap::DashMap;
use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

type CachedValue = Arc<dyn Any + Send + Sync>;

/// A cached value with its insertion time and lifetime.
#[derive(Clone)]
pub struct CacheEntry {
    pub value: CachedValue,
    pub timestamp: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    /// Valid while `now - timestamp < ttl`.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) < self.ttl
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("timestamp", &self.timestamp)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Hit(T),
    /// Entry was present but expired; it has been removed.
    Expired,
    Miss,
}

/// Thread-safe TTL cache holding values of any cloneable type.
#[derive(Clone, Default)]
pub struct TtlCache {
    inner: Arc<DashMap<String, CacheEntry>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key`, evicting it if stale.
    ///
    /// An entry stored under a different type than `T` counts as a miss and
    /// is left in place.
    pub fn lookup<T>(&self, key: &str) -> Lookup<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let now = Instant::now();
        match self.inner.get(key) {
            Some(entry) if entry.is_fresh(now) => {
                return match entry.value.downcast_ref::<T>() {
                    Some(value) => Lookup::Hit(value.clone()),
                    None => Lookup::Miss,
                };
            }
            Some(_) => {}
            None => return Lookup::Miss,
        }

        // The read guard is gone by now; DashMap shards are not reentrant.
        // Re-check freshness so an entry refreshed in between survives.
        match self.inner.remove_if(key, |_, entry| !entry.is_fresh(now)) {
            Some(_) => Lookup::Expired,
            None => Lookup::Miss,
        }
    }

    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        match self.lookup(key) {
            Lookup::Hit(value) => Some(value),
            _ => None,
        }
    }

    pub fn set<T>(&self, key: impl Into<String>, value: T, ttl: Duration)
    where
        T: Send + Sync + 'static,
    {
        self.inner.insert(
            key.into(),
            CacheEntry {
                value: Arc::new(value),
                timestamp: Instant::now(),
                ttl,
            },
        );
    }

    /// Remove every key in `namespace`. Returns how many entries were dropped.
    pub fn invalidate_namespace(&self, namespace: &str) -> usize {
        let prefix = format!("{}:", namespace);
        let before = self.inner.len();
        self.inner.retain(|key, _| !key.starts_with(&prefix));
        before.saturating_sub(self.inner.len())
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Build a cache key from a namespace and a hash of the call's arguments.
pub fn cache_key<A: Hash + ?Sized>(namespace: &str, args: &A) -> String {
    let mut hasher = DefaultHasher::new();
    args.hash(&mut hasher);
    format!("{}:{:016x}", namespace, hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = TtlCache::new();
        cache.set("k", "x".to_string(), Duration::from_secs(1));

        assert_eq!(cache.get::<String>("k").as_deref(), Some("x"));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(cache.lookup::<String>("k"), Lookup::Expired);
        assert_eq!(cache.lookup::<String>("k"), Lookup::Miss);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn entry_at_exact_ttl_is_stale() {
        let cache = TtlCache::new();
        cache.set("k", 7u32, Duration::from_secs(2));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get::<u32>("k"), None);
    }

    #[test]
    fn wrong_type_is_a_miss_and_keeps_entry() {
        let cache = TtlCache::new();
        cache.set("k", 1u64, Duration::from_secs(60));
        assert_eq!(cache.lookup::<String>("k"), Lookup::Miss);
        assert_eq!(cache.get::<u64>("k"), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refreshed_entry_is_not_evicted_by_stale_lookup() {
        let cache = TtlCache::new();
        cache.set("k", 1u32, Duration::from_secs(1));
        tokio::time::advance(Duration::from_secs(2)).await;

        // Entry replaced between the stale read and the eviction.
        cache.set("k", 2u32, Duration::from_secs(60));
        let now = Instant::now();
        assert!(cache.inner.remove_if("k", |_, e| !e.is_fresh(now)).is_none());
        assert_eq!(cache.get::<u32>("k"), Some(2));
    }

    #[test]
    fn namespace_invalidation_leaves_others() {
        let cache = TtlCache::new();
        cache.set("documents:all", vec![1u8], Duration::from_secs(60));
        cache.set("documents:42", vec![2u8], Duration::from_secs(60));
        cache.set("query:abc", vec![3u8], Duration::from_secs(60));
        cache.set("documentsx:1", vec![4u8], Duration::from_secs(60));

        assert_eq!(cache.invalidate_namespace("documents"), 2);
        assert_eq!(cache.len(), 2);
        assert!(cache.get::<Vec<u8>>("query:abc").is_some());
    }

    #[test]
    fn keys_are_stable_per_arguments() {
        let a = cache_key("query", &("what is rust", 5usize));
        let b = cache_key("query", &("what is rust", 5usize));
        let c = cache_key("query", &("what is rust", 6usize));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("query:"));
    }
}
