//! In-process cache namespaces.

use std::borrow::Borrow;
use std::hash::Hash;

use dashmap::DashMap;

use crate::observability::metrics;

/// A named key-value cache with event-driven eviction and no TTL.
///
/// Each get/insert/evict is atomic per key. Values are cloned out so no
/// shard guard outlives the call.
pub struct CacheStore<K, V> {
    namespace: &'static str,
    entries: DashMap<K, V>,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(namespace: &'static str) -> Self {
        Self {
            namespace,
            entries: DashMap::new(),
        }
    }

    /// Look up a value, recording the hit or miss.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let value = self.entries.get(key).map(|entry| entry.value().clone());
        metrics::record_cache_lookup(self.namespace, value.is_some());
        value
    }

    /// Store a value, replacing any previous one for the key.
    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    /// Remove one entry. Returns whether something was removed.
    pub fn evict<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.entries.remove(key).is_some();
        if removed {
            metrics::record_cache_eviction(self.namespace, 1);
            tracing::debug!(namespace = self.namespace, "Cache entry evicted");
        }
        removed
    }

    /// Remove every entry in the namespace.
    pub fn evict_all(&self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        metrics::record_cache_eviction(self.namespace, count);
        tracing::debug!(namespace = self.namespace, evicted = count, "Cache namespace cleared");
        count
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
