//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with an expiration index.
//! Expiry is lazy: stale entries are dropped when a read, write, traversal or
//! eviction runs into them, or on an explicit `purge_stale`.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::Instant;

use tracing::debug;

use crate::cache::{
    CacheEntry, CacheStats, DisposeReason, ExpirationIndex, GetOptions, SetOptions, Ttl,
    TtlCacheOptions,
};
use crate::error::{CacheError, Result};

/// Callback invoked with every value that leaves the cache.
pub type DisposeFn<K, V> = Box<dyn FnMut(V, &K, DisposeReason) + Send>;

// == TTL Cache ==
/// Bounded key/value store with per-entry expiration.
pub struct TtlCache<K, V> {
    /// Key-value storage
    data: HashMap<K, CacheEntry<V>>,
    /// Keys ordered by deadline
    expirations: ExpirationIndex<K>,
    /// Performance statistics
    stats: CacheStats,
    /// Defaults applied when a call leaves an option unset
    options: TtlCacheOptions,
    dispose: Option<DisposeFn<K, V>>,
    next_seq: u64,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty cache, rejecting invalid options.
    pub fn new(options: TtlCacheOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            data: HashMap::new(),
            expirations: ExpirationIndex::new(),
            stats: CacheStats::new(),
            options,
            dispose: None,
            next_seq: 0,
        })
    }

    /// Creates an empty cache that reports every removed value to `dispose`.
    ///
    /// The callback runs while the cache is borrowed mutably and must not
    /// call back into it.
    pub fn with_dispose<F>(options: TtlCacheOptions, dispose: F) -> Result<Self>
    where
        F: FnMut(V, &K, DisposeReason) + Send + 'static,
    {
        let mut cache = Self::new(options)?;
        cache.dispose = Some(Box::new(dispose));
        Ok(cache)
    }

    pub fn options(&self) -> &TtlCacheOptions {
        &self.options
    }

    pub fn max(&self) -> Option<usize> {
        self.options.max
    }

    pub fn default_ttl(&self) -> Option<Ttl> {
        self.options.ttl
    }

    // == Has ==
    /// True only if the key is present and not expired.
    pub fn has<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.purge_if_expired(key, Instant::now());
        self.data.contains_key(key)
    }

    // == Get ==
    /// Retrieves a live value.
    ///
    /// With `update_age_on_get` (call option, else cache default) the entry's
    /// clock restarts using `options.ttl`, or the entry's own TTL.
    pub fn get<Q>(&mut self, key: &Q, options: GetOptions) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.purge_if_expired(key, Instant::now()) || !self.data.contains_key(key) {
            self.stats.record_miss();
            return None;
        }

        let update_age = options
            .update_age_on_get
            .unwrap_or(self.options.update_age_on_get);
        if update_age {
            self.restart_clock(key, options.ttl);
        }

        self.stats.record_hit();
        self.data.get(key).map(|entry| &entry.value)
    }

    /// Looks at a live value without touching its age, statistics or
    /// purging anything.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| &entry.value)
    }

    // == Set ==
    /// Inserts or overwrites an entry.
    ///
    /// Accepts a `Ttl`, a `Duration` or a full `SetOptions`. Overwrites keep
    /// the key's place but restart its clock unless `no_update_ttl`, and hand
    /// the replaced value to the dispose callback unless `no_dispose_on_set`.
    /// A new key beyond capacity first evicts the entry nearest expiration.
    ///
    /// # Errors
    /// `CacheError::MissingTtl` when neither the call nor the cache has a TTL.
    pub fn set(&mut self, key: K, value: V, options: impl Into<SetOptions>) -> Result<&mut Self> {
        let options = options.into();
        let ttl = options
            .ttl
            .or(self.options.ttl)
            .ok_or(CacheError::MissingTtl)?;
        let no_update_ttl = options.no_update_ttl.unwrap_or(self.options.no_update_ttl);
        let no_dispose_on_set = options
            .no_dispose_on_set
            .unwrap_or(self.options.no_dispose_on_set);

        self.purge_if_expired(&key, Instant::now());

        if self.data.contains_key(&key) {
            if !no_update_ttl {
                self.restart_clock(&key, Some(ttl));
            }
            let replaced = self
                .data
                .get_mut(&key)
                .map(|entry| std::mem::replace(&mut entry.value, value));
            if let Some(old) = replaced {
                if !no_dispose_on_set {
                    self.dispose_value(old, &key, DisposeReason::Set);
                }
            }
            return Ok(self);
        }

        self.evict_to_capacity();

        let seq = self.next_seq();
        let entry = CacheEntry::new(value, ttl, seq);
        self.expirations.insert(key.clone(), entry.expires_at, seq);
        self.data.insert(key, entry);
        Ok(self)
    }

    // == Set TTL ==
    /// Restarts a live entry's clock with a new TTL.
    ///
    /// Returns false if the key is absent or expired.
    pub fn set_ttl<Q>(&mut self, key: &Q, ttl: impl Into<Ttl>) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.purge_if_expired(key, Instant::now()) {
            return false;
        }
        self.restart_clock(key, Some(ttl.into()))
    }

    // == Delete ==
    /// Removes an entry, returning whether a live entry existed.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.purge_if_expired(key, Instant::now()) {
            return false;
        }
        self.remove_entry(key, DisposeReason::Delete)
    }

    // == Clear ==
    /// Removes every entry, disposing each with `DisposeReason::Delete`.
    pub fn clear(&mut self) {
        self.expirations.clear();
        let drained: Vec<(K, CacheEntry<V>)> = self.data.drain().collect();
        for (key, entry) in drained {
            self.dispose_value(entry.value, &key, DisposeReason::Delete);
        }
    }

    // == Remaining TTL ==
    /// Time left before the entry expires.
    ///
    /// `Ttl::ZERO` for absent or expired keys, `Ttl::Infinite` for immortal
    /// entries.
    pub fn get_remaining_ttl<Q>(&self, key: &Q) -> Ttl
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data
            .get(key)
            .map_or(Ttl::ZERO, |entry| entry.remaining_ttl())
    }

    // == Ordered Traversal ==
    /// Live entries by ascending expiration, ties in insertion order.
    /// Immortal entries are not visited.
    pub fn entries(&mut self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.purge_stale();
        let data = &self.data;
        self.expirations
            .iter()
            .filter_map(move |key| data.get(key).map(|entry| (key, &entry.value)))
    }

    /// Keys in the order of [`TtlCache::entries`].
    pub fn keys(&mut self) -> impl Iterator<Item = &K> + '_ {
        self.entries().map(|(key, _)| key)
    }

    /// Values in the order of [`TtlCache::entries`].
    pub fn values(&mut self) -> impl Iterator<Item = &V> + '_ {
        self.entries().map(|(_, value)| value)
    }

    // == Purge Stale ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub fn purge_stale(&mut self) -> usize {
        let expired: Vec<K> = self
            .expirations
            .expired(Instant::now())
            .cloned()
            .collect();

        for key in &expired {
            self.remove_entry(key, DisposeReason::Stale);
            self.stats.record_expired();
        }

        if !expired.is_empty() {
            debug!(count = expired.len(), "purged stale entries");
        }
        expired.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.data.len(),
            ..self.stats
        }
    }

    // == Length ==
    /// Number of stored entries, counting immortal entries and expired
    /// entries that have not been purged yet.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // == Internals ==
    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Drops the entry if it has expired. Returns true if it was dropped.
    fn purge_if_expired<Q>(&mut self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let expired = self
            .data
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(now));
        if expired {
            self.remove_entry(key, DisposeReason::Stale);
            self.stats.record_expired();
        }
        expired
    }

    /// Restarts the clock of an existing entry; `ttl` None keeps its TTL.
    fn restart_clock<Q>(&mut self, key: &Q, ttl: Option<Ttl>) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let seq = self.next_seq();
        let Some(entry) = self.data.get_mut(key) else {
            return false;
        };
        let ttl = ttl.unwrap_or(entry.ttl);
        if let Some(tracked) = self.expirations.remove(entry.expires_at, entry.seq) {
            entry.refresh(ttl, seq);
            self.expirations.insert(tracked, entry.expires_at, entry.seq);
        }
        true
    }

    fn remove_entry<Q>(&mut self, key: &Q, reason: DisposeReason) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some((key, entry)) = self.data.remove_entry(key) else {
            return false;
        };
        self.expirations.remove(entry.expires_at, entry.seq);
        self.dispose_value(entry.value, &key, reason);
        true
    }

    /// Evicts until one more entry fits under `max`.
    fn evict_to_capacity(&mut self) {
        let Some(max) = self.options.max else {
            return;
        };

        while self.data.len() >= max {
            let Some(key) = self.expirations.peek_nearest().cloned() else {
                break;
            };
            let stale = self
                .data
                .get(&key)
                .is_some_and(|entry| entry.is_expired());
            if stale {
                self.remove_entry(&key, DisposeReason::Stale);
                self.stats.record_expired();
            } else {
                self.remove_entry(&key, DisposeReason::Evict);
                self.stats.record_eviction();
                debug!(max, "evicted entry nearest expiration");
            }
        }
    }

    fn dispose_value(&mut self, value: V, key: &K, reason: DisposeReason) {
        if let Some(dispose) = self.dispose.as_mut() {
            dispose(value, key, reason);
        }
    }
}

impl<K, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("len", &self.data.len())
            .field("options", &self.options)
            .field("stats", &self.stats)
            .field("has_dispose", &self.dispose.is_some())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread::sleep;
    use std::time::Duration;

    fn cache(max: Option<usize>, ttl: Option<Ttl>) -> TtlCache<String, String> {
        TtlCache::new(TtlCacheOptions {
            max,
            ttl,
            ..TtlCacheOptions::default()
        })
        .unwrap()
    }

    fn recording_cache(
        options: TtlCacheOptions,
    ) -> (TtlCache<u32, &'static str>, Arc<Mutex<Vec<(u32, &'static str, DisposeReason)>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let cache = TtlCache::with_dispose(options, move |value, key: &u32, reason| {
            sink.lock().unwrap().push((*key, value, reason));
        })
        .unwrap();
        (cache, log)
    }

    #[test]
    fn test_store_new() {
        let store = cache(Some(100), Some(Ttl::from_secs(300)));
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.max(), Some(100));
        assert_eq!(store.default_ttl(), Some(Ttl::from_secs(300)));
    }

    #[test]
    fn test_store_rejects_zero_max() {
        let result: Result<TtlCache<String, String>> =
            TtlCache::new(TtlCacheOptions::new().max(0));
        assert!(matches!(result, Err(CacheError::InvalidOptions(_))));
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = cache(Some(100), Some(Ttl::from_secs(300)));

        store
            .set("key1".to_string(), "value1".to_string(), SetOptions::default())
            .unwrap();

        assert!(store.has("key1"));
        assert_eq!(store.get("key1", GetOptions::default()).unwrap(), "value1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = cache(None, Some(Ttl::from_secs(300)));

        assert!(!store.has("nonexistent"));
        assert!(store.get("nonexistent", GetOptions::default()).is_none());
        assert_eq!(store.get_remaining_ttl("nonexistent"), Ttl::ZERO);
    }

    #[test]
    fn test_store_set_chains() {
        let mut store = cache(None, Some(Ttl::from_secs(300)));

        store
            .set("a".to_string(), "1".to_string(), SetOptions::default())
            .unwrap()
            .set("b".to_string(), "2".to_string(), Ttl::Infinite)
            .unwrap();

        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_store_missing_ttl() {
        let mut store = cache(None, None);

        let result = store.set("key".to_string(), "value".to_string(), SetOptions::default());
        assert!(matches!(result, Err(CacheError::MissingTtl)));
        assert!(store.is_empty());

        store
            .set("key".to_string(), "value".to_string(), Ttl::Millis(1000))
            .unwrap();
        assert!(store.has("key"));
    }

    #[test]
    fn test_store_delete_once() {
        let mut store = cache(None, Some(Ttl::from_secs(300)));

        store
            .set("key1".to_string(), "value1".to_string(), SetOptions::default())
            .unwrap();

        assert!(store.delete("key1"));
        assert!(!store.delete("key1"));
        assert!(!store.delete("never_set"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = cache(Some(100), Some(Ttl::from_secs(300)));

        store
            .set("key1".to_string(), "value1".to_string(), SetOptions::default())
            .unwrap();
        store
            .set("key1".to_string(), "value2".to_string(), SetOptions::default())
            .unwrap();

        assert_eq!(store.get("key1", GetOptions::default()).unwrap(), "value2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store = cache(None, Some(Ttl::from_secs(300)));

        store
            .set("key1".to_string(), "value1".to_string(), Ttl::Millis(20))
            .unwrap();
        assert!(store.get("key1", GetOptions::default()).is_some());

        sleep(Duration::from_millis(30));

        assert_eq!(store.get_remaining_ttl("key1"), Ttl::ZERO);
        assert!(store.get("key1", GetOptions::default()).is_none());
        assert!(!store.has("key1"));
    }

    #[test]
    fn test_store_size_counts_unpurged_expired() {
        let mut store = cache(None, Some(Ttl::from_secs(300)));

        store
            .set("short".to_string(), "v".to_string(), Ttl::Millis(10))
            .unwrap();
        store
            .set("forever".to_string(), "v".to_string(), Ttl::Infinite)
            .unwrap();

        sleep(Duration::from_millis(20));

        // Nothing has touched "short" yet
        assert_eq!(store.len(), 2);
        assert!(!store.has("short"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_infinite_ttl() {
        let mut store = cache(None, Some(Ttl::from_secs(300)));

        store
            .set("forever".to_string(), "v".to_string(), Ttl::Infinite)
            .unwrap();
        store
            .set("finite".to_string(), "v".to_string(), SetOptions::default())
            .unwrap();

        assert_eq!(store.get_remaining_ttl("forever"), Ttl::Infinite);
        assert_eq!(store.len(), 2);
        let keys: Vec<String> = store.keys().cloned().collect();
        assert_eq!(keys, vec!["finite".to_string()]);
        assert!(store.has("forever"));
    }

    #[test]
    fn test_store_traversal_order() {
        let mut store = cache(None, Some(Ttl::from_secs(300)));

        store.set("c".to_string(), "3".to_string(), Ttl::from_secs(30)).unwrap();
        store.set("a".to_string(), "1".to_string(), Ttl::from_secs(10)).unwrap();
        store.set("b".to_string(), "2".to_string(), Ttl::from_secs(20)).unwrap();

        let keys: Vec<String> = store.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);

        let values: Vec<String> = store.values().cloned().collect();
        assert_eq!(values, vec!["1", "2", "3"]);

        // Restartable: a second traversal sees the same sequence
        let entries: Vec<(String, String)> = store
            .entries()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        assert_eq!(entries[0], ("a".to_string(), "1".to_string()));
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_store_traversal_skips_expired() {
        let mut store = cache(None, Some(Ttl::from_secs(300)));

        store.set("gone".to_string(), "x".to_string(), Ttl::Millis(10)).unwrap();
        store.set("kept".to_string(), "y".to_string(), Ttl::from_secs(10)).unwrap();

        sleep(Duration::from_millis(20));

        let keys: Vec<String> = store.keys().cloned().collect();
        assert_eq!(keys, vec!["kept"]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_evicts_nearest_expiration() {
        let mut store = cache(Some(3), Some(Ttl::from_secs(300)));

        store.set("key1".to_string(), "v1".to_string(), Ttl::from_secs(60)).unwrap();
        store.set("key2".to_string(), "v2".to_string(), Ttl::from_secs(10)).unwrap();
        store.set("key3".to_string(), "v3".to_string(), Ttl::from_secs(30)).unwrap();

        // key1 is oldest, but key2 expires first
        store.set("key4".to_string(), "v4".to_string(), Ttl::from_secs(120)).unwrap();

        assert_eq!(store.len(), 3);
        assert!(!store.has("key2"));
        assert!(store.has("key1"));
        assert!(store.has("key3"));
        assert!(store.has("key4"));
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_overwrite_at_capacity_does_not_evict() {
        let mut store = cache(Some(2), Some(Ttl::from_secs(300)));

        store.set("a".to_string(), "1".to_string(), SetOptions::default()).unwrap();
        store.set("b".to_string(), "2".to_string(), SetOptions::default()).unwrap();
        store.set("a".to_string(), "3".to_string(), SetOptions::default()).unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.has("b"));
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_store_capacity_one_evicts_immortal() {
        let mut store: TtlCache<u32, &str> = TtlCache::new(TtlCacheOptions::new().max(1)).unwrap();

        store.set(1, "a", Ttl::Infinite).unwrap();
        store.set(2, "b", Ttl::Millis(10)).unwrap();

        assert_eq!(store.len(), 1);
        assert!(!store.has(&1));
        assert_eq!(store.get(&2, GetOptions::default()), Some(&"b"));
    }

    #[test]
    fn test_store_eviction_prefers_finite_over_immortal() {
        let mut store: TtlCache<u32, &str> = TtlCache::new(TtlCacheOptions::new().max(2)).unwrap();

        store.set(1, "immortal", Ttl::Infinite).unwrap();
        store.set(2, "finite", Ttl::from_secs(3600)).unwrap();
        store.set(3, "new", Ttl::from_secs(60)).unwrap();

        assert!(store.has(&1));
        assert!(!store.has(&2));
        assert!(store.has(&3));
    }

    #[test]
    fn test_store_update_age_on_get_with_ttl() {
        let mut store = cache(None, None);

        store.set("k".to_string(), "v".to_string(), Ttl::Millis(100)).unwrap();
        sleep(Duration::from_millis(50));

        let options = GetOptions::default()
            .update_age_on_get(true)
            .ttl(Ttl::Millis(100));
        assert!(store.get("k", options).is_some());

        let remaining = store.get_remaining_ttl("k").as_millis().unwrap();
        assert!(remaining > 80, "remaining TTL {remaining} should be close to 100");
    }

    #[test]
    fn test_store_update_age_on_get_default() {
        let mut store: TtlCache<String, String> = TtlCache::new(
            TtlCacheOptions::new()
                .ttl(Ttl::Millis(100))
                .update_age_on_get(true),
        )
        .unwrap();

        store.set("k".to_string(), "v".to_string(), Ttl::Millis(200)).unwrap();
        sleep(Duration::from_millis(60));
        assert!(store.get("k", GetOptions::default()).is_some());

        // Refreshed with the entry's own 200ms TTL
        let remaining = store.get_remaining_ttl("k").as_millis().unwrap();
        assert!(remaining > 150 && remaining <= 200);

        // Explicitly disabled for this call
        sleep(Duration::from_millis(20));
        store
            .get("k", GetOptions::default().update_age_on_get(false))
            .unwrap();
        assert!(store.get_remaining_ttl("k").as_millis().unwrap() <= 185);
    }

    #[test]
    fn test_store_no_update_ttl() {
        let mut store = cache(None, Some(Ttl::Millis(100)));

        store.set("k".to_string(), "v1".to_string(), SetOptions::default()).unwrap();
        sleep(Duration::from_millis(50));
        store
            .set(
                "k".to_string(),
                "v2".to_string(),
                SetOptions::default().no_update_ttl(true),
            )
            .unwrap();

        assert!(store.get_remaining_ttl("k").as_millis().unwrap() <= 50);
        assert_eq!(store.get("k", GetOptions::default()).unwrap(), "v2");

        store.set("k".to_string(), "v3".to_string(), SetOptions::default()).unwrap();
        assert!(store.get_remaining_ttl("k").as_millis().unwrap() > 90);
    }

    #[test]
    fn test_store_set_ttl() {
        let mut store = cache(None, Some(Ttl::Millis(100)));

        store.set("k".to_string(), "v".to_string(), SetOptions::default()).unwrap();
        assert!(store.set_ttl("k", Ttl::Infinite));
        assert_eq!(store.get_remaining_ttl("k"), Ttl::Infinite);
        assert!(!store.set_ttl("missing", Ttl::Millis(10)));
    }

    #[test]
    fn test_store_clear() {
        let mut store = cache(None, Some(Ttl::from_secs(300)));

        store.set("a".to_string(), "1".to_string(), SetOptions::default()).unwrap();
        store.set("b".to_string(), "2".to_string(), Ttl::Infinite).unwrap();
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.keys().count(), 0);
    }

    #[test]
    fn test_store_purge_stale() {
        let mut store = cache(None, Some(Ttl::from_secs(300)));

        store.set("key1".to_string(), "value1".to_string(), Ttl::Millis(10)).unwrap();
        store.set("key2".to_string(), "value2".to_string(), Ttl::from_secs(10)).unwrap();
        store.set("key3".to_string(), "value3".to_string(), Ttl::Infinite).unwrap();

        sleep(Duration::from_millis(20));

        assert_eq!(store.purge_stale(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().expired, 1);
        assert!(store.has("key2"));
    }

    #[test]
    fn test_store_stats() {
        let mut store = cache(Some(100), Some(Ttl::from_secs(300)));

        store.set("key1".to_string(), "value1".to_string(), SetOptions::default()).unwrap();
        store.get("key1", GetOptions::default()).unwrap();
        let _ = store.get("nonexistent", GetOptions::default());

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_store_peek_has_no_side_effects() {
        let mut store = cache(None, Some(Ttl::from_secs(300)));

        store.set("k".to_string(), "v".to_string(), SetOptions::default()).unwrap();
        assert_eq!(store.peek("k").map(String::as_str), Some("v"));
        assert!(store.peek("missing").is_none());
        assert_eq!(store.stats().hits, 0);
    }

    #[test]
    fn test_dispose_reasons() {
        let (mut store, log) = recording_cache(TtlCacheOptions::new().max(2).ttl(Ttl::from_secs(60)));

        store.set(1, "one", SetOptions::default()).unwrap();
        store.set(1, "uno", SetOptions::default()).unwrap();
        store.set(2, "two", SetOptions::default()).unwrap();
        store.set(3, "three", SetOptions::default()).unwrap();
        store.delete(&2);
        store.set(4, "short", Ttl::Millis(5)).unwrap();
        sleep(Duration::from_millis(15));
        assert!(!store.has(&4));
        store.clear();

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                (1, "one", DisposeReason::Set),
                (1, "uno", DisposeReason::Evict),
                (2, "two", DisposeReason::Delete),
                (4, "short", DisposeReason::Stale),
                (3, "three", DisposeReason::Delete),
            ]
        );
    }

    #[test]
    fn test_no_dispose_on_set() {
        let (mut store, log) = recording_cache(
            TtlCacheOptions::new()
                .ttl(Ttl::from_secs(60))
                .no_dispose_on_set(true),
        );

        store.set(1, "one", SetOptions::default()).unwrap();
        store.set(1, "uno", SetOptions::default()).unwrap();
        assert!(log.lock().unwrap().is_empty());

        store
            .set(1, "eins", SetOptions::default().no_dispose_on_set(false))
            .unwrap();
        assert_eq!(*log.lock().unwrap(), vec![(1, "uno", DisposeReason::Set)]);
    }
}
