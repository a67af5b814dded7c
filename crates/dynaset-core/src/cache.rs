//! Multi-key LRU cache: one value reachable through several unique keys.

use crate::error::ErrorClass;
use lru::LruCache;
use parking_lot::RwLock;
use std::{
    borrow::Borrow,
    collections::HashMap,
    fmt,
    hash::Hash,
    num::NonZeroUsize,
};
use thiserror::Error as ThisError;
use tracing::{trace, warn};

///
/// CacheError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CacheError {
    #[error("key(s) reserved: {}", keys.join(", "))]
    KeysReserved { keys: Vec<String> },

    #[error("cache entry has no keys")]
    NoKeys,
}

impl CacheError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::KeysReserved { .. } => ErrorClass::Conflict,
            Self::NoKeys => ErrorClass::Structural,
        }
    }
}

type KeysFn<V, K> = Box<dyn Fn(&V) -> Vec<K> + Send + Sync>;

///
/// Cache
///
/// Entries live in an LRU keyed by a sequence number; a flat index maps
/// every key to the sequence of the entry that owns it. Eviction removes
/// the evicted entry's keys from the index under the same lock.
///

pub struct Cache<V, K = String> {
    keys_of: KeysFn<V, K>,
    inner: RwLock<CacheInner<V, K>>,
}

struct CacheInner<V, K> {
    seq: u64,
    index: HashMap<K, u64>,
    lru: LruCache<u64, Entry<V, K>>,
}

struct Entry<V, K> {
    keys: Vec<K>,
    value: V,
}

impl<V, K> CacheInner<V, K>
where
    K: Eq + Hash,
{
    // Drop index entries that still point at `seq`.
    fn unindex<'a>(&mut self, keys: impl IntoIterator<Item = &'a K>, seq: u64)
    where
        K: 'a,
    {
        for key in keys {
            if self.index.get(key) == Some(&seq) {
                self.index.remove(key);
            }
        }
    }
}

impl<V, K> Cache<V, K>
where
    V: Clone,
    K: Clone + Eq + Hash + fmt::Display,
{
    /// Cache holding at most `capacity` entries (at least one).
    pub fn new<F>(capacity: usize, keys_of: F) -> Self
    where
        F: Fn(&V) -> Vec<K> + Send + Sync + 'static,
    {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            keys_of: Box::new(keys_of),
            inner: RwLock::new(CacheInner {
                seq: 0,
                index: HashMap::new(),
                lru: LruCache::new(capacity),
            }),
        }
    }

    fn keys(&self, value: &V) -> Vec<K> {
        let mut keys: Vec<K> = Vec::new();
        for key in (self.keys_of)(value) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        keys
    }

    /// Insert `value`, or update the single entry any of its keys already
    /// reach. Keys reaching more than one entry are rejected and nothing
    /// changes.
    pub fn add(&self, value: V) -> Result<(), CacheError> {
        let keys = self.keys(&value);
        if keys.is_empty() {
            return Err(CacheError::NoKeys);
        }

        let mut inner = self.inner.write();
        let mut matches: Vec<u64> = Vec::new();
        for key in &keys {
            if let Some(&seq) = inner.index.get(key)
                && !matches.contains(&seq)
            {
                matches.push(seq);
            }
        }

        match matches.as_slice() {
            [] => {}
            [seq] => {
                let seq = *seq;
                if let Some(entry) = inner.lru.get_mut(&seq) {
                    let stale: Vec<K> = entry
                        .keys
                        .iter()
                        .filter(|key| !keys.contains(key))
                        .cloned()
                        .collect();
                    entry.keys.clone_from(&keys);
                    entry.value = value;

                    inner.unindex(&stale, seq);
                    for key in keys {
                        inner.index.insert(key, seq);
                    }

                    return Ok(());
                }

                // index pointed at an entry the LRU no longer holds
                inner.index.retain(|_, s| *s != seq);
            }
            _ => {
                let reserved: Vec<String> = keys
                    .iter()
                    .filter(|key| inner.index.contains_key(*key))
                    .map(ToString::to_string)
                    .collect();
                warn!(keys = ?reserved, entries = matches.len(), "cache keys reserved by distinct entries");

                return Err(CacheError::KeysReserved { keys: reserved });
            }
        }

        inner.seq += 1;
        let seq = inner.seq;
        let evicted = inner.lru.push(
            seq,
            Entry {
                keys: keys.clone(),
                value,
            },
        );
        if let Some((old, entry)) = evicted
            && old != seq
        {
            trace!(seq = old, keys = entry.keys.len(), "cache entry evicted");
            inner.unindex(&entry.keys, old);
        }
        for key in keys {
            inner.index.insert(key, seq);
        }

        Ok(())
    }

    /// Value reachable through `key`, marking it most recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let mut inner = self.inner.write();
        let seq = *inner.index.get(key)?;

        inner.lru.get(&seq).map(|entry| entry.value.clone())
    }

    /// Value reachable through `key`, leaving the recency order alone.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let inner = self.inner.read();
        let seq = inner.index.get(key)?;

        inner.lru.peek(seq).map(|entry| entry.value.clone())
    }

    /// Remove every entry reachable through `value`'s keys.
    pub fn delete(&self, value: &V) -> bool {
        let keys = self.keys(value);
        let mut inner = self.inner.write();
        let mut removed = false;

        for key in &keys {
            let Some(&seq) = inner.index.get(key) else {
                continue;
            };
            if let Some(entry) = inner.lru.pop(&seq) {
                inner.unindex(&entry.keys, seq);
                removed = true;
            }
            inner.index.remove(key);
        }

        removed
    }

    /// Remove the entry reachable through `key`, returning its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let mut inner = self.inner.write();
        let seq = *inner.index.get(key)?;
        let entry = inner.lru.pop(&seq)?;
        inner.unindex(&entry.keys, seq);

        Some(entry.value)
    }

    /// Visit values oldest first until `f` returns false.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&V) -> bool,
    {
        let values: Vec<V> = {
            let inner = self.inner.read();
            inner.lru.iter().rev().map(|(_, e)| e.value.clone()).collect()
        };

        for value in &values {
            if !f(value) {
                break;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().lru.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.read().lru.cap().get()
    }

    #[cfg(test)]
    fn is_coherent(&self) -> bool {
        let inner = self.inner.read();

        let indexed = inner.index.iter().all(|(key, seq)| {
            inner
                .lru
                .peek(seq)
                .is_some_and(|entry| entry.keys.contains(key))
        });
        let reachable = inner.lru.iter().all(|(seq, entry)| {
            entry
                .keys
                .iter()
                .all(|key| inner.index.get(key) == Some(seq))
        });

        indexed && reachable
    }
}

impl<V, K> fmt::Debug for Cache<V, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();

        f.debug_struct("Cache")
            .field("len", &inner.lru.len())
            .field("capacity", &inner.lru.cap())
            .field("keys", &inner.index.len())
            .finish_non_exhaustive()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Item {
        name: String,
        path: String,
        rev: u32,
    }

    fn item(name: &str, path: &str, rev: u32) -> Item {
        Item {
            name: name.into(),
            path: path.into(),
            rev,
        }
    }

    fn cache(capacity: usize) -> Cache<Item> {
        Cache::new(capacity, |item: &Item| {
            [item.name.to_lowercase(), item.path.to_lowercase()]
                .into_iter()
                .filter(|k| !k.is_empty())
                .collect()
        })
    }

    #[test]
    fn both_keys_reach_the_same_entry() {
        let cache = cache(4);
        cache.add(item("cities", "dictionaries/cities", 1)).unwrap();

        assert_eq!(cache.get("cities"), cache.get("dictionaries/cities"));
        assert_eq!(cache.len(), 1);
        assert!(cache.is_coherent());
    }

    #[test]
    fn single_match_updates_in_place() {
        let cache = cache(4);
        cache.add(item("cities", "dictionaries/cities", 1)).unwrap();
        cache.add(item("cities", "dictionaries/cities", 2)).unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("cities").unwrap().rev, 2);
    }

    #[test]
    fn renaming_one_key_keeps_the_other() {
        let cache = cache(4);
        cache.add(item("cities", "dictionaries/cities", 1)).unwrap();
        cache.add(item("towns", "dictionaries/cities", 2)).unwrap();

        assert!(cache.get("cities").is_none());
        assert_eq!(cache.get("towns").unwrap().rev, 2);
        assert_eq!(cache.get("dictionaries/cities").unwrap().rev, 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.is_coherent());
    }

    #[test]
    fn keys_spanning_two_entries_are_rejected() {
        let cache = cache(4);
        cache.add(item("a", "path/a", 1)).unwrap();
        cache.add(item("b", "path/b", 1)).unwrap();

        let err = cache.add(item("a", "path/b", 2)).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Conflict);
        assert_eq!(
            err,
            CacheError::KeysReserved {
                keys: vec!["a".into(), "path/b".into()]
            }
        );

        assert_eq!(cache.get("a"), Some(item("a", "path/a", 1)));
        assert_eq!(cache.get("path/b"), Some(item("b", "path/b", 1)));
        assert_eq!(cache.len(), 2);
        assert!(cache.is_coherent());
    }

    #[test]
    fn eviction_clears_every_key_of_the_entry() {
        let cache = cache(2);
        cache.add(item("a", "path/a", 1)).unwrap();
        cache.add(item("b", "path/b", 1)).unwrap();
        cache.add(item("c", "path/c", 1)).unwrap();

        assert!(cache.get("a").is_none());
        assert!(cache.get("path/a").is_none());
        assert!(cache.peek("c").is_some());
        assert_eq!(cache.len(), 2);
        assert!(cache.is_coherent());
    }

    #[test]
    fn get_promotes_but_peek_does_not() {
        let cache = cache(2);
        cache.add(item("a", "path/a", 1)).unwrap();
        cache.add(item("b", "path/b", 1)).unwrap();

        assert!(cache.peek("a").is_some());
        cache.add(item("c", "path/c", 1)).unwrap();
        assert!(cache.peek("a").is_none());

        assert!(cache.get("b").is_some());
        cache.add(item("d", "path/d", 1)).unwrap();
        assert!(cache.peek("b").is_some());
        assert!(cache.peek("c").is_none());
    }

    #[test]
    fn delete_and_remove_drop_all_keys() {
        let cache = cache(4);
        cache.add(item("a", "path/a", 1)).unwrap();
        cache.add(item("b", "path/b", 1)).unwrap();

        assert!(cache.delete(&item("a", "", 0)));
        assert!(!cache.delete(&item("a", "", 0)));
        assert!(cache.get("path/a").is_none());

        assert_eq!(cache.remove("path/b").map(|i| i.name), Some("b".to_string()));
        assert!(cache.get("b").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn values_without_keys_are_refused() {
        assert_eq!(cache(1).add(item("", "", 0)), Err(CacheError::NoKeys));
    }

    #[test]
    fn for_each_visits_oldest_first() {
        let cache = cache(4);
        for name in ["a", "b", "c"] {
            cache.add(item(name, "", 0)).unwrap();
        }
        cache.get("a");

        let mut seen = Vec::new();
        cache.for_each(|item| {
            seen.push(item.name.clone());
            true
        });

        assert_eq!(seen, ["b", "c", "a"]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        assert_eq!(cache(0).capacity(), 1);
    }

    #[test]
    fn concurrent_writers_keep_the_index_coherent() {
        let cache = cache(3);

        std::thread::scope(|s| {
            for t in 0..4u32 {
                let cache = &cache;
                s.spawn(move || {
                    for i in 0..500u32 {
                        let name = format!("n{}", (i + t) % 5);
                        let path = format!("p{}", (i * 3 + t) % 5);
                        let value = item(&name, &path, i);
                        match (i + t) % 4 {
                            0 => {
                                cache.delete(&value);
                            }
                            1 => {
                                cache.get(&name);
                                cache.peek(&path);
                            }
                            _ => {
                                let _ = cache.add(value);
                            }
                        }
                    }
                });
            }
        });

        assert!(cache.is_coherent());
        assert!(cache.len() <= 3);

        let mut entries = Vec::new();
        cache.for_each(|entry| {
            entries.push(entry.clone());
            true
        });
        for entry in entries {
            assert_eq!(cache.peek(entry.path.as_str()), Some(entry));
        }
    }

    proptest! {
        #[test]
        fn index_stays_coherent(ops in proptest::collection::vec((0u8..6, 0u8..6, any::<bool>()), 1..64)) {
            let cache = cache(3);

            for (name, path, delete) in ops {
                let value = item(&format!("n{name}"), &format!("p{path}"), 0);
                if delete {
                    cache.delete(&value);
                } else {
                    let _ = cache.add(value);
                }

                prop_assert!(cache.is_coherent());
                prop_assert!(cache.len() <= 3);
            }
        }
    }
}
