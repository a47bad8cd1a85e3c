//! A bounded map that evicts its least recently used entry.
//!
//! [`LruCache`] is a plain (not thread-safe) data structure;
//! [`LruStateStore`][crate::state::LruStateStore] puts it behind a lock for use by containers.
//!
//! Entries live in a `Vec`, linked into a doubly-linked recency list by index; a hash map
//! points from each key to its entry's index. All operations except [`LruCache::retain`]
//! run in constant time.

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::mem;
use std::num::NonZeroUsize;

const NIL: usize = usize::MAX;

struct Entry<K, V> {
    key: K,
    value: V,
    /// The next more recently used entry.
    prev: usize,
    /// The next less recently used entry.
    next: usize,
}

/// A map holding at most a fixed number of entries.
///
/// Reading an entry with [`get`](LruCache::get) or writing it with
/// [`put`](LruCache::put) marks it as the most recently used one. Once the cache is full,
/// putting a new key evicts the least recently used entry.
///
/// ```rust
/// # use limits::state::lru::LruCache;
/// # use nonzero_ext::nonzero;
/// let mut cache = LruCache::new(nonzero!(2usize));
/// cache.put("a", 1);
/// cache.put("b", 2);
/// assert_eq!(cache.get(&"a"), Some(&1));
/// // "b" is now the least recently used entry:
/// assert_eq!(cache.put("c", 3), Some(("b", 2)));
/// assert!(!cache.contains(&"b"));
/// ```
pub struct LruCache<K, V, S = RandomState> {
    map: HashMap<K, usize, S>,
    entries: Vec<Entry<K, V>>,
    /// The most recently used entry.
    head: usize,
    /// The least recently used entry.
    tail: usize,
    cap: NonZeroUsize,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Creates an empty cache that holds at most `cap` entries.
    pub fn new(cap: NonZeroUsize) -> Self {
        LruCache::with_hasher(cap, RandomState::default())
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher> LruCache<K, V, S> {
    /// Creates an empty cache that holds at most `cap` entries, hashing keys with `hasher`.
    pub fn with_hasher(cap: NonZeroUsize, hasher: S) -> Self {
        LruCache {
            map: HashMap::with_hasher(hasher),
            entries: Vec::new(),
            head: NIL,
            tail: NIL,
            cap,
        }
    }

    /// The maximum number of entries.
    pub fn cap(&self) -> NonZeroUsize {
        self.cap
    }

    /// The number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the cache holds an entry for `key`. Does not update recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Returns the value for `key`, marking it as the most recently used entry.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.touch(idx);
        Some(&self.entries[idx].value)
    }

    /// Returns the value for `key` mutably, marking it as the most recently used entry.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.touch(idx);
        Some(&mut self.entries[idx].value)
    }

    /// Returns the value for `key` without changing its recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        Some(&self.entries[idx].value)
    }

    /// Inserts `value` at `key` as the most recently used entry.
    ///
    /// If `key` was present already, its old key and value are returned. Otherwise, if the
    /// cache was full, the least recently used entry is evicted to make room and returned.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.map.get(&key) {
            self.touch(idx);
            let entry = &mut self.entries[idx];
            let old_value = mem::replace(&mut entry.value, value);
            let old_key = mem::replace(&mut entry.key, key);
            return Some((old_key, old_value));
        }

        let evicted = if self.len() >= self.cap.get() {
            self.pop_lru()
        } else {
            None
        };
        let idx = self.entries.len();
        self.map.insert(key.clone(), idx);
        self.entries.push(Entry {
            key,
            value,
            prev: NIL,
            next: NIL,
        });
        self.attach_front(idx);
        evicted
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        if self.tail == NIL {
            return None;
        }
        Some(self.remove_at(self.tail))
    }

    /// Removes the entry for `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        Some(self.remove_at(idx).1)
    }

    /// Removes all entries for which `keep` returns `false`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut idx = 0;
        while idx < self.entries.len() {
            let entry = &mut self.entries[idx];
            if keep(&entry.key, &mut entry.value) {
                idx += 1;
            } else {
                // The last entry moves into `idx`, so look at the same index again.
                self.remove_at(idx);
            }
        }
    }

    /// Iterates over the entries from the most to the least recently used one.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            if cursor == NIL {
                return None;
            }
            let entry = &self.entries[cursor];
            cursor = entry.next;
            Some((&entry.key, &entry.value))
        })
    }

    fn touch(&mut self, idx: usize) {
        if self.head != idx {
            self.detach(idx);
            self.attach_front(idx);
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.entries[idx].prev, self.entries[idx].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.entries[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.entries[next].prev = prev;
        }
    }

    fn attach_front(&mut self, idx: usize) {
        self.entries[idx].prev = NIL;
        self.entries[idx].next = self.head;
        if self.head == NIL {
            self.tail = idx;
        } else {
            self.entries[self.head].prev = idx;
        }
        self.head = idx;
    }

    /// Unlinks the entry at `idx` and swap-removes it from the entry list.
    fn remove_at(&mut self, idx: usize) -> (K, V) {
        self.detach(idx);
        let entry = self.entries.swap_remove(idx);
        if idx < self.entries.len() {
            // Re-point everything that referred to the moved entry at its new index.
            let (prev, next) = (self.entries[idx].prev, self.entries[idx].next);
            if prev == NIL {
                self.head = idx;
            } else {
                self.entries[prev].next = idx;
            }
            if next == NIL {
                self.tail = idx;
            } else {
                self.entries[next].prev = idx;
            }
            if let Some(slot) = self.map.get_mut(&self.entries[idx].key) {
                *slot = idx;
            }
        }
        self.map.remove(&entry.key);
        (entry.key, entry.value)
    }
}

impl<K, V, S> fmt::Debug for LruCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.entries.len())
            .field("cap", &self.cap)
            .finish()
    }
}
