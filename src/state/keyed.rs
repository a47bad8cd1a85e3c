use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::bucket::Bucket;
use crate::state::lru::LruCache;
use crate::state::{InMemoryState, ShrinkableStateStore, StateStore};

/// A thread-safe keyed state store that tracks at most a fixed number of clients.
///
/// Buckets are kept in an [`LruCache`] behind a lock that covers only the lookup,
/// insertion and eviction of entries. Each bucket has its own lock, which is taken after
/// the cache lock is released, so that decisions for different clients do not wait on
/// one another's arithmetic.
///
/// Once `max_keys` clients are tracked, making a decision for a new client evicts the
/// least recently used client's bucket. An evicted client starts over with a full bucket.
pub struct LruStateStore<K, S = RandomState> {
    cache: Mutex<LruCache<K, Arc<InMemoryState>, S>>,
}

impl<K: Hash + Eq + Clone> LruStateStore<K> {
    /// Constructs a state store tracking at most `max_keys` clients.
    pub fn new(max_keys: NonZeroUsize) -> Self {
        LruStateStore::with_hasher(max_keys, RandomState::default())
    }
}

impl<K: Hash + Eq + Clone, S: BuildHasher> LruStateStore<K, S> {
    /// Constructs a state store tracking at most `max_keys` clients, hashing keys with
    /// `hasher`.
    pub fn with_hasher(max_keys: NonZeroUsize, hasher: S) -> Self {
        LruStateStore {
            cache: Mutex::new(LruCache::with_hasher(max_keys, hasher)),
        }
    }

    /// The maximum number of clients tracked at a time.
    pub fn max_keys(&self) -> NonZeroUsize {
        self.cache.lock().cap()
    }

    /// Returns the bucket for `key` without touching it, if the key is tracked.
    pub fn peek(&self, key: &K) -> Option<Bucket> {
        let state = self.cache.lock().peek(key).map(Arc::clone)?;
        state.snapshot()
    }

    fn get_or_insert(&self, key: &K) -> Arc<InMemoryState> {
        let mut cache = self.cache.lock();
        if let Some(state) = cache.get(key) {
            // fast path: a bucket is already present for the key.
            return Arc::clone(state);
        }
        let state = Arc::new(InMemoryState::default());
        if cache.put(key.clone(), Arc::clone(&state)).is_some() {
            debug!(
                max_keys = cache.cap().get(),
                "evicted least recently used bucket"
            );
        }
        state
    }
}

impl<K: Hash + Eq + Clone, S: BuildHasher> StateStore for LruStateStore<K, S> {
    type Key = K;

    fn measure_and_replace<T, F>(&self, key: &Self::Key, f: F) -> T
    where
        F: FnOnce(Option<Bucket>) -> (T, Bucket),
    {
        let mut f = f;
        loop {
            // A detached state was dropped by `retain` after we looked it up; look again.
            match self.get_or_insert(key).measure_and_replace_one(f) {
                Ok(result) => return result,
                Err(unused) => f = unused,
            }
        }
    }

    fn replace_existing<F>(&self, key: &Self::Key, f: F) -> bool
    where
        F: FnOnce(Option<Bucket>) -> Bucket,
    {
        let mut f = f;
        loop {
            let state = self.cache.lock().get(key).map(Arc::clone);
            match state.map(|state| state.replace_one(f)) {
                None => return false,
                Some(Ok(())) => return true,
                Some(Err(unused)) => f = unused,
            }
        }
    }
}

impl<K: Hash + Eq + Clone, S: BuildHasher> ShrinkableStateStore for LruStateStore<K, S> {
    fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&Bucket) -> bool,
    {
        let mut cache = self.cache.lock();
        // Removed states are detached under their own lock, so that a decision that got
        // hold of one before it was removed is redone on the key's current state.
        cache.retain(|_, state| state.keep_or_detach(&mut keep));
    }

    fn len(&self) -> usize {
        self.cache.lock().len()
    }

    fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

impl<K, S> fmt::Debug for LruStateStore<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruStateStore")
            .field("cache", &*self.cache.lock())
            .finish()
    }
}
