//! State stores for token bucket containers.
//!
//! A state store keeps one [`Bucket`] per client key, and is responsible for making
//! updates to a single bucket atomic with respect to concurrent updates to the same
//! bucket. This crate ships one state store, the [`LruStateStore`], which bounds the
//! number of tracked clients by evicting the least recently used bucket.

pub mod lru;

mod in_memory;
mod keyed;

use crate::bucket::Bucket;
pub(crate) use in_memory::InMemoryState;
pub use keyed::LruStateStore;

/// A way for containers to keep per-client state.
pub trait StateStore {
    /// The type of key that the state store can represent.
    type Key;

    /// Updates a state store's bucket for a given key, using the given closure.
    ///
    /// The closure parameter takes the old bucket at the key's location (or `None` if no
    /// bucket existed for the key yet), and returns an arbitrary result along with the
    /// bucket that replaces it.
    ///
    /// It is `measure_and_replace`'s job to ensure that no other update to the same key's
    /// bucket happens between reading the old bucket and storing the new one. Updates to
    /// different keys may run in parallel.
    fn measure_and_replace<T, F>(&self, key: &Self::Key, f: F) -> T
    where
        F: FnOnce(Option<Bucket>) -> (T, Bucket);

    /// Replaces the bucket for a given key using the given closure, but only if the key is
    /// already tracked by the state store.
    ///
    /// Returns whether the key was present.
    fn replace_existing<F>(&self, key: &Self::Key, f: F) -> bool
    where
        F: FnOnce(Option<Bucket>) -> Bucket;
}

/// Keyed state stores that can be inspected and shrunk in order to save memory.
pub trait ShrinkableStateStore: StateStore {
    /// Removes all buckets for which `keep` returns `false`.
    fn retain<F>(&self, keep: F)
    where
        F: FnMut(&Bucket) -> bool;

    /// Returns the number of buckets held in the state store.
    fn len(&self) -> usize;

    /// Returns `true` if the state store holds no buckets.
    fn is_empty(&self) -> bool;
}
