use std::fmt;
use std::fmt::Debug;

use parking_lot::Mutex;

use crate::bucket::Bucket;

#[derive(Default)]
struct Slot {
    bucket: Option<Bucket>,
    /// Set once the state has been dropped from its store; no further updates land here.
    detached: bool,
}

/// An in-memory representation of a single client's bucket.
///
/// The bucket sits behind its own lock, so that the refill-then-deduct step of a decision
/// is serialized per client while decisions for other clients proceed in parallel. A state
/// that has been allocated but not measured yet holds no bucket.
///
/// A state that a store removes while another thread still holds a handle to it is marked
/// detached under the bucket lock. Updates to a detached state are refused and handed back,
/// so the caller can look up the key again.
#[derive(Default)]
pub(crate) struct InMemoryState(Mutex<Slot>);

impl InMemoryState {
    /// Updates the bucket, unless the state is detached; then `f` is returned untouched.
    pub(crate) fn measure_and_replace_one<T, F>(&self, f: F) -> Result<T, F>
    where
        F: FnOnce(Option<Bucket>) -> (T, Bucket),
    {
        let mut slot = self.0.lock();
        if slot.detached {
            return Err(f);
        }
        let (result, next) = f(slot.bucket.take());
        slot.bucket = Some(next);
        Ok(result)
    }

    /// Replaces the bucket, unless the state is detached; then `f` is returned untouched.
    pub(crate) fn replace_one<F>(&self, f: F) -> Result<(), F>
    where
        F: FnOnce(Option<Bucket>) -> Bucket,
    {
        let mut slot = self.0.lock();
        if slot.detached {
            return Err(f);
        }
        let next = f(slot.bucket.take());
        slot.bucket = Some(next);
        Ok(())
    }

    /// Checks the bucket with `keep` and detaches the state if it is rejected.
    ///
    /// States without a bucket are always kept. Returns whether the state was kept.
    pub(crate) fn keep_or_detach<F>(&self, keep: F) -> bool
    where
        F: FnOnce(&Bucket) -> bool,
    {
        let mut guard = self.0.lock();
        let slot = &mut *guard;
        let rejected = match &slot.bucket {
            Some(bucket) => !keep(bucket),
            None => false,
        };
        if rejected {
            slot.detached = true;
        }
        !rejected
    }

    /// Returns a copy of the current bucket, if one has been stored.
    pub(crate) fn snapshot(&self) -> Option<Bucket> {
        self.0.lock().bucket
    }

    #[cfg(test)]
    pub(crate) fn is_detached(&self) -> bool {
        self.0.lock().detached
    }
}

impl Debug for InMemoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "InMemoryState({:?})", self.snapshot())
    }
}
