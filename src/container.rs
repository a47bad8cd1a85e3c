use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;

use nonzero_ext::nonzero;
use tracing::debug;

use crate::bucket::{Decision, TokenBucket};
use crate::clock::{self, Reference};
use crate::errors::ConfigError;
use crate::nanos::Nanos;
use crate::state::{LruStateStore, ShrinkableStateStore, StateStore};
use crate::Quota;

/// The number of clients tracked by a container constructed with [`MemBucket::keyed`].
pub const DEFAULT_MAX_KEYS: NonZeroUsize = nonzero!(1024usize);

/// Objects that implement `Container` can serve as token bucket containers.
pub trait Container {
    /// The type of client key that buckets are tracked by.
    type Key;

    /// Returns the maximum number of tokens per client.
    fn capacity(&self) -> u32;

    /// Takes `n` tokens from the bucket for `key`, if it holds that many.
    fn consume(&self, key: &Self::Key, n: u32) -> Decision;

    /// Fills up the bucket for `key` regardless of time and count.
    fn reset(&self, key: &Self::Key);
}

/// A [`Container`] keeping buckets in memory.
///
/// `MemBucket` is meant for single-host applications: it is `Send` and `Sync`, and can be
/// shared between threads with an [`Arc`][std::sync::Arc]. It is generic over the type of
/// key (`K`), the state store that holds the buckets (`S`, an LRU-bounded store by default)
/// and the clock (`C`) that time is measured with.
pub struct MemBucket<K = String, S = LruStateStore<K>, C = clock::DefaultClock>
where
    S: StateStore<Key = K>,
    C: clock::Clock,
{
    state: S,
    bucket: TokenBucket,
    quota: Quota,
    clock: C,
    start: C::Instant,
}

/// # Containers - Constructors
impl<K> MemBucket<K, LruStateStore<K>, clock::DefaultClock>
where
    K: Hash + Eq + Clone,
{
    /// Constructs a new container tracking at most `max_keys` clients, using the default
    /// clock.
    pub fn new(max_keys: NonZeroUsize, quota: Quota) -> Self {
        MemBucket::with_clock(max_keys, quota, clock::DefaultClock::default())
    }

    /// Constructs a new container tracking at most [`DEFAULT_MAX_KEYS`] clients.
    pub fn keyed(quota: Quota) -> Self {
        MemBucket::new(DEFAULT_MAX_KEYS, quota)
    }

    /// Constructs a new container from raw integers: the maximum number of clients tracked,
    /// the capacity of each client's bucket and the rate (in tokens per minute) at which
    /// buckets refill.
    ///
    /// Returns an error if any of them is zero.
    pub fn try_new(max_keys: usize, capacity: u32, rate: u32) -> Result<Self, ConfigError> {
        let max_keys = NonZeroUsize::new(max_keys).ok_or(ConfigError::ZeroMaxKeys)?;
        let quota = Quota::try_new(capacity, rate)?;
        Ok(MemBucket::new(max_keys, quota))
    }
}

impl<K, C> MemBucket<K, LruStateStore<K>, C>
where
    K: Hash + Eq + Clone,
    C: clock::Clock,
{
    /// Constructs a new container tracking at most `max_keys` clients, with a custom clock.
    pub fn with_clock(max_keys: NonZeroUsize, quota: Quota, clock: C) -> Self {
        MemBucket::with_store(quota, LruStateStore::new(max_keys), clock)
    }

    /// The maximum number of clients tracked at a time.
    pub fn max_keys(&self) -> NonZeroUsize {
        self.state.max_keys()
    }
}

impl<K, S, C> MemBucket<K, S, C>
where
    S: StateStore<Key = K>,
    C: clock::Clock,
{
    /// Constructs a new container from a quota, a state store and a clock.
    pub fn with_store(quota: Quota, state: S, clock: C) -> Self {
        let start = clock.now();
        debug!(
            capacity = quota.capacity.get(),
            rate_per_minute = quota.rate.get(),
            "constructed token bucket container"
        );
        MemBucket {
            state,
            bucket: TokenBucket::new(quota),
            quota,
            clock,
            start,
        }
    }

    fn now(&self) -> Nanos {
        self.clock.now().duration_since(self.start)
    }

    /// Returns the maximum number of tokens per client.
    pub fn capacity(&self) -> u32 {
        self.bucket.capacity()
    }

    /// Returns the quota this container was constructed with.
    pub fn quota(&self) -> Quota {
        self.quota
    }

    /// Returns a reference to the container's clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Takes `n` tokens from the bucket for `key`, if it holds that many.
    ///
    /// The bucket first receives the whole tokens that accrued since its last access; a
    /// client seen for the first time (or for the first time since its bucket was evicted)
    /// gets a full bucket. If the bucket then holds at least `n` tokens, they are deducted
    /// and the decision is positive. Otherwise the bucket is left as it is, and the decision
    /// says how long it will take for the missing tokens to accrue.
    ///
    /// Asking for more tokens than [`capacity`](MemBucket::capacity) never succeeds.
    pub fn consume(&self, key: &K, n: u32) -> Decision {
        self.bucket.test_n_and_update(key, n, &self.state, self.now())
    }

    /// Fills up the bucket for `key` regardless of time and count.
    ///
    /// Does nothing if no bucket is tracked for `key`; such a client gets a full bucket on
    /// its next request anyway.
    pub fn reset(&self, key: &K) {
        if self.bucket.reset(key, &self.state, self.now()) {
            debug!("reset bucket to capacity");
        }
    }
}

/// # Containers - Housekeeping
impl<K, S, C> MemBucket<K, S, C>
where
    S: ShrinkableStateStore<Key = K>,
    C: clock::Clock,
{
    /// Removes the buckets of clients that have been idle long enough to be back at capacity.
    ///
    /// A client whose bucket was removed gets a full bucket on its next request, so this
    /// does not change any decision; it only frees memory and room in the state store.
    pub fn retain_recent(&self) {
        let now = self.now();
        let before = self.state.len();
        self.state.retain(|bucket| !self.bucket.is_replenished(bucket, now));
        debug!(
            dropped = before.saturating_sub(self.state.len()),
            "dropped replenished buckets"
        );
    }

    /// Returns the number of clients tracked.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    /// Returns `true` if no clients are tracked.
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

impl<K, S, C> Container for MemBucket<K, S, C>
where
    S: StateStore<Key = K>,
    C: clock::Clock,
{
    type Key = K;

    fn capacity(&self) -> u32 {
        MemBucket::capacity(self)
    }

    fn consume(&self, key: &K, n: u32) -> Decision {
        MemBucket::consume(self, key, n)
    }

    fn reset(&self, key: &K) {
        MemBucket::reset(self, key)
    }
}

impl<K, S, C> fmt::Debug for MemBucket<K, S, C>
where
    S: StateStore<Key = K> + fmt::Debug,
    C: clock::Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemBucket")
            .field("quota", &self.quota)
            .field("state", &self.state)
            .field("start", &self.start)
            .finish()
    }
}
