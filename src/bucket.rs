use std::cmp;
use std::fmt;
use std::time::Duration;

use tracing::trace;

use crate::nanos::Nanos;
use crate::state::StateStore;
use crate::Quota;

/// The token state of a single client.
///
/// `last_refill` is measured in nanoseconds since the container was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    tokens: u32,
    last_refill: Nanos,
}

impl Bucket {
    pub(crate) fn full(capacity: u32, now: Nanos) -> Self {
        Bucket {
            tokens: capacity,
            last_refill: now,
        }
    }

    /// The number of tokens in the bucket as of its last access.
    pub fn tokens(&self) -> u32 {
        self.tokens
    }

    /// The time of the bucket's last access, relative to the container's creation.
    pub fn last_refill(&self) -> Nanos {
        self.last_refill
    }
}

/// The outcome of consuming tokens from a bucket.
///
/// A decision is never an error: a request that can not be admitted yet is
/// communicated through [`Decision::is_admitted`] returning `false`, together with
/// an estimate of when to try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    remaining: u32,
    wait: u32,
    wait_time: Duration,
    admitted: bool,
}

impl Decision {
    /// Whether the tokens were deducted from the bucket.
    pub fn is_admitted(&self) -> bool {
        self.admitted
    }

    /// The number of tokens left in the bucket after this decision.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// The estimated wait in whole minutes.
    ///
    /// On a negative decision, this is the number of full minutes it takes for the missing
    /// tokens to accrue. On a positive decision, it is the number of full minutes it takes to
    /// refill an empty bucket. The value is rounded down, so a client backing off for this
    /// long may still be turned away; see [`Decision::wait_time`] for an exact figure.
    pub fn wait(&self) -> u32 {
        self.wait
    }

    /// The exact time it takes for the tokens that [`Decision::wait`] accounts for to accrue.
    ///
    /// Refill progress is measured from a bucket's last access, so this only holds if the
    /// client does not touch its bucket in the meantime.
    pub fn wait_time(&self) -> Duration {
        self.wait_time
    }

    /// Splits the decision into `(remaining, wait, admitted)`.
    pub fn into_parts(self) -> (u32, u32, bool) {
        (self.remaining, self.wait, self.admitted)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        if self.admitted {
            write!(f, "admitted, {} tokens remaining", self.remaining)
        } else {
            write!(
                f,
                "throttled for {:?}, {} tokens remaining",
                self.wait_time, self.remaining
            )
        }
    }
}

/// The parameters of the token bucket algorithm, derived from a [`Quota`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct TokenBucket {
    /// The maximum number of tokens a bucket holds.
    capacity: u32,

    /// Tokens added per minute of elapsed time.
    rate: u32,
}

impl TokenBucket {
    pub(crate) fn new(quota: Quota) -> Self {
        TokenBucket {
            capacity: quota.capacity.get(),
            rate: quota.rate.get(),
        }
    }

    pub(crate) fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Adds the whole tokens that accrued since the bucket's last access.
    ///
    /// Fractional progress is dropped: the bucket's last access moves to `now` whether or not
    /// any tokens were added.
    pub(crate) fn refill(&self, bucket: Bucket, now: Nanos) -> Bucket {
        let mut tokens = bucket.tokens;
        if tokens < self.capacity {
            let elapsed = now.saturating_sub(bucket.last_refill);
            tokens = cmp::min(
                self.capacity,
                tokens.saturating_add(elapsed.accrued(self.rate)),
            );
        }
        Bucket {
            tokens,
            last_refill: cmp::max(bucket.last_refill, now),
        }
    }

    /// Whether a bucket would be back at capacity if it were accessed at `now`.
    pub(crate) fn is_replenished(&self, bucket: &Bucket, now: Nanos) -> bool {
        self.refill(*bucket, now).tokens >= self.capacity
    }

    fn decision(&self, remaining: u32, needed: u32, admitted: bool) -> Decision {
        Decision {
            remaining,
            wait: needed / self.rate,
            wait_time: Nanos::to_accrue(needed, self.rate).into(),
            admitted,
        }
    }

    /// Tests whether `n` tokens can be taken from the bucket at `key` and deducts them, if so.
    ///
    /// A bucket that does not exist yet starts out full.
    pub(crate) fn test_n_and_update<K, S: StateStore<Key = K>>(
        &self,
        key: &K,
        n: u32,
        state: &S,
        now: Nanos,
    ) -> Decision {
        let decision = state.measure_and_replace(key, |bucket| {
            let bucket = match bucket {
                Some(bucket) => self.refill(bucket, now),
                None => Bucket::full(self.capacity, now),
            };
            if bucket.tokens < n {
                let needed = n - bucket.tokens;
                (self.decision(bucket.tokens, needed, false), bucket)
            } else {
                let bucket = Bucket {
                    tokens: bucket.tokens - n,
                    ..bucket
                };
                (self.decision(bucket.tokens, self.capacity, true), bucket)
            }
        });
        trace!(
            n,
            remaining = decision.remaining,
            admitted = decision.admitted,
            "consume"
        );
        decision
    }

    /// Fills up the bucket at `key`, if there is one.
    pub(crate) fn reset<K, S: StateStore<Key = K>>(&self, key: &K, state: &S, now: Nanos) -> bool {
        state.replace_existing(key, |bucket| {
            let last_refill = bucket.map_or(now, |b| cmp::max(b.last_refill, now));
            Bucket {
                tokens: self.capacity,
                last_refill,
            }
        })
    }
}
