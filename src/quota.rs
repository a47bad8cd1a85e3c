use std::num::NonZeroU32;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::nanos::Nanos;

/// A token bucket quota.
///
/// Quotas are expressed in a positive number of tokens per minute (the refill rate) and a
/// positive number of tokens that a bucket can hold at most (its capacity, or burst size).
///
/// Neither the rate nor the capacity may be zero.
///
/// # Burst sizes
/// A quota given as `Quota::per_minute(60)` has a capacity of 60 tokens, meaning it is possible
/// to consume 60 tokens in one go, followed by a minute of waiting for them to come back. The
/// capacity can be adjusted independently of the rate with [`Quota::allow_burst`].
///
/// # Examples
///
/// Construct a quota that adds 5 tokens per minute (one every 12 seconds), with a capacity of
/// 10 tokens:
/// ```rust
/// # use limits::Quota;
/// # use nonzero_ext::nonzero;
/// # use std::time::Duration;
/// let q = Quota::per_minute(nonzero!(5u32)).allow_burst(nonzero!(10u32));
/// assert_eq!(q.replenish_interval(), Duration::from_secs(12));
/// assert_eq!(q.capacity().get(), 10);
/// assert_eq!(q.burst_size_replenished_in(), Duration::from_secs(120));
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Quota {
    pub(crate) capacity: NonZeroU32,
    pub(crate) rate: NonZeroU32,
}

/// Constructors for Quotas
impl Quota {
    /// Construct a quota for a number of tokens added per 60-second period. The given number
    /// of tokens is also assumed to be the bucket's capacity.
    pub const fn per_minute(rate: NonZeroU32) -> Quota {
        Quota {
            capacity: rate,
            rate,
        }
    }

    /// Adjusts the capacity of a quota, so that a full bucket holds at most the given number
    /// of tokens.
    pub const fn allow_burst(self, capacity: NonZeroU32) -> Quota {
        Quota { capacity, ..self }
    }

    /// Construct a quota from a raw capacity and a raw rate (in tokens per minute).
    ///
    /// Returns an error if either of them is zero.
    pub fn try_new(capacity: u32, rate: u32) -> Result<Quota, ConfigError> {
        let capacity = NonZeroU32::new(capacity).ok_or(ConfigError::ZeroCapacity)?;
        let rate = NonZeroU32::new(rate).ok_or(ConfigError::ZeroRate)?;
        Ok(Quota::per_minute(rate).allow_burst(capacity))
    }
}

/// Retrieving information about a quota
impl Quota {
    /// The maximum number of tokens a bucket can hold.
    pub const fn capacity(&self) -> NonZeroU32 {
        self.capacity
    }

    /// The number of tokens added to a bucket per minute.
    pub const fn rate_per_minute(&self) -> NonZeroU32 {
        self.rate
    }

    /// The time it takes to add a single token to a bucket.
    pub fn replenish_interval(&self) -> Duration {
        Nanos::to_accrue(1, self.rate.get()).into()
    }

    /// The time it takes to refill an empty bucket up to its capacity.
    pub fn burst_size_replenished_in(&self) -> Duration {
        Nanos::to_accrue(self.capacity.get(), self.rate.get()).into()
    }
}
