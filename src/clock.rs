//! Time sources for token bucket containers.
//!
//! The time sources contained in this module allow the container to be driven by a real
//! clock in production, and by a mock clock (see [`FakeRelativeClock`]) in tests, so that
//! refill behavior can be checked without waiting for wall-clock minutes to pass.

use std::convert::TryInto;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::nanos::Nanos;

/// A measurement from a clock.
pub trait Reference: Sized + PartialEq + Eq + Ord + Copy + Clone + Send + Sync + Debug {
    /// Determines the time that separates two measurements of a
    /// clock. Implementations of this must perform a saturating
    /// subtraction - if the `earlier` timestamp should be later,
    /// `duration_since` must return the zero duration.
    fn duration_since(&self, earlier: Self) -> Nanos;
}

/// A time source used by token bucket containers.
pub trait Clock: Clone {
    /// A measurement of a monotonically increasing clock.
    type Instant: Reference;

    /// Returns a measurement of the clock.
    fn now(&self) -> Self::Instant;
}

impl Reference for Duration {
    fn duration_since(&self, earlier: Self) -> Nanos {
        self.checked_sub(earlier)
            .unwrap_or_else(|| Duration::new(0, 0))
            .into()
    }
}

impl Reference for Nanos {
    fn duration_since(&self, earlier: Self) -> Nanos {
        (*self).saturating_sub(earlier)
    }
}

/// A mock implementation of a clock. All it does is keep track of
/// what "now" is (relative to some point meaningful to the program),
/// and returns that.
///
/// # Thread safety
/// The mock time is represented as an atomic u64 count of nanoseconds, behind an [`Arc`].
/// Clones of this clock will all show the same time, even if the original advances.
#[derive(Debug, Clone, Default)]
pub struct FakeRelativeClock {
    now: Arc<AtomicU64>,
}

impl FakeRelativeClock {
    /// Advances the fake clock by the given amount.
    ///
    /// # Panics
    /// Panics if `by` does not fit into 64 bits of nanoseconds (about 584 years).
    pub fn advance(&self, by: Duration) {
        let by: u64 = by
            .as_nanos()
            .try_into()
            .expect("Can not represent times past ~584 years");
        self.now.fetch_add(by, Ordering::AcqRel);
    }
}

impl PartialEq for FakeRelativeClock {
    fn eq(&self, other: &Self) -> bool {
        self.now.load(Ordering::Relaxed) == other.now.load(Ordering::Relaxed)
    }
}

impl Clock for FakeRelativeClock {
    type Instant = Nanos;

    fn now(&self) -> Self::Instant {
        self.now.load(Ordering::Relaxed).into()
    }
}

mod with_std;
pub use with_std::*;

#[cfg(feature = "quanta")]
mod quanta;
#[cfg(feature = "quanta")]
pub use self::quanta::*;

mod default;
pub use default::*;
