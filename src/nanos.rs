//! A time-keeping abstraction (nanoseconds) that works for storing in an atomic integer.

use std::convert::TryInto;
use std::fmt;
use std::ops::{Add, Sub};
use std::time::Duration;

/// A number of nanoseconds from a reference point.
///
/// Can not represent durations >584 years, but hopefully that
/// should not be a problem in real-world applications.
#[derive(PartialEq, Eq, Default, Clone, Copy, PartialOrd, Ord)]
pub struct Nanos(u64);

impl Nanos {
    /// The number of nanoseconds in one minute, the unit that refill rates are given in.
    pub(crate) const MINUTE: Nanos = Nanos(60 * 1_000_000_000);

    pub(crate) const fn new(u: u64) -> Self {
        Nanos(u)
    }

    pub(crate) fn saturating_sub(self, rhs: Nanos) -> Nanos {
        Nanos(self.0.saturating_sub(rhs.0))
    }

    /// The number of whole `per_minute` units that accrue in this span of time.
    ///
    /// Rounds down, and saturates at `u32::MAX`.
    pub(crate) fn accrued(self, per_minute: u32) -> u32 {
        let accrued = u128::from(self.0) * u128::from(per_minute) / u128::from(Self::MINUTE.0);
        accrued.try_into().unwrap_or(u32::MAX)
    }

    /// The time it takes for `units` to accrue at `per_minute`, rounded up to the next
    /// nanosecond.
    pub(crate) fn to_accrue(units: u32, per_minute: u32) -> Nanos {
        let minute = u128::from(Self::MINUTE.0);
        let rate = u128::from(per_minute);
        let ns = (u128::from(units) * minute + rate - 1) / rate;
        Nanos(ns.try_into().unwrap_or(u64::MAX))
    }
}

impl From<Duration> for Nanos {
    fn from(d: Duration) -> Self {
        // This will panic:
        Nanos(
            d.as_nanos()
                .try_into()
                .expect("Duration is longer than 584 years"),
        )
    }
}

impl fmt::Debug for Nanos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let d = Duration::from_nanos(self.0);
        write!(f, "Nanos({:?})", d)
    }
}

impl From<u64> for Nanos {
    fn from(u: u64) -> Self {
        Nanos(u)
    }
}

impl From<Nanos> for u64 {
    fn from(n: Nanos) -> Self {
        n.0
    }
}

impl From<Nanos> for Duration {
    fn from(n: Nanos) -> Self {
        Duration::from_nanos(n.0)
    }
}

impl Add<Nanos> for Nanos {
    type Output = Nanos;

    fn add(self, rhs: Nanos) -> Self::Output {
        Nanos(self.0 + rhs.0)
    }
}

impl Sub<Nanos> for Nanos {
    type Output = Nanos;

    fn sub(self, rhs: Nanos) -> Self::Output {
        Nanos(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nanos_impls() {
        let n = Nanos::new(5);
        assert_eq!("Nanos(5ns)", format!("{:?}", n));
        assert_eq!(u64::from(n), 5);
        assert_eq!(Duration::from(n), Duration::from_nanos(5));
        assert_eq!(Nanos::from(Duration::from_secs(1)), Nanos::new(1_000_000_000));
    }

    #[test]
    fn accrues_whole_units_only() {
        let half_minute = Nanos::from(Duration::from_secs(30));
        assert_eq!(half_minute.accrued(5), 2);
        assert_eq!(half_minute.accrued(1), 0);
        assert_eq!(Nanos::MINUTE.accrued(60), 60);
        assert_eq!(Nanos::new(u64::MAX).accrued(u32::MAX), u32::MAX);
    }

    #[test]
    fn time_to_accrue_rounds_up() {
        assert_eq!(Nanos::to_accrue(1, 60), Nanos::from(Duration::from_secs(1)));
        assert_eq!(Nanos::to_accrue(0, 60), Nanos::new(0));
        assert_eq!(Nanos::to_accrue(1, 7), Nanos::new(8_571_428_572));
    }

    #[test]
    fn saturating_ops() {
        assert_eq!(Nanos::new(1).saturating_sub(Nanos::new(2)), Nanos::new(0));
        assert_eq!(Nanos::new(3) - Nanos::new(2), Nanos::new(1));
        assert_eq!(Nanos::new(3) + Nanos::new(2), Nanos::new(5));
    }
}
