use std::fmt;

/// Error indicating that a container was configured with a parameter that can never
/// admit anything.
///
/// Only returned by the constructors that take raw integers; the constructors taking
/// [`NonZeroU32`][std::num::NonZeroU32] and [`NonZeroUsize`][std::num::NonZeroUsize] can not
/// fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The bound on distinct tracked clients was zero.
    ZeroMaxKeys,
    /// The per-client token capacity was zero.
    ZeroCapacity,
    /// The refill rate (tokens per minute) was zero.
    ZeroRate,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            ConfigError::ZeroMaxKeys => "maximum number of keys",
            ConfigError::ZeroCapacity => "bucket capacity",
            ConfigError::ZeroRate => "refill rate",
        };
        write!(f, "{} must be greater than zero", what)
    }
}

impl std::error::Error for ConfigError {}
