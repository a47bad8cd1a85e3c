//! # limits - per-client token bucket rate limiting
//!
//! This crate decides, for a client key and a number of tokens, whether a request should be
//! admitted now, and if not, how long the client should wait. Every client gets its own
//! token bucket: a bucket holds up to a fixed number of tokens (its capacity), requests take
//! tokens out of it, and tokens flow back in at a fixed rate per minute.
//!
//! Buckets are kept in memory, in a bounded cache that evicts the least recently used
//! client's bucket once a configured number of clients is tracked. A client whose bucket was
//! evicted starts over with a full bucket.
//!
//! # Quick example
//!
//! Let's allow each client a burst of 10 requests, refilled at 5 requests per minute,
//! tracking at most 100 clients:
//!
//! ```rust
//! use limits::{Quota, MemBucket};
//! use nonzero_ext::nonzero;
//!
//! let lim = MemBucket::new(
//!     nonzero!(100usize),
//!     Quota::per_minute(nonzero!(5u32)).allow_burst(nonzero!(10u32)),
//! );
//! let key = "203.0.113.7".to_string();
//!
//! let decision = lim.consume(&key, 3);
//! assert!(decision.is_admitted());
//! assert_eq!(decision.remaining(), 7);
//!
//! let decision = lim.consume(&key, 10);
//! assert!(!decision.is_admitted());
//! assert_eq!(decision.remaining(), 7);
//! // 3 more tokens at 5 per minute take 36 seconds:
//! assert_eq!(decision.wait_time().as_secs(), 36);
//! ```
//!
//! # Refill
//!
//! Each time a bucket is accessed, it receives the whole tokens that accrued since its last
//! access, and its last access moves to the current time. Fractions of a token are dropped:
//! a client that keeps asking more often than one token's worth of time gets nothing back
//! until it slows down.
//!
//! # Time
//!
//! Containers measure time with a [`clock::Clock`]. The default clock is monotonic; tests
//! can use a [`clock::FakeRelativeClock`] and advance it by hand:
//!
//! ```rust
//! # use limits::{clock::FakeRelativeClock, Quota, MemBucket};
//! # use nonzero_ext::nonzero;
//! # use std::time::Duration;
//! let clock = FakeRelativeClock::default();
//! let lim = MemBucket::with_clock(nonzero!(100usize), Quota::per_minute(nonzero!(60u32)), clock.clone());
//! assert!(lim.consume(&"client", 60).is_admitted());
//! assert!(!lim.consume(&"client", 1).is_admitted());
//! clock.advance(Duration::from_secs(1));
//! assert!(lim.consume(&"client", 1).is_admitted());
//! ```
//!
//! # Logging
//!
//! Decisions, evictions and resets are reported through [`tracing`] at `trace` and `debug`
//! level. The crate never installs a subscriber.

#![deny(missing_docs)]

pub mod clock;
pub mod state;

mod bucket;
mod container;
mod errors;
mod nanos;
mod quota;

pub use bucket::{Bucket, Decision};
pub use container::{Container, MemBucket, DEFAULT_MAX_KEYS};
pub use errors::ConfigError;
pub use nanos::Nanos;
pub use quota::Quota;
