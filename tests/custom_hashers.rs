use limits::{clock::FakeRelativeClock, state::LruStateStore, MemBucket, Quota};
use nonzero_ext::nonzero;
use std::hash::{BuildHasher, Hasher};
use std::time::Duration;

#[derive(Clone, Default, Debug)]
struct BadHasher;

impl Hasher for BadHasher {
    fn finish(&self) -> u64 {
        4 // chosen by fair dice roll
    }

    fn write(&mut self, _: &[u8]) {}
}

#[derive(Clone, Default, Debug)]
struct BadHasherBuilder;

impl BuildHasher for BadHasherBuilder {
    type Hasher = BadHasher;

    fn build_hasher(&self) -> Self::Hasher {
        BadHasher
    }
}

#[derive(Clone, Default, Debug)]
struct CustomHasher {
    value: u64,
}

impl Hasher for CustomHasher {
    fn finish(&self) -> u64 {
        self.value.wrapping_mul(0x517cc1b727220a95)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.value = self.value.wrapping_add(b as u64);
        }
    }
}

#[derive(Clone, Default, Debug)]
struct CustomHasherBuilder;

impl BuildHasher for CustomHasherBuilder {
    type Hasher = CustomHasher;

    fn build_hasher(&self) -> Self::Hasher {
        CustomHasher::default()
    }
}

macro_rules! test_container {
    ($hasher_type:ty, $test_name:ident) => {
        #[test]
        fn $test_name() {
            let clock = FakeRelativeClock::default();
            let store = LruStateStore::with_hasher(nonzero!(2usize), <$hasher_type>::default());
            let lb = MemBucket::with_store(
                Quota::per_minute(nonzero!(60u32)).allow_burst(nonzero!(2u32)),
                store,
                clock.clone(),
            );

            for key in &[1u32, 2u32] {
                assert!(lb.consume(key, 2).is_admitted());
                assert!(!lb.consume(key, 1).is_admitted());
                clock.advance(Duration::from_secs(1));
                assert!(lb.consume(key, 1).is_admitted());
            }

            // Colliding hashes must not merge clients, and eviction still picks the
            // least recently used one:
            assert!(lb.consume(&3u32, 2).is_admitted());
            assert_eq!(lb.len(), 2);
            assert!(!lb.consume(&3u32, 1).is_admitted());
            assert_eq!(lb.consume(&1u32, 0).remaining(), 2);
        }
    };
}

test_container!(BadHasherBuilder, bad_hasher);
test_container!(CustomHasherBuilder, custom_hasher);
