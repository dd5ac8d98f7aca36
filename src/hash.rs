//! XXH3-64 hashing primitive.
//!
//! DeCAF layers the same hash at four points: listing content, uncompressed
//! bundle content, and the whole archive (both at write time and again on
//! verify). This module is the single place that touches `xxhash_rust`.

use xxhash_rust::xxh3::{Xxh3, xxh3_64 as xxh3_64_oneshot};

/// XXH3-64 digest of a byte slice.
#[inline]
pub fn xxh3_64(bytes: &[u8]) -> u64 {
    xxh3_64_oneshot(bytes)
}

/// Incremental XXH3-64, used while a bundle's content is being assembled
/// from listing bytes so the whole buffer doesn't need a second pass.
#[derive(Default)]
pub struct Xxh3Hasher(Xxh3);

impl Xxh3Hasher {
    pub fn new() -> Self {
        Self(Xxh3::new())
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    pub fn finish(&self) -> u64 {
        self.0.digest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert_eq!(xxh3_64(b""), xxh3_64_oneshot(b""));
    }

    #[test]
    fn incremental_matches_oneshot() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mut h = Xxh3Hasher::new();
        h.update(&data[..10]);
        h.update(&data[10..]);
        assert_eq!(h.finish(), xxh3_64(data));
    }

    #[test]
    fn distinct_inputs_differ() {
        assert_ne!(xxh3_64(b"a"), xxh3_64(b"b"));
    }
}
