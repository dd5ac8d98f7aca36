//! Compression primitive: zstd level 3, no dictionary, single-shot frames.
//!
//! Kept deliberately thin — everything downstream treats a bundle's
//! compressed bytes as an opaque, self-describing zstd frame and always
//! passes an explicit upper bound to `decompress`, derived from the
//! listing data recorded in the archive, never an unbounded call.

use crate::error::DecafError;

/// The level the whole format commits to. Producers that need bit-identical
/// archives across hosts must also pin the same `zstd`/libzstd version this
/// crate links against.
pub const COMPRESSION_LEVEL: i32 = 3;

pub fn compress(data: &[u8]) -> Result<Vec<u8>, DecafError> {
    zstd::bulk::compress(data, COMPRESSION_LEVEL).map_err(|_| DecafError::CompressionFailure)
}

/// Decompress a zstd frame, trusting `expected_size` as an upper bound on
/// the output rather than letting zstd allocate unbounded memory for a
/// hostile or truncated frame.
pub fn decompress(data: &[u8], expected_size: usize) -> Result<Vec<u8>, DecafError> {
    zstd::bulk::decompress(data, expected_size).map_err(|_| DecafError::DecompressionFailure)
}
