//! The error taxonomy for archive construction and parsing.
//!
//! Every variant here is fatal to the current `archive`/`unarchive` call —
//! nothing in this crate recovers from one of these internally.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecafError {
    #[error("not a DeCAF archive: bad magic bytes")]
    BadMagic,

    #[error("archive checksum mismatch")]
    BadArchiveChecksum,

    #[error("bundle {index} checksum mismatch")]
    BadBundleChecksum { index: u64 },

    #[error("content checksum mismatch for '{path}'")]
    BadContentChecksum { path: String },

    #[error("mode byte {0} is not a valid DeCAF mode")]
    BadMode(u8),

    #[error("archive is truncated")]
    Truncated,

    #[error("zstd decompression failed")]
    DecompressionFailure,

    #[error("zstd compression failed")]
    CompressionFailure,

    #[error("reading from tree source failed at '{path}': {source}")]
    SourceIOError {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("writing to tree sink failed at '{path}': {source}")]
    SinkIOError {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("path '{path}' exceeds the maximum encodable path length")]
    PathTooLong { path: String },

    #[error("invalid path '{path}'")]
    InvalidPath { path: String },

    #[error("duplicate path '{path}' after canonicalization")]
    DuplicatePath { path: String },
}

impl DecafError {
    pub fn source_io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        DecafError::SourceIOError { source, path: path.into() }
    }

    pub fn sink_io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        DecafError::SinkIOError { source, path: path.into() }
    }
}
