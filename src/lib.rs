//! # DeCAF
//!
//! DeCAF (Deterministic Compressed Archive Format) is an archive codec
//! whose defining property is bijective determinism over file content: any
//! set of (path, mode, bytes) tuples maps to exactly one canonical byte
//! sequence, and any valid archive maps back to exactly one such set.
//!
//! ## Key modules
//!
//! - [`hash`]: xxHash3-64, the integrity primitive layered at every level.
//! - [`codec`]: zstd level-3 compress/decompress.
//! - [`tree`]: the `TreeSource`/`TreeSink` capability interfaces.
//! - [`listing`]: classification, path validation, and canonical ordering.
//! - [`bundle`]: greedy packing of listing content into ~10 MiB bundles.
//! - [`archive`]: the writer — assembles the on-disk byte layout.
//! - [`extract`]: the reader — verifies and materializes an archive.
//!
//! ## Example
//!
//! ```no_run
//! use decaf::tree::{FsTreeSource, FsTreeSink};
//!
//! let source = FsTreeSource::new("some/directory");
//! let bytes = decaf::archive(&source)?;
//!
//! let mut sink = FsTreeSink::new("some/output");
//! decaf::unarchive(&bytes, &mut sink)?;
//! # Ok::<(), decaf::error::DecafError>(())
//! ```

pub mod archive;
pub mod bundle;
pub mod cli;
pub mod codec;
pub mod error;
pub mod extract;
pub mod fsx;
pub mod hash;
pub mod listing;
pub mod tree;

pub use error::DecafError;
use tree::{TreeSink, TreeSource};

/// Canonicalizes `source`, packs it into bundles, and serializes the
/// result into a byte-identical-on-any-host DeCAF archive.
pub fn archive(source: &dyn TreeSource) -> Result<Vec<u8>, DecafError> {
    archive::write_archive(source)
}

/// Parses and verifies `bytes` as a DeCAF archive, materializing its
/// contents via `sink`.
pub fn unarchive(bytes: &[u8], sink: &mut dyn TreeSink) -> Result<(), DecafError> {
    extract::read_archive(bytes, sink)
}
