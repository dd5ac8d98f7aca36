//! Listing builder (C4) and canonical order (C5).

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::warn;

use crate::error::DecafError;
use crate::hash::xxh3_64;
use crate::tree::{EntryKind, SourceEntry, TreeSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal = 0,
    Executable = 1,
    Link = 2,
    BareDirectory = 3,
}

impl Mode {
    pub fn from_byte(b: u8) -> Result<Self, DecafError> {
        match b {
            0 => Ok(Mode::Normal),
            1 => Ok(Mode::Executable),
            2 => Ok(Mode::Link),
            3 => Ok(Mode::BareDirectory),
            other => Err(DecafError::BadMode(other)),
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone)]
pub struct Listing {
    pub path: String,
    pub mode: Mode,
    pub content: Vec<u8>,
    pub content_size: u64,
    pub checksum: u64,
    pub bundle_index: u64,
    pub bundle_offset: u64,
}

impl Listing {
    fn new(path: String, mode: Mode, content: Vec<u8>) -> Self {
        let checksum = match mode {
            Mode::Link => 0,
            _ => xxh3_64(&content),
        };
        let content_size = content.len() as u64;
        Listing {
            path,
            mode,
            content,
            content_size,
            checksum,
            bundle_index: 0,
            bundle_offset: 0,
        }
    }
}

// The wire `total_length` field (archive/mod.rs) is `LISTING_FIXED_SIZE +
// path_len` cast to u16, so a path can be at most `u16::MAX -
// LISTING_FIXED_SIZE` bytes before that cast silently wraps.
const MAX_PATH_LEN: usize = u16::MAX as usize - crate::archive::LISTING_FIXED_SIZE as usize;

fn validate_path(path: &str) -> Result<(), DecafError> {
    if path.len() > MAX_PATH_LEN {
        return Err(DecafError::PathTooLong { path: path.to_string() });
    }
    if path.starts_with('/') {
        return Err(DecafError::InvalidPath { path: path.to_string() });
    }
    for component in path.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(DecafError::InvalidPath { path: path.to_string() });
        }
    }
    Ok(())
}

/// Joins a symlink's raw target onto the symlink's own directory and
/// resolves `.`/`..`, returning the result as a path relative to the apex.
/// Returns `None` if the target escapes the apex.
fn resolve_link_target(symlink_relpath: &str, raw_target: &str) -> Option<String> {
    let normalized = raw_target.replace('\\', "/");
    if normalized.starts_with('/') || normalized.contains(':') {
        // Absolute paths (POSIX or Windows-drive) cannot be apex-relative.
        return None;
    }

    let mut stack: Vec<&str> = symlink_relpath
        .rsplit_once('/')
        .map(|(parent, _)| parent.split('/').filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    for component in normalized.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                if stack.pop().is_none() {
                    return None;
                }
            }
            other => stack.push(other),
        }
    }

    Some(stack.join("/"))
}

pub struct ListingBuilder;

impl ListingBuilder {
    /// Walks `source`, classifies every entry per §4.4, and returns listings
    /// in source order (not yet canonicalized — call `sort_listings` next).
    pub fn build(source: &dyn TreeSource) -> Result<Vec<Listing>, DecafError> {
        let entries = source.walk()?;
        let mut seen = HashSet::new();
        let mut listings = Vec::with_capacity(entries.len());

        let is_nonempty_dir = |dir_path: &str| -> bool {
            let prefix = format!("{dir_path}/");
            entries.iter().any(|e| e.relpath != dir_path && e.relpath.starts_with(&prefix))
        };

        for entry in &entries {
            if let Some(listing) = Self::classify(source, entry, &is_nonempty_dir)? {
                validate_path(&listing.path)?;
                if !seen.insert(listing.path.clone()) {
                    return Err(DecafError::DuplicatePath { path: listing.path.clone() });
                }
                listings.push(listing);
            }
        }
        Ok(listings)
    }

    fn classify(
        source: &dyn TreeSource,
        entry: &SourceEntry,
        is_nonempty_dir: &dyn Fn(&str) -> bool,
    ) -> Result<Option<Listing>, DecafError> {
        match entry.kind {
            EntryKind::Directory => {
                if is_nonempty_dir(&entry.relpath) {
                    Ok(None)
                } else {
                    Ok(Some(Listing::new(entry.relpath.clone(), Mode::BareDirectory, Vec::new())))
                }
            }
            EntryKind::File => {
                if !entry.owner_readable || !entry.owner_writable {
                    warn!(path = %entry.relpath, "skipping file: missing owner read/write bit");
                    return Ok(None);
                }
                let bytes = source.read_file(&entry.relpath)?;
                let mode = if entry.owner_executable { Mode::Executable } else { Mode::Normal };
                Ok(Some(Listing::new(entry.relpath.clone(), mode, bytes)))
            }
            EntryKind::Symlink => {
                let raw_target = source.read_link(&entry.relpath)?;
                let Some(target) = resolve_link_target(&entry.relpath, &raw_target) else {
                    warn!(path = %entry.relpath, "skipping symlink: target escapes apex");
                    return Ok(None);
                };
                match source.stat(&target)? {
                    None => {
                        warn!(path = %entry.relpath, "skipping symlink: target does not exist");
                        Ok(None)
                    }
                    Some(EntryKind::Symlink) => {
                        warn!(path = %entry.relpath, "skipping symlink: target is itself a symlink");
                        Ok(None)
                    }
                    Some(_) => Ok(Some(Listing::new(entry.relpath.clone(), Mode::Link, target.into_bytes()))),
                }
            }
        }
    }
}

fn sort_key(listing: &Listing) -> (u64, usize, &[u8]) {
    (listing.content_size, listing.path.len(), listing.path.as_bytes())
}

fn compare(a: &Listing, b: &Listing) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

/// Sorts listings into canonical order: `(content_size, path_length, path_bytes)`
/// ascending. Paths are unique (enforced at build time) so no two listings
/// ever compare fully equal here.
pub fn sort_listings(listings: &mut [Listing]) {
    listings.sort_by(compare);
}
