//! Tree source / sink (C3): the capability interfaces that decouple the
//! codec from the host filesystem. `archive`/`unarchive` only ever talk to
//! these traits, never to `std::fs` directly, so the codec can be exercised
//! against an in-memory fixture in tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::DecafError;
use crate::fsx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

/// One entry yielded by `TreeSource::walk`. Order is unspecified; the
/// codec is responsible for canonicalizing.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub relpath: String,
    pub kind: EntryKind,
    pub owner_readable: bool,
    pub owner_writable: bool,
    pub owner_executable: bool,
}

pub trait TreeSource {
    fn walk(&self) -> Result<Vec<SourceEntry>, DecafError>;
    fn read_file(&self, relpath: &str) -> Result<Vec<u8>, DecafError>;
    /// Raw link target in whatever representation the platform stores.
    fn read_link(&self, relpath: &str) -> Result<String, DecafError>;
    /// `None` if nothing exists at `relpath`.
    fn stat(&self, relpath: &str) -> Result<Option<EntryKind>, DecafError>;
}

pub trait TreeSink {
    fn make_dirs_for(&mut self, path: &str) -> Result<(), DecafError>;
    fn create_bare_dir(&mut self, path: &str) -> Result<(), DecafError>;
    fn create_symlink(&mut self, target_relpath: &str, link_path: &str) -> Result<(), DecafError>;
    fn create_file(&mut self, path: &str, mode_bits: u32, bytes: &[u8]) -> Result<(), DecafError>;
}

/// Filesystem-backed source rooted at a directory on disk.
pub struct FsTreeSource {
    root: PathBuf,
}

impl FsTreeSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn abs(&self, relpath: &str) -> PathBuf {
        self.root.join(relpath)
    }
}

impl TreeSource for FsTreeSource {
    fn walk(&self) -> Result<Vec<SourceEntry>, DecafError> {
        let mut entries = Vec::new();
        for dent in jwalk::WalkDir::new(&self.root).sort(false) {
            let dent = dent.map_err(|e| DecafError::source_io(e.into(), self.root.clone()))?;
            let path = dent.path();
            if path == self.root {
                continue;
            }
            let relative = path.strip_prefix(&self.root).expect("jwalk yields paths under root");
            let relpath_str = relative.as_os_str().to_str().ok_or_else(|| DecafError::InvalidPath {
                path: relative.to_string_lossy().into_owned(),
            })?;
            let relpath = relpath_str.replace(std::path::MAIN_SEPARATOR, "/");

            let metadata = std::fs::symlink_metadata(&path)
                .map_err(|e| DecafError::source_io(e, path.clone()))?;
            let file_type = metadata.file_type();

            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };

            let mode = fsx::unix_mode(&metadata);
            let (owner_readable, owner_writable, owner_executable) = if fsx::maybe_unix_mode(&metadata).is_some() {
                (mode & 0o400 != 0, mode & 0o200 != 0, mode & 0o100 != 0)
            } else {
                (true, true, false)
            };

            entries.push(SourceEntry {
                relpath,
                kind,
                owner_readable,
                owner_writable,
                owner_executable,
            });
        }
        Ok(entries)
    }

    fn read_file(&self, relpath: &str) -> Result<Vec<u8>, DecafError> {
        let path = self.abs(relpath);
        std::fs::read(&path).map_err(|e| DecafError::source_io(e, path))
    }

    fn read_link(&self, relpath: &str) -> Result<String, DecafError> {
        let path = self.abs(relpath);
        let target = std::fs::read_link(&path).map_err(|e| DecafError::source_io(e, path))?;
        target
            .to_str()
            .map(str::to_owned)
            .ok_or_else(|| DecafError::InvalidPath { path: target.to_string_lossy().into_owned() })
    }

    fn stat(&self, relpath: &str) -> Result<Option<EntryKind>, DecafError> {
        let path = self.abs(relpath);
        match std::fs::symlink_metadata(&path) {
            Ok(md) => {
                let ft = md.file_type();
                Ok(Some(if ft.is_symlink() {
                    EntryKind::Symlink
                } else if ft.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DecafError::source_io(e, path)),
        }
    }
}

/// Filesystem-backed sink rooted at a directory on disk. The directory is
/// created on first write if it doesn't already exist.
pub struct FsTreeSink {
    root: PathBuf,
}

impl FsTreeSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn abs(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl TreeSink for FsTreeSink {
    fn make_dirs_for(&mut self, path: &str) -> Result<(), DecafError> {
        let target = self.abs(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DecafError::sink_io(e, parent.to_path_buf()))?;
        }
        Ok(())
    }

    fn create_bare_dir(&mut self, path: &str) -> Result<(), DecafError> {
        let target = self.abs(path);
        std::fs::create_dir_all(&target).map_err(|e| DecafError::sink_io(e, target))
    }

    fn create_symlink(&mut self, target_relpath: &str, link_path: &str) -> Result<(), DecafError> {
        let link = self.abs(link_path);
        symlink_impl(target_relpath, &link).map_err(|e| DecafError::sink_io(e, link))
    }

    fn create_file(&mut self, path: &str, mode_bits: u32, bytes: &[u8]) -> Result<(), DecafError> {
        let target = self.abs(path);
        std::fs::write(&target, bytes).map_err(|e| DecafError::sink_io(e, target.clone()))?;
        fsx::set_unix_permissions(&target, mode_bits).map_err(|e| DecafError::sink_io(e, target))
    }
}

#[cfg(unix)]
fn symlink_impl(target: &str, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink_impl(target: &str, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(all(test, unix))]
mod fs_source_tests {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    use super::*;

    #[test]
    fn non_utf8_filename_is_rejected_at_the_source() {
        let root = tempfile::tempdir().unwrap();
        // 0xFF is never valid as a standalone UTF-8 byte.
        let bad_name = OsStr::from_bytes(b"bad-\xffname");
        std::fs::write(root.path().join(bad_name), b"x").unwrap();

        let source = FsTreeSource::new(root.path());
        let err = source.walk().unwrap_err();
        assert!(matches!(err, DecafError::InvalidPath { .. }));
    }
}

/// In-memory tree fixture used by unit tests so the codec can be exercised
/// without touching the real filesystem.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemTree {
    pub files: BTreeMap<String, (Vec<u8>, bool)>, // path -> (bytes, owner_executable)
    pub dirs: BTreeMap<String, bool>,              // path -> is_empty
    pub links: BTreeMap<String, String>,            // path -> raw target
}

#[cfg(test)]
impl MemTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: &[u8], executable: bool) -> Self {
        self.files.insert(path.to_string(), (content.to_vec(), executable));
        self
    }

    pub fn with_empty_dir(mut self, path: &str) -> Self {
        self.dirs.insert(path.to_string(), true);
        self
    }

    pub fn with_link(mut self, path: &str, raw_target: &str) -> Self {
        self.links.insert(path.to_string(), raw_target.to_string());
        self
    }
}

#[cfg(test)]
impl TreeSource for MemTree {
    fn walk(&self) -> Result<Vec<SourceEntry>, DecafError> {
        let mut entries = Vec::new();
        for (path, is_empty) in &self.dirs {
            if *is_empty {
                entries.push(SourceEntry {
                    relpath: path.clone(),
                    kind: EntryKind::Directory,
                    owner_readable: true,
                    owner_writable: true,
                    owner_executable: true,
                });
            }
        }
        for (path, (_, executable)) in &self.files {
            entries.push(SourceEntry {
                relpath: path.clone(),
                kind: EntryKind::File,
                owner_readable: true,
                owner_writable: true,
                owner_executable: *executable,
            });
        }
        for path in self.links.keys() {
            entries.push(SourceEntry {
                relpath: path.clone(),
                kind: EntryKind::Symlink,
                owner_readable: true,
                owner_writable: true,
                owner_executable: false,
            });
        }
        Ok(entries)
    }

    fn read_file(&self, relpath: &str) -> Result<Vec<u8>, DecafError> {
        self.files
            .get(relpath)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| DecafError::source_io(std::io::Error::from(std::io::ErrorKind::NotFound), relpath))
    }

    fn read_link(&self, relpath: &str) -> Result<String, DecafError> {
        self.links
            .get(relpath)
            .cloned()
            .ok_or_else(|| DecafError::source_io(std::io::Error::from(std::io::ErrorKind::NotFound), relpath))
    }

    fn stat(&self, relpath: &str) -> Result<Option<EntryKind>, DecafError> {
        if self.files.contains_key(relpath) {
            Ok(Some(EntryKind::File))
        } else if self.dirs.contains_key(relpath) {
            Ok(Some(EntryKind::Directory))
        } else if self.links.contains_key(relpath) {
            Ok(Some(EntryKind::Symlink))
        } else {
            Ok(None)
        }
    }
}

/// In-memory sink pairing with `MemTree`, capturing what would have been
/// materialized on a filesystem.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemSink {
    pub files: BTreeMap<String, (Vec<u8>, u32)>,
    pub bare_dirs: Vec<String>,
    pub symlinks: BTreeMap<String, String>,
}

#[cfg(test)]
impl TreeSink for MemSink {
    fn make_dirs_for(&mut self, _path: &str) -> Result<(), DecafError> {
        Ok(())
    }

    fn create_bare_dir(&mut self, path: &str) -> Result<(), DecafError> {
        self.bare_dirs.push(path.to_string());
        Ok(())
    }

    fn create_symlink(&mut self, target_relpath: &str, link_path: &str) -> Result<(), DecafError> {
        self.symlinks.insert(link_path.to_string(), target_relpath.to_string());
        Ok(())
    }

    fn create_file(&mut self, path: &str, mode_bits: u32, bytes: &[u8]) -> Result<(), DecafError> {
        self.files.insert(path.to_string(), (bytes.to_vec(), mode_bits));
        Ok(())
    }
}
