//! Filesystem-backed round-trip tests: write a real directory tree, archive
//! it, extract the archive into a second directory, and compare.

use std::fs;
use std::path::Path;

use decaf::tree::{FsTreeSink, FsTreeSource};

fn extract_to(bytes: &[u8], dir: &Path) {
    let mut sink = FsTreeSink::new(dir);
    decaf::unarchive(bytes, &mut sink).expect("unarchive should succeed");
}

#[test]
fn round_trips_a_small_tree() {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("a.txt"), b"hello").unwrap();
    fs::create_dir(src.path().join("sub")).unwrap();
    fs::write(src.path().join("sub/b.txt"), b"world").unwrap();
    fs::create_dir(src.path().join("empty")).unwrap();

    let source = FsTreeSource::new(src.path());
    let bytes = decaf::archive(&source).unwrap();

    let out = tempfile::tempdir().unwrap();
    extract_to(&bytes, out.path());

    assert_eq!(fs::read(out.path().join("a.txt")).unwrap(), b"hello");
    assert_eq!(fs::read(out.path().join("sub/b.txt")).unwrap(), b"world");
    assert!(out.path().join("empty").is_dir());
}

#[cfg(unix)]
#[test]
fn round_trips_executable_bit_and_symlink() {
    use std::os::unix::fs::PermissionsExt;

    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("run.sh"), b"#!/bin/sh\necho hi\n").unwrap();
    fs::set_permissions(src.path().join("run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
    fs::write(src.path().join("target.txt"), b"t").unwrap();
    std::os::unix::fs::symlink("target.txt", src.path().join("link.txt")).unwrap();

    let source = FsTreeSource::new(src.path());
    let bytes = decaf::archive(&source).unwrap();

    let out = tempfile::tempdir().unwrap();
    extract_to(&bytes, out.path());

    let run_meta = fs::metadata(out.path().join("run.sh")).unwrap();
    assert_eq!(run_meta.permissions().mode() & 0o777, 0o755);

    let link_target = fs::read_link(out.path().join("link.txt")).unwrap();
    assert_eq!(link_target, Path::new("target.txt"));
}

#[test]
fn archiving_twice_is_byte_identical() {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("a"), b"x").unwrap();
    fs::write(src.path().join("bb"), b"x").unwrap();
    fs::write(src.path().join("ccc"), vec![0u8; 20_000]).unwrap();

    let source = FsTreeSource::new(src.path());
    let first = decaf::archive(&source).unwrap();
    let second = decaf::archive(&source).unwrap();
    assert_eq!(first, second);
}

#[test]
fn idempotent_across_a_round_trip() {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("a"), b"one").unwrap();
    fs::create_dir(src.path().join("dir")).unwrap();
    fs::write(src.path().join("dir/b"), b"two").unwrap();

    let source = FsTreeSource::new(src.path());
    let archived = decaf::archive(&source).unwrap();

    let out = tempfile::tempdir().unwrap();
    extract_to(&archived, out.path());

    let reread_source = FsTreeSource::new(out.path());
    let rearchived = decaf::archive(&reread_source).unwrap();

    assert_eq!(archived, rearchived);
}
