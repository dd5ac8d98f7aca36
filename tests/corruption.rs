//! Checksum-layering tests: mutating an archive after its 16-byte prefix
//! must always be caught, never silently accepted.

use std::fs;

use decaf::tree::{FsTreeSink, FsTreeSource};
use decaf::DecafError;

fn build_sample_archive() -> Vec<u8> {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("a.txt"), b"hello world, this is sample content").unwrap();
    fs::write(src.path().join("b.txt"), vec![42u8; 4096]).unwrap();
    let source = FsTreeSource::new(src.path());
    decaf::archive(&source).unwrap()
}

#[test]
fn corrupting_archive_checksum_byte_is_detected() {
    let mut bytes = build_sample_archive();
    bytes[17] ^= 0xFF;
    let out = tempfile::tempdir().unwrap();
    let mut sink = FsTreeSink::new(out.path());
    let err = decaf::unarchive(&bytes, &mut sink).unwrap_err();
    assert!(matches!(err, DecafError::BadArchiveChecksum));
}

#[test]
fn corrupting_any_data_byte_is_always_caught() {
    let bytes = build_sample_archive();
    for offset in (16..bytes.len()).step_by(97) {
        let mut mutated = bytes.clone();
        mutated[offset] ^= 0xFF;
        let out = tempfile::tempdir().unwrap();
        let mut sink = FsTreeSink::new(out.path());
        let result = decaf::unarchive(&mutated, &mut sink);
        assert!(
            result.is_err(),
            "mutating byte {offset} after the prefix should never be silently accepted"
        );
    }
}

#[test]
fn truncated_archive_is_rejected() {
    let bytes = build_sample_archive();
    let truncated = &bytes[..bytes.len() / 2];
    let out = tempfile::tempdir().unwrap();
    let mut sink = FsTreeSink::new(out.path());
    let err = decaf::unarchive(truncated, &mut sink).unwrap_err();
    assert!(matches!(err, DecafError::BadArchiveChecksum | DecafError::Truncated));
}

#[test]
fn bad_magic_is_rejected() {
    let mut bytes = build_sample_archive();
    bytes[0] = !bytes[0];
    let out = tempfile::tempdir().unwrap();
    let mut sink = FsTreeSink::new(out.path());
    let err = decaf::unarchive(&bytes, &mut sink).unwrap_err();
    assert!(matches!(err, DecafError::BadMagic));
}
