//! End-to-end tests of the `decaf` binary: archive a directory, then
//! extract the archive it produced, and confirm the round trip.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn archives_and_extracts_a_directory() {
    let workdir = tempfile::tempdir().unwrap();
    let input = workdir.path().join("payload");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("note.txt"), b"a small file").unwrap();

    let archive_path = workdir.path().join("out.df");
    Command::cargo_bin("decaf")
        .unwrap()
        .current_dir(workdir.path())
        .arg(&input)
        .arg("-o")
        .arg(&archive_path)
        .assert()
        .success();
    assert!(archive_path.exists());

    let extract_dir = workdir.path().join("extracted");
    Command::cargo_bin("decaf")
        .unwrap()
        .current_dir(workdir.path())
        .arg(&archive_path)
        .arg("-o")
        .arg(&extract_dir)
        .assert()
        .success();

    assert_eq!(fs::read(extract_dir.join("note.txt")).unwrap(), b"a small file");
}

#[test]
fn stat_failure_on_missing_path_exits_with_code_two() {
    let workdir = tempfile::tempdir().unwrap();
    Command::cargo_bin("decaf")
        .unwrap()
        .current_dir(workdir.path())
        .arg("does-not-exist")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("failed to stat input path"));
}

#[test]
fn missing_positional_argument_exits_with_code_one() {
    Command::cargo_bin("decaf").unwrap().assert().code(1);
}
