//! End-to-end tests of the `zipdir` command line.

mod common;

use common::{sample_project, zipdir_cmd};
use predicates::prelude::*;
use std::fs;
use std::io::{Cursor, Read};
use tempfile::tempdir;

#[test]
fn test_help_mentions_flags() {
    zipdir_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--in"))
        .stdout(predicate::str::contains("--out"));
}

#[test]
fn test_missing_required_flags_is_usage_error() {
    zipdir_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--in"));

    let temp_dir = tempdir().unwrap();
    let proj = sample_project(temp_dir.path());
    zipdir_cmd()
        .arg("-i")
        .arg(&proj)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--out"));
}

#[test]
fn test_pack_then_unpack_scenario() {
    let temp_dir = tempdir().unwrap();
    let proj = sample_project(temp_dir.path());
    let out = temp_dir.path().join("out.zip");
    let restored = temp_dir.path().join("restored");

    zipdir_cmd()
        .arg("-i")
        .arg(&proj)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("packed"));
    assert!(out.is_file());

    zipdir_cmd()
        .arg("--unpack")
        .arg("--in")
        .arg(&out)
        .arg("--out")
        .arg(&restored)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(restored.join("readme.txt")).unwrap(), "hello");
    assert_eq!(fs::read_to_string(restored.join("src/main.ext")).unwrap(), "body");
}

#[test]
fn test_packed_archive_is_standard_zip() {
    let temp_dir = tempdir().unwrap();
    let proj = sample_project(temp_dir.path());
    let out = temp_dir.path().join("out.zip");

    zipdir_cmd()
        .args(["-q", "-i"])
        .arg(&proj)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let mut archive = zip::ZipArchive::new(Cursor::new(fs::read(&out).unwrap())).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, vec!["readme.txt", "src/main.ext"]);

    let mut body = String::new();
    archive
        .by_name("src/main.ext")
        .unwrap()
        .read_to_string(&mut body)
        .unwrap();
    assert_eq!(body, "body");
}

#[test]
fn test_list_prints_members() {
    let temp_dir = tempdir().unwrap();
    let proj = sample_project(temp_dir.path());
    let out = temp_dir.path().join("out.zip");

    zipdir_cmd().arg("-i").arg(&proj).arg("-o").arg(&out).assert().success();

    zipdir_cmd()
        .arg("-l")
        .arg("-i")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("readme.txt"))
        .stdout(predicate::str::contains("src/main.ext"))
        .stdout(predicate::str::contains("2 files"));
}

#[test]
fn test_input_not_a_directory_fails_before_writing() {
    let temp_dir = tempdir().unwrap();
    let out = temp_dir.path().join("out.zip");

    zipdir_cmd()
        .arg("-i")
        .arg(temp_dir.path().join("missing"))
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a directory"));
    assert!(!out.exists());
}

#[test]
fn test_corrupt_archive_reports_error() {
    let temp_dir = tempdir().unwrap();
    let bogus = temp_dir.path().join("bogus.zip");
    fs::write(&bogus, b"this is not a zip archive").unwrap();

    zipdir_cmd()
        .arg("-u")
        .arg("-i")
        .arg(&bogus)
        .arg("-o")
        .arg(temp_dir.path().join("dest"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid archive"));
}

#[test]
fn test_output_inside_input_warns() {
    let temp_dir = tempdir().unwrap();
    let proj = sample_project(temp_dir.path());

    zipdir_cmd()
        .arg("-i")
        .arg(&proj)
        .arg("-o")
        .arg(proj.join("self.zip"))
        .assert()
        .success()
        .stderr(predicate::str::contains("inside the input directory"));
}
