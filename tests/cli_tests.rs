//! Integration tests for the CLI interface
//!
//! Tests the entry point and argument parsing; nothing here talks to a
//! backend.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_requires_a_command() {
    let mut cmd = Command::cargo_bin("storyreel").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = Command::cargo_bin("storyreel").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"));
}

#[test]
fn test_create_help() {
    let mut cmd = Command::cargo_bin("storyreel").unwrap();
    cmd.arg("create")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--narrative"))
        .stdout(predicate::str::contains("--style"));
}

#[test]
fn test_create_requires_narrative() {
    let mut cmd = Command::cargo_bin("storyreel").unwrap();
    cmd.arg("create")
        .arg("a.jpg")
        .arg("b.jpg")
        .arg("c.jpg")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--narrative"));
}

#[test]
fn test_create_rejects_unknown_style() {
    let mut cmd = Command::cargo_bin("storyreel").unwrap();
    cmd.arg("create")
        .arg("a.jpg")
        .arg("b.jpg")
        .arg("c.jpg")
        .arg("--narrative")
        .arg("a narrative that is long enough to pass")
        .arg("--style")
        .arg("baroque")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_create_rejects_too_few_photos() {
    let mut cmd = Command::cargo_bin("storyreel").unwrap();
    cmd.arg("create")
        .arg("a.jpg")
        .arg("b.jpg")
        .arg("--narrative")
        .arg("a narrative that is long enough to pass")
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 3 and 10 photos"));
}

#[test]
fn test_create_rejects_short_narrative() {
    let mut cmd = Command::cargo_bin("storyreel").unwrap();
    cmd.arg("create")
        .arg("a.jpg")
        .arg("b.jpg")
        .arg("c.jpg")
        .arg("--narrative")
        .arg("too short")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 20 characters"));
}

#[test]
fn test_status_requires_project_id() {
    let mut cmd = Command::cargo_bin("storyreel").unwrap();
    cmd.arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PROJECT_ID"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("storyreel").unwrap();
    cmd.arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}
