//! # Forge CLI Main Integration Tests
//!
//! File: cli/tests/main_tests.rs
//!
//! ## Overview
//!
//! Top-level behaviour of the `forge` binary: `--version`, `--help`, and the
//! exit status for an unknown subcommand.
//!

mod common;
use common::*;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_version_flag() {
    let home = tempdir().unwrap();
    forge_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("forge "));
}

#[test]
fn test_help_lists_command_groups() {
    let home = tempdir().unwrap();
    forge_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("blueprint")
                .and(predicate::str::contains("serve")),
        );
}

#[test]
fn test_blueprint_help_lists_subcommands() {
    let home = tempdir().unwrap();
    forge_cmd(home.path())
        .args(["b", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("info"))
                .and(predicate::str::contains("validate"))
                .and(predicate::str::contains("create")),
        );
}

#[test]
fn test_unknown_subcommand_fails() {
    let home = tempdir().unwrap();
    forge_cmd(home.path())
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
