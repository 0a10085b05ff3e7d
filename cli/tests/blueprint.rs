//! # Forge CLI Blueprint Integration Tests
//!
//! File: cli/tests/blueprint.rs
//!
//! ## Overview
//!
//! Integration tests for the `forge blueprint` subcommand group (`list`,
//! `info`, `validate`, `create`), run against the compiled binary with
//! fixture blueprints in a temporary directory.
//!

mod common;
use common::*;
use forge::common::archive::tar::unpack_tree;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

/// # Test Blueprint List Empty (`test_blueprint_list_empty`)
///
/// An empty blueprint directory is not an error; `list` says so and exits 0.
#[test]
fn test_blueprint_list_empty() {
    let home = tempdir().unwrap();
    let empty = tempdir().unwrap();

    forge_cmd(home.path())
        .args(["blueprint", "list"])
        .env("FORGE_BLUEPRINTS_DIR", empty.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No blueprints found"));
}

#[test]
fn test_blueprint_list_shows_fixtures() {
    let home = tempdir().unwrap();
    let blueprints = fixture_blueprints();

    forge_cmd(home.path())
        .args(["blueprint", "--blueprints"])
        .arg(blueprints.path())
        .arg("list")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Available Blueprints")
                .and(predicate::str::contains("go-api"))
                .and(predicate::str::contains("rust-cli"))
                .and(predicate::str::contains("Found 2 blueprint(s).")),
        );
}

#[test]
fn test_blueprint_list_missing_directory_fails() {
    let home = tempdir().unwrap();

    forge_cmd(home.path())
        .args(["blueprint", "list"])
        .env("FORGE_BLUEPRINTS_DIR", home.path().join("nowhere"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a valid directory"));
}

/// # Test Blueprint Info Not Found (`test_blueprint_info_not_found`)
#[test]
fn test_blueprint_info_not_found() {
    let home = tempdir().unwrap();
    let blueprints = fixture_blueprints();

    forge_cmd(home.path())
        .args(["blueprint", "info", "non-existent-bp"])
        .env("FORGE_BLUEPRINTS_DIR", blueprints.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Blueprint 'non-existent-bp' not found",
        ));
}

#[test]
fn test_blueprint_info_success() {
    let home = tempdir().unwrap();
    let blueprints = fixture_blueprints();

    forge_cmd(home.path())
        .args(["blueprint", "info", "go-api"])
        .env("FORGE_BLUEPRINTS_DIR", blueprints.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Go API")
                .and(predicate::str::contains("ProjectName"))
                .and(predicate::str::contains("Database != 'none'"))
                .and(predicate::str::contains("github.com/gin-gonic/gin"))
                .and(predicate::str::contains("go mod tidy")),
        );
}

#[test]
fn test_blueprint_info_json() {
    let home = tempdir().unwrap();
    let blueprints = fixture_blueprints();

    let output = forge_cmd(home.path())
        .args(["blueprint", "info", "rust-cli", "--json"])
        .env("FORGE_BLUEPRINTS_DIR", blueprints.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schema["id"], "rust-cli");
    assert_eq!(schema["type"], "cli");
    assert_eq!(schema["dependencies"][0]["module"], "clap");
}

#[test]
fn test_blueprint_validate() {
    let home = tempdir().unwrap();
    let blueprints = fixture_blueprints();

    forge_cmd(home.path())
        .args(["blueprint", "validate", "go-api", "--var", "ProjectName=svc"])
        .env("FORGE_BLUEPRINTS_DIR", blueprints.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));

    forge_cmd(home.path())
        .args(["blueprint", "validate", "go-api", "--var", "Database=mysql"])
        .env("FORGE_BLUEPRINTS_DIR", blueprints.path())
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("ProjectName")
                .and(predicate::str::contains("Database"))
                .and(predicate::str::contains("Configuration is invalid")),
        );
}

/// # Test Blueprint Create (`test_blueprint_create`)
///
/// Generates a project directory and checks the rendered files on disk.
#[test]
fn test_blueprint_create() {
    let home = tempdir().unwrap();
    let blueprints = fixture_blueprints();

    forge_cmd(home.path())
        .args([
            "blueprint",
            "create",
            "go-api",
            "svc",
            "--var",
            "ProjectName=svc",
            "--var",
            "UseDocker=true",
        ])
        .env("FORGE_BLUEPRINTS_DIR", blueprints.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Project generated from 'go-api'")
                .and(predicate::str::contains("go mod tidy")),
        );

    let project = home.path().join("svc");
    assert!(project.join("cmd/svc/main.go").is_file());
    assert!(project.join("Dockerfile").is_file());
    assert!(!project.join("internal").exists());
    let go_mod = fs::read_to_string(project.join("go.mod")).unwrap();
    assert!(go_mod.starts_with("module svc\n"));
}

#[test]
fn test_blueprint_create_invalid_config_writes_nothing() {
    let home = tempdir().unwrap();
    let blueprints = fixture_blueprints();

    forge_cmd(home.path())
        .args(["blueprint", "create", "go-api", "out"])
        .env("FORGE_BLUEPRINTS_DIR", blueprints.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("ProjectName"));

    assert!(!home.path().join("out").exists());
}

#[test]
fn test_blueprint_create_archive() {
    let home = tempdir().unwrap();
    let blueprints = fixture_blueprints();

    forge_cmd(home.path())
        .args([
            "blueprint",
            "create",
            "rust-cli",
            "tool.tar.gz",
            "--archive",
            "--var",
            "CrateName=tool",
        ])
        .env("FORGE_BLUEPRINTS_DIR", blueprints.path())
        .assert()
        .success();

    let bytes = fs::read(home.path().join("tool.tar.gz")).unwrap();
    let files = unpack_tree(&bytes).unwrap();
    assert_eq!(
        files.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["Cargo.toml", "src/main.rs"]
    );

    // A second run refuses to replace the archive unless forced.
    let rerun = [
        "blueprint",
        "create",
        "rust-cli",
        "tool.tar.gz",
        "--archive",
        "--var",
        "CrateName=tool",
    ];
    forge_cmd(home.path())
        .args(rerun)
        .env("FORGE_BLUEPRINTS_DIR", blueprints.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    forge_cmd(home.path())
        .args(rerun)
        .arg("--force")
        .env("FORGE_BLUEPRINTS_DIR", blueprints.path())
        .assert()
        .success();
}
