//! # Forge Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration test crates in `cli/tests/`: a
//! handle on the compiled `forge` binary and on-disk blueprint fixtures.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::Path;

/// # Get Forge Command (`forge_cmd`)
///
/// An `assert_cmd::Command` for the `forge` binary of the current test run.
/// `HOME` and `XDG_CONFIG_HOME` point at an empty directory so a developer's
/// own configuration never leaks into a test.
pub fn forge_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("forge").expect("Failed to find forge binary for testing");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("FORGE_BLUEPRINTS_DIR")
        .env_remove("RUST_LOG")
        .current_dir(home);
    cmd
}

/// Writes `<root>/<id>/blueprint.toml` and its `templates/` files.
pub fn write_blueprint(root: &Path, id: &str, manifest: &str, templates: &[(&str, &str)]) {
    let dir = root.join(id);
    fs::create_dir_all(dir.join("templates")).unwrap();
    fs::write(dir.join("blueprint.toml"), manifest).unwrap();
    for (name, body) in templates {
        let path = dir.join("templates").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }
}

pub const GO_API_MANIFEST: &str = r#"
[blueprint]
name = "Go API"
type = "web-api"
architecture = "layered"
description = "Go HTTP service with optional Docker and Postgres"

[[variables]]
name = "ProjectName"
kind = "string"
required = true
pattern = "^[a-z][a-z0-9-]*$"

[[variables]]
name = "UseDocker"
kind = "bool"
default = false

[[variables]]
name = "Database"
kind = "choice"
choices = ["postgres", "none"]
default = "none"

[[files]]
source = "main.go.tera"
destination = "cmd/{{ ProjectName }}/main.go"

[[files]]
source = "Dockerfile.tera"
condition = "UseDocker"

[[files]]
source = "db.go.tera"
destination = "internal/db/db.go"
condition = "Database != 'none'"

[[files]]
source = "go.mod.tera"
manifest = true

[[dependencies]]
module = "github.com/gin-gonic/gin"
version = "v1.9.1"

[[dependencies]]
module = "github.com/lib/pq"
version = "v1.10.9"
condition = "Database == 'postgres'"

[[hooks]]
command = "go mod tidy"
description = "Resolve module checksums"
"#;

pub const GO_API_TEMPLATES: &[(&str, &str)] = &[
    (
        "main.go.tera",
        "package main\n\n// {{ ProjectName | pascal_case }} entry point.\nfunc main() {}\n",
    ),
    (
        "Dockerfile.tera",
        "FROM golang:1.22\nWORKDIR /src/{{ ProjectName }}\n",
    ),
    ("db.go.tera", "package db\n\n// Driver: {{ Database }}\n"),
    (
        "go.mod.tera",
        "module {{ ProjectName }}\n\ngo 1.22\n{% for dep in dependencies %}\nrequire {{ dep.module }} {{ dep.version }}{% endfor %}\n",
    ),
];

pub const RUST_CLI_MANIFEST: &str = r#"
[blueprint]
name = "Rust CLI"
type = "cli"
architecture = "single-crate"

[[variables]]
name = "CrateName"
kind = "string"
required = true

[[variables]]
name = "Port"
kind = "number"
default = 8080

[[files]]
source = "src/main.rs.tera"

[[files]]
source = "Cargo.toml.tera"
manifest = true

[[dependencies]]
module = "clap"
version = "4.5.0"
"#;

pub const RUST_CLI_TEMPLATES: &[(&str, &str)] = &[
    (
        "src/main.rs.tera",
        "fn main() {\n    println!(\"{{ CrateName }} on {{ Port }}\");\n}\n",
    ),
    (
        "Cargo.toml.tera",
        "[package]\nname = \"{{ CrateName | kebab_case }}\"\n\n[dependencies]\n{% for dep in dependencies %}{{ dep.module }} = \"{{ dep.version }}\"\n{% endfor %}",
    ),
];

/// A blueprint directory holding the `go-api` and `rust-cli` fixtures.
pub fn fixture_blueprints() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir for blueprints");
    write_blueprint(dir.path(), "go-api", GO_API_MANIFEST, GO_API_TEMPLATES);
    write_blueprint(dir.path(), "rust-cli", RUST_CLI_MANIFEST, RUST_CLI_TEMPLATES);
    dir
}
