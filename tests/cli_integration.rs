//! Integration tests for the sitegraft binary.
//!
//! These exercise argument parsing, config loading and error reporting.
//! Nothing here reaches a live gateway.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A sitegraft command isolated from the user's config and token.
fn sitegraft(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sitegraft").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("SITEGRAFT_CONFIG")
        .env_remove("SITEGRAFT_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_flag_works() {
    let home = TempDir::new().unwrap();
    sitegraft(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("replace-lists"))
        .stdout(predicate::str::contains("replace-branding"));
}

#[test]
fn version_flag_works() {
    let home = TempDir::new().unwrap();
    sitegraft(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sitegraft"));
}

#[test]
fn replace_lists_without_endpoint_fails() {
    let home = TempDir::new().unwrap();
    sitegraft(&home)
        .arg("replace-lists")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no endpoint configured"));
}

#[test]
fn non_http_endpoint_is_rejected() {
    let home = TempDir::new().unwrap();
    sitegraft(&home)
        .args(["--endpoint", "ftp://example.com", "replace-lists"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("scheme must be http or https"));
}

#[test]
fn empty_suffix_is_rejected() {
    let home = TempDir::new().unwrap();
    sitegraft(&home)
        .args(["--endpoint", "http://127.0.0.1:9", "replace-lists", "--suffix", " "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--suffix cannot be empty"));
}

#[test]
fn explicit_config_must_exist() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("absent.toml");
    sitegraft(&home)
        .arg("--config")
        .arg(&missing)
        .arg("replace-lists")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("config.toml");
    std::fs::write(&config, "endpoint = \"http://127.0.0.1:9\"\nbogus = 1\n").unwrap();

    sitegraft(&home)
        .arg("--config")
        .arg(&config)
        .arg("replace-lists")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config file"));
}

#[test]
fn replace_branding_without_settings_fails() {
    let home = TempDir::new().unwrap();
    sitegraft(&home)
        .args(["--endpoint", "http://127.0.0.1:9", "replace-branding"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no settings document"));
}

#[test]
fn malformed_settings_document_fails() {
    let home = TempDir::new().unwrap();
    let settings = home.path().join("settings.xml");
    std::fs::write(&settings, "<masterPage file=\"a.master\" />").unwrap();

    sitegraft(&home)
        .args(["--endpoint", "http://127.0.0.1:9", "replace-branding", "--settings"])
        .arg(&settings)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required attribute"));
}

#[test]
fn completion_bash_works() {
    let home = TempDir::new().unwrap();
    sitegraft(&home)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sitegraft"));
}
