//! Integration tests for the `portal` CLI binary.
//!
//! These run the CLI as a subprocess against a throwaway token store. None of
//! them needs a live backend: everything exercised here either stays local
//! or fails before a request is sent.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::process::Command;

/// Helper: locate the `portal` binary built by `cargo test`.
fn portal_bin() -> String {
    let path = env!("CARGO_BIN_EXE_portal");
    assert!(Path::new(path).exists(), "portal binary not found at {path}");
    path.to_owned()
}

/// Helper: run portal with args and a private store under `home`, returning
/// (`exit_code`, stdout, stderr).
fn run_in(home: &Path, extra_env: &[(&str, &str)], args: &[&str]) -> (i32, String, String) {
    let mut cmd = Command::new(portal_bin());
    cmd.args(args)
        .env("HOME", home)
        .env("PORTAL_STORAGE_PATH", home.join("tokens.redb"))
        .env("PORTAL_API_URL", "http://127.0.0.1:19999/api") // Non-existent server
        .env_remove("PORTAL_PAGE_ORIGIN")
        .env_remove("PORTAL_SITES_FILE")
        .env_remove("PORTAL_PASSWORD")
        .env_remove("RUST_LOG");
    for (key, value) in extra_env {
        cmd.env(key, value);
    }
    let output = cmd.output().expect("failed to execute portal");

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

fn run(args: &[&str]) -> (i32, String, String) {
    let home = tempfile::tempdir().unwrap();
    run_in(home.path(), &[], args)
}

// ── Version & help ───────────────────────────────────────────────────

#[test]
fn test_version_flag() {
    let (code, stdout, _) = run(&["--version"]);
    assert_eq!(code, 0, "portal --version should exit 0");
    assert!(stdout.contains("portal"), "version output should contain 'portal': {stdout}");
}

#[test]
fn test_help_lists_commands() {
    let (code, stdout, _) = run(&["--help"]);
    assert_eq!(code, 0, "portal --help should exit 0");
    assert!(stdout.contains("Portal CLI"), "help should mention Portal CLI");
    for command in ["login", "whoami", "sites", "client", "websites", "analytics", "settings"] {
        assert!(stdout.contains(command), "help should list '{command}': {stdout}");
    }
}

#[test]
fn test_client_subcommand_help() {
    let (code, stdout, _) = run(&["client", "--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("login"));
    assert!(stdout.contains("logout"));
    assert!(stdout.contains("status"));
}

#[test]
fn test_unknown_command_fails() {
    let (code, _, stderr) = run(&["frobnicate"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("frobnicate"), "stderr: {stderr}");
}

// ── Client-site catalog ──────────────────────────────────────────────

#[test]
fn test_sites_lists_builtin_catalog() {
    let (code, stdout, _) = run(&["sites"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("TolaTiles"), "stdout: {stdout}");
    assert!(stdout.contains("artisancrafts.al"), "stdout: {stdout}");
    assert!(stdout.contains("tiranafinancial.al"), "stdout: {stdout}");
}

#[test]
fn test_sites_file_replaces_catalog() {
    let home = tempfile::tempdir().unwrap();
    let sites = home.path().join("sites.json");
    std::fs::write(&sites, r#"[{"name": "Corner Bakery", "domain": "bakery.al"}]"#).unwrap();

    let (code, stdout, _) = run_in(
        home.path(),
        &[("PORTAL_SITES_FILE", sites.to_str().unwrap())],
        &["sites"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("Corner Bakery"), "stdout: {stdout}");
    assert!(!stdout.contains("TolaTiles"), "stdout: {stdout}");
}

#[test]
fn test_client_login_unknown_site_fails_offline() {
    let (code, _, stderr) = run(&[
        "client",
        "login",
        "--domain",
        "unknown.example",
        "--username",
        "admin",
        "--password",
        "secret",
    ]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Error"), "stderr: {stderr}");
    assert!(stderr.contains("not configured"), "stderr: {stderr}");
}

#[test]
fn test_client_status_starts_signed_out() {
    let (code, stdout, _) = run(&["client", "status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Artisan Crafts Albania"), "stdout: {stdout}");
    assert!(stdout.contains("signed out"), "stdout: {stdout}");
    assert!(!stdout.contains("signed in"), "stdout: {stdout}");
    assert!(stdout.contains("0 client-site token(s) stored"), "stdout: {stdout}");
}

#[test]
fn test_client_logout_is_idempotent() {
    let (code, stdout, _) = run(&["client", "logout", "--domain", "artisancrafts.al"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Logged out of"), "stdout: {stdout}");
}

// ── Primary session ──────────────────────────────────────────────────

#[test]
fn test_whoami_without_session() {
    let (code, _, stderr) = run(&["whoami"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not logged in"), "stderr: {stderr}");
}

#[test]
fn test_login_requires_password() {
    let (code, _, stderr) = run(&["login", "--email", "ana@example.com"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("password is required"), "stderr: {stderr}");
}

#[test]
fn test_login_reports_unreachable_backend() {
    let (code, _, stderr) = run(&[
        "login",
        "--email",
        "ana@example.com",
        "--password",
        "secret",
    ]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Error"), "stderr: {stderr}");
}

#[test]
fn test_token_store_is_created_under_storage_path() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_in(home.path(), &[], &["client", "status"]);
    assert_eq!(code, 0);
    assert!(home.path().join("tokens.redb").exists());
}

#[test]
fn test_bad_analytics_range_is_rejected() {
    let (code, _, stderr) = run(&["analytics", "1", "--range", "decade"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("decade"), "stderr: {stderr}");
}
