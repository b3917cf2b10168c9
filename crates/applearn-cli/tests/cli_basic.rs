//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run with HOME pointed at a temp dir,
//! so the real config is never touched. Portal commands target a closed
//! local port and exercise the signed-out paths.

use std::path::Path;
use std::process::Command;

const CLOSED_PORTAL: &str = "http://127.0.0.1:9";

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "applearn-cli", "--"])
        .args(args)
        .env("HOME", home)
        .env("APPLEARN_ENV", "dev")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_help() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["--help"]);
    assert_eq!(code, 0);
    for cmd in ["me", "logout", "watch", "game", "config"] {
        assert!(stdout.contains(cmd), "help is missing {cmd}");
    }
}

#[test]
fn test_config_path_is_under_home() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("applearn-dev/config.toml"));
    assert!(stdout.contains(&*home.path().to_string_lossy()));
}

#[test]
fn test_config_show_is_json() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "show"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["video"]["flush_threshold_secs"], 10.0);
    assert_eq!(parsed["game"]["default_seconds"], 10);
}

#[test]
fn test_config_set_then_get() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "game.default_seconds", "300"]);
    assert_eq!(code, 0);
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "game.default_seconds"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "300");
}

#[test]
fn test_config_rejects_bad_values() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "video.visibility_ratio", "2"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));

    let (_, _, code) = run_cli(home.path(), &["config", "get", "no.such.key"]);
    assert_ne!(code, 0);
}

#[test]
fn test_me_without_portal_is_signed_out() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["me", "--base-url", CLOSED_PORTAL]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Not signed in"));

    let (stdout, _, code) = run_cli(home.path(), &["me", "--json", "--base-url", CLOSED_PORTAL]);
    assert_eq!(code, 0);
    let view: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(view["show_login"], true);
    assert_eq!(view["show_logout"], false);
}

#[test]
fn test_logout_always_redirects_home() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["logout", "--base-url", CLOSED_PORTAL]);
    assert_eq!(code, 0);
    assert!(stdout.contains("redirect: Home.html"));
}

#[test]
fn test_game_requires_sign_in() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(
        home.path(),
        &[
            "game",
            "--video-id",
            "space-math",
            "--url",
            "https://games.example/space-math",
            "--yes",
            "--base-url",
            CLOSED_PORTAL,
        ],
    );
    assert_eq!(code, 0);
    assert!(stderr.contains("Sign in to track this game."));
    assert!(stdout.contains("\"type\":\"GameStatus\""));
}

#[test]
fn test_watch_signed_out_tracks_nothing() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(
        home.path(),
        &["watch", "--video-id", "intro", "--base-url", CLOSED_PORTAL],
    );
    assert_eq!(code, 0);
    assert!(stderr.contains("not signed in"));
    assert!(stdout.contains("\"authenticated\":false"));
}

#[test]
fn test_invalid_arguments_fail() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        home.path(),
        &["watch", "--video-id", "intro", "--duration", "0"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("--duration must be positive"));

    let (_, _, code) = run_cli(
        home.path(),
        &["game", "--video-id", "g", "--url", "not a url"],
    );
    assert_ne!(code, 0);

    let (_, stderr, code) = run_cli(home.path(), &["me", "--base-url", "portal"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("portal.base_url"));
}
