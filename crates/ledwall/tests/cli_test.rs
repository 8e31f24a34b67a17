//! Integration tests for the `ledwall` CLI binary.
//!
//! Argument parsing, help output, completions, and schedule commands
//! against a mocked device. No real panel is needed.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `ledwall` binary with env isolation.
///
/// Clears all `LEDWALL_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn ledwall_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("ledwall");
    cmd.env("HOME", "/tmp/ledwall-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/ledwall-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("LEDWALL_PROFILE")
        .env_remove("LEDWALL_BASE_URL")
        .env_remove("LEDWALL_WS_URL")
        .env_remove("LEDWALL_TOKEN")
        .env_remove("LEDWALL_OUTPUT")
        .env_remove("LEDWALL_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || ledwall_cmd().args(args).output().unwrap())
        .await
        .unwrap()
}

fn args(base: &str, rest: &[&str]) -> Vec<String> {
    let mut v = vec!["--base-url".to_string(), base.to_string()];
    v.extend(rest.iter().map(ToString::to_string));
    v
}

async fn mock(server: &MockServer, verb: &str, endpoint: &str, status: u16, times: u64) {
    Mock::given(method(verb))
        .and(path(format!("/api/schedule/{endpoint}")))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = ledwall_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    ledwall_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("LED wall")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("brightness"))
            .and(predicate::str::contains("schedule")),
    );
}

#[test]
fn test_version_flag() {
    ledwall_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ledwall"));
}

#[test]
fn test_completions_bash() {
    ledwall_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_config_path() {
    ledwall_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ── Validation ──────────────────────────────────────────────────────

#[test]
fn test_status_without_device_is_usage_error() {
    ledwall_cmd()
        .arg("status")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No device configured"));
}

#[test]
fn test_brightness_out_of_range() {
    ledwall_cmd()
        .args(["--base-url", "http://127.0.0.1:9", "brightness", "300"])
        .assert()
        .code(2);
}

#[test]
fn test_zero_duration_rejected() {
    ledwall_cmd()
        .args([
            "--base-url",
            "http://127.0.0.1:9",
            "schedule",
            "start",
            "--day",
            "2:0",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("at least 1 second"));
}

#[test]
fn test_status_times_out_without_device() {
    ledwall_cmd()
        .args(["--base-url", "http://127.0.0.1:1", "--timeout", "1", "status"])
        .assert()
        .code(8);
}

// ── Schedule commands ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_schedule_stop() {
    let server = MockServer::start().await;
    mock(&server, "GET", "stop", 200, 1).await;

    let output = run(args(&server.uri(), &["schedule", "stop"])).await;
    assert!(output.status.success(), "{output:?}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Stopped schedule successfully"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_schedule_start_aborts_on_failed_push() {
    let server = MockServer::start().await;
    mock(&server, "POST", "day", 500, 1).await;
    mock(&server, "GET", "start", 200, 0).await;

    let output = run(args(
        &server.uri(),
        &["schedule", "start", "--day", "2:5,3:10"],
    ))
    .await;
    assert_eq!(output.status.code(), Some(1), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("day push"), "{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_schedule_start_pushes_then_starts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/schedule/night"))
        .and(body_string(
            "schedule=%5B%7B%22pluginId%22%3A9%2C%22duration%22%3A60%7D%5D",
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    mock(&server, "POST", "day", 200, 0).await;
    mock(&server, "GET", "start", 200, 1).await;

    let output = run(args(
        &server.uri(),
        &["--output", "json", "schedule", "start", "--night", "9:60"],
    ))
    .await;
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(r#""message":"Scheduler started""#), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_schedule_bounds_with_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/schedule/bounds"))
        .and(header("authorization", "Bearer wall-token"))
        .and(body_string("dayStart=06%3A30&nightStart=20%3A00"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let output = run(args(
        &server.uri(),
        &["--token", "wall-token", "schedule", "bounds", "6:30", "20:00"],
    ))
    .await;
    assert!(output.status.success(), "{output:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unauthorized_exit_code() {
    let server = MockServer::start().await;
    mock(&server, "GET", "clear", 401, 1).await;

    let output = run(args(&server.uri(), &["schedule", "clear"])).await;
    assert_eq!(output.status.code(), Some(3), "{output:?}");
}
