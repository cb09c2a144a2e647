//! End-to-end checks of the `blobsync` binary's argument handling and
//! exit codes. Every scenario here fails before any network traffic, so
//! the endpoints can point at closed local ports.

use assert_cmd::Command;

fn blobsync() -> Command {
    Command::cargo_bin("blobsync").expect("blobsync binary builds")
}

#[test]
fn help_lists_usage() {
    let assert = blobsync().arg("--help").assert().success();
    let output = assert.get_output();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("--endpoint"));
    assert!(stdout.contains("--delete"));
    assert!(output.stderr.is_empty(), "help must not write to stderr");
}

#[test]
fn version_prints_the_crate_version() {
    let assert = blobsync().arg("--version").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_root_is_a_usage_error() {
    blobsync().assert().code(1);
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let assert = blobsync()
        .args(["--definitely-invalid", "/site"])
        .assert()
        .code(1);
    assert!(!assert.get_output().stderr.is_empty());
}

#[test]
fn missing_secret_is_a_usage_error() {
    let assert = blobsync()
        .env_remove("BLOBSYNC_SECRET")
        .args([
            "--identity",
            "ab12",
            "--publisher",
            "http://127.0.0.1:1/",
            "--endpoint",
            "http://127.0.0.1:1/",
            "/site",
        ])
        .assert()
        .code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
    assert!(stderr.contains("BLOBSYNC_SECRET"));
}

#[test]
fn unreadable_root_exits_with_source_select() {
    // The scan runs before any network work, so the closed ports above
    // are never contacted.
    let assert = blobsync()
        .env("BLOBSYNC_SECRET", "integration-secret")
        .args([
            "--identity",
            "ab12",
            "--publisher",
            "http://127.0.0.1:1/",
            "--endpoint",
            "http://127.0.0.1:1/",
            "/definitely/not/a/real/root",
        ])
        .assert()
        .code(3);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
    assert!(stderr.contains("blobsync:"));
}

#[test]
fn unreachable_publisher_exits_with_network_error() {
    let root = tempfile::tempdir().expect("tempdir");
    std::fs::write(root.path().join("index.html"), b"<html></html>").expect("write fixture");

    blobsync()
        .env("BLOBSYNC_SECRET", "integration-secret")
        .args([
            "--identity",
            "ab12",
            "--publisher",
            "http://127.0.0.1:1/",
            "--endpoint",
            "http://127.0.0.1:1/",
        ])
        .arg(root.path())
        .assert()
        .code(10);
}
