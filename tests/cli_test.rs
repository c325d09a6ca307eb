//! Drives the built binary through the subcommands that need no network.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "DLCSYNC_CONFIG",
    "GAMES_DIR",
    "SCAN_INTERVAL",
    "FAILED_LOG",
    "DCRYPT_URL",
    "TOKEN_PATH",
    "DRIVE_ACCESS_TOKEN",
];

fn dlcsync_bin() -> String {
    env!("CARGO_BIN_EXE_dlcsync").to_string()
}

fn run(cwd: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(dlcsync_bin());
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(cwd)
        .args(["--failure-log", "failed.txt", "--no-progress"])
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for sub in ["watch", "scan", "decrypt", "download"] {
        assert!(stdout.contains(sub), "missing {} in:\n{}", sub, stdout);
    }
}

#[test]
fn test_scan_empty_root() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("games");
    fs::create_dir(&root).unwrap();

    let output = run(tmp.path(), &["--root", root.to_str().unwrap(), "scan"]);

    assert!(
        output.status.success(),
        "scan failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(!tmp.path().join("failed.txt").exists());
}

#[test]
fn test_scan_missing_root_is_not_an_error() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("nowhere");

    let output = run(tmp.path(), &["--root", root.to_str().unwrap(), "scan"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("was not scanned"), "stdout: {}", stdout);
}

#[test]
fn test_decrypt_missing_container_fails() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["decrypt", "absent.dlc"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("absent.dlc"), "stderr: {}", stderr);
}

#[test]
fn test_download_missing_links_file_fails() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["download", "links.txt"]);

    assert!(!output.status.success());
    assert!(!tmp.path().join("downloads").exists());
}

#[test]
fn test_download_empty_list_creates_output_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("links.txt"), "\n\n").unwrap();

    let output = run(tmp.path(), &["download", "links.txt", "-o", "out"]);

    assert!(
        output.status.success(),
        "download failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(tmp.path().join("out").is_dir());
    assert!(!tmp.path().join("failed.txt").exists());
}

#[test]
fn test_zero_interval_rejected() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["--interval", "0", "scan"]);

    assert!(!output.status.success());
}
