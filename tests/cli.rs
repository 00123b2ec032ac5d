//! Integration test: the boltstat binary.
//!
//! Runs the compiled binary against fixture files and checks the exit status
//! and the logged report lines.

use std::path::Path;
use std::process::{Command, Output};

use boltstat::bolt::{BucketSpec, ImageBuilder};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn boltstat(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_boltstat"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn fixture(dir: &TempDir) -> String {
    let mut log = BucketSpec::new();
    log.put("seq", "entry");
    let mut ns = BucketSpec::new();
    ns.put("ab", "cde");
    let mut root = BucketSpec::new();
    root.bucket("channels", ns);
    root.bucket(vec![b'f'; 68], log);

    let path = dir.path().join("fixture.db");
    ImageBuilder::new().write_to(&root, &path).unwrap();
    path_arg(&path)
}

fn path_arg(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn audit_succeeds_and_logs_report() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir);

    let out = boltstat(&[&path]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Found 1 top-level buckets and 1 fixed-id log buckets"));
    assert!(stdout.contains(r#""name":"channels""#));
    assert!(stdout.contains(r#""name":"fixed-id-logs""#));
    assert!(stdout.contains(r#""name":"global-stats""#));
    assert!(stdout.contains("Totals:"));
    assert!(stdout.contains("Total file size: 24.00 KiB"));
}

#[test]
fn listing_is_logged_before_walk() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir);

    let out = boltstat(&[&path]);
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    let found = stdout.find("Found 1 top-level buckets").unwrap();
    let listing = stdout.find("Top-level buckets: channels").unwrap();
    let reading = stdout.find("Reading top-level buckets...").unwrap();
    let first_stats = stdout.find(r#""name":"channels""#).unwrap();
    assert!(found < listing);
    assert!(listing < reading);
    assert!(reading < first_stats);
}

#[test]
fn missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.db");

    let out = boltstat(&[&path_arg(&missing), "--timeout", "0.1"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Error:"));
}

#[test]
fn corrupt_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("corrupt.db");
    std::fs::write(&path, vec![0xAB; 8192]).unwrap();

    let out = boltstat(&[&path_arg(&path)]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn missing_path_argument_is_usage_error() {
    let out = boltstat(&[]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn invalid_timeout_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir);

    let out = boltstat(&[&path, "--timeout", "-1"]);
    assert!(!out.status.success());
}
