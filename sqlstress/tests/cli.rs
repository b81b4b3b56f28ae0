//! Blackbox tests for the startup phase of the `sqlstress` binary.
//!
//! None of these tests need a database. Startup failures must happen before the first worker is
//! launched, and worker failures must not fail the process.

use std::process::{Command, Output};

use serde_json::json;
use sqlstress_test::sequences::SequenceFile;

const SQLSTRESS_EXE: &str = env!("CARGO_BIN_EXE_sqlstress");

fn run(args: &[&str]) -> Output {
    Command::new(SQLSTRESS_EXE)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to spawn sqlstress")
}

fn assert_no_workers(output: &Output) {
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        !stdout.contains("Executed sequence"),
        "unexpected worker output: {stdout}"
    );
}

#[test]
fn test_invalid_worker_count() {
    let file = SequenceFile::new(json!([{ "sequence": ["SELECT 1"], "weight": 1 }]));
    let sequences = file.path().to_str().unwrap();

    for workers in ["abc", "0", "-3"] {
        let output = run(&["127.0.0.1", "db", "user", "pw", workers, "-s", sequences]);

        assert!(!output.status.success(), "accepted workers `{workers}`");
        assert_no_workers(&output);
    }
}

#[test]
fn test_missing_arguments() {
    let output = run(&["127.0.0.1", "db", "user"]);

    assert!(!output.status.success());
    assert_no_workers(&output);
}

#[test]
fn test_missing_sequence_file() {
    let file = SequenceFile::missing();
    let sequences = file.path().to_str().unwrap();

    let output = run(&["127.0.0.1", "db", "user", "pw", "3", "-s", sequences]);

    assert!(!output.status.success());
    assert_no_workers(&output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load sequences"), "{stderr}");
}

#[test]
fn test_malformed_sequence_file() {
    let file = SequenceFile::with_contents("{ not json");
    let sequences = file.path().to_str().unwrap();

    let output = run(&["127.0.0.1", "db", "user", "pw", "3", "-s", sequences]);

    assert!(!output.status.success());
    assert_no_workers(&output);
}

#[test]
fn test_empty_sequence_file() {
    let file = SequenceFile::new(json!([]));
    let sequences = file.path().to_str().unwrap();

    let output = run(&["127.0.0.1", "db", "user", "pw", "3", "-s", sequences]);

    assert!(!output.status.success());
    assert_no_workers(&output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("empty"), "{stderr}");
}

#[test]
fn test_zero_weights() {
    let file = SequenceFile::new(json!([{ "sequence": ["SELECT 1"], "weight": 0 }]));
    let sequences = file.path().to_str().unwrap();

    let output = run(&["127.0.0.1", "db", "user", "pw", "3", "-s", sequences]);

    assert!(!output.status.success());
    assert_no_workers(&output);
}

#[test]
fn test_unreachable_database() {
    let file = SequenceFile::new(json!([{ "sequence": ["SELECT 1"], "weight": 1 }]));
    let sequences = file.path().to_str().unwrap();

    // Nothing listens on port 1, so every worker fails to connect.
    let output = run(&[
        "127.0.0.1", "db", "user", "pw", "2", "--port", "1", "-s", sequences,
    ]);

    // Worker failures never fail the run.
    assert!(output.status.success());
    assert_no_workers(&output);
}
