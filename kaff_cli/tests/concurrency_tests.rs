//! Concurrency tests for kaff_cli.
//!
//! These tests verify that multiple processes can safely:
//! - Append to the entry log across sequential runs
//! - Read while writers are active
//! - Never leave a corrupt entry file behind (atomic replace)

use assert_cmd::Command;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("kaff"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn entry_count(data_dir: &std::path::Path) -> usize {
    let raw = std::fs::read_to_string(data_dir.join("entries.json")).expect("Failed to read entries");
    let entries: serde_json::Value = serde_json::from_str(&raw).expect("Invalid entries JSON");
    entries.as_array().expect("Expected array").len()
}

#[test]
fn test_sequential_adds_accumulate() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    for i in 0..5 {
        thread::sleep(Duration::from_millis(i * 5));
        cli()
            .arg("add")
            .arg("espresso")
            .arg("--data-dir")
            .arg(&data_dir)
            .assert()
            .success();
    }

    assert_eq!(entry_count(&data_dir), 5);
}

#[test]
fn test_reads_while_writing() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .arg("add")
        .arg("latte")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    // Readers interleaved with writers
    for i in 0..3 {
        thread::sleep(Duration::from_millis(i * 10));
        cli()
            .arg("add")
            .arg("green_tea")
            .arg("--data-dir")
            .arg(&data_dir)
            .assert()
            .success();

        cli()
            .arg("status")
            .arg("--data-dir")
            .arg(&data_dir)
            .assert()
            .success();
    }

    assert_eq!(entry_count(&data_dir), 4);
}

#[test]
fn test_no_entry_file_corruption_under_load() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    // Hammer the CLI with many concurrent writers. Whole-file replacement
    // is last-writer-wins across simultaneous processes, so we assert
    // integrity rather than an exact count.
    let handles: Vec<_> = (0..10u64)
        .map(|i| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                // Small stagger to reduce thundering herd
                thread::sleep(Duration::from_millis(i * 5));
                cli()
                    .arg("add")
                    .arg("cola")
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .timeout(Duration::from_secs(10))
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    // Give filesystem a moment to settle
    thread::sleep(Duration::from_millis(100));

    // The entry file must be a valid JSON array with at least one entry
    let raw = std::fs::read_to_string(data_dir.join("entries.json")).expect("Failed to read entries");
    let parsed: serde_json::Value = serde_json::from_str(&raw).expect("Entry file contains invalid JSON");
    let entries = parsed.as_array().expect("Expected a JSON array");

    assert!(!entries.is_empty());
    for entry in entries {
        assert!(entry["id"].is_string());
        assert!(entry["caffeineAmount"].is_number());
    }
}

#[test]
fn test_concurrent_readers() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .arg("add")
        .arg("monster")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                cli()
                    .arg("log")
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .timeout(Duration::from_secs(10))
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
}
