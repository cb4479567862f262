//! Concurrency tests for the habits binary.
//!
//! These tests verify that multiple processes can safely:
//! - Mark the same habit on the same day without duplicate completions
//! - Create habits simultaneously without losing writes
//! - Read while others write

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const TODAY: &str = "2024-06-15";

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("habits"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--today")
        .arg(TODAY);
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn read_snapshot(data_dir: &Path) -> serde_json::Value {
    let content =
        std::fs::read_to_string(data_dir.join("habits.json")).expect("Failed to read snapshot");
    serde_json::from_str(&content).expect("Snapshot contains invalid JSON")
}

fn spawn_all<F>(count: u64, data_dir: &Path, f: F) -> Vec<thread::JoinHandle<()>>
where
    F: Fn(u64, PathBuf) + Send + Sync + Copy + 'static,
{
    (0..count)
        .map(|i| {
            let data_dir = data_dir.to_path_buf();
            thread::spawn(move || f(i, data_dir))
        })
        .collect()
}

#[test]
fn test_concurrent_done_same_day_single_completion() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli(&data_dir).args(["add", "Read"]).assert().success();

    let handles = spawn_all(10, &data_dir, |_, data_dir| {
        cli(&data_dir)
            .args(["done", "1"])
            .timeout(Duration::from_secs(10))
            .assert()
            .success();
    });

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let snapshot = read_snapshot(&data_dir);
    let completions = snapshot["completions"].as_array().unwrap();
    assert_eq!(
        completions.len(),
        1,
        "Expected exactly one completion, got {}",
        completions.len()
    );
}

#[test]
fn test_concurrent_adds_are_not_lost() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    let handles = spawn_all(8, &data_dir, |i, data_dir| {
        // Small stagger to reduce thundering herd
        thread::sleep(Duration::from_millis(i * 5));
        cli(&data_dir)
            .args(["add", format!("Habit {}", i).as_str()])
            .timeout(Duration::from_secs(10))
            .assert()
            .success();
    });

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let snapshot = read_snapshot(&data_dir);
    let habits = snapshot["habits"].as_array().unwrap();
    assert_eq!(habits.len(), 8, "Expected 8 habits, got {}", habits.len());

    let mut ids: Vec<u64> = habits.iter().map(|h| h["id"].as_u64().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=8).collect::<Vec<u64>>());
}

#[test]
fn test_concurrent_reads_and_writes() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli(&data_dir)
        .args(["add", "Read", "--start", "2024-06-01"])
        .assert()
        .success();

    let writers = spawn_all(5, &data_dir, |i, data_dir| {
        cli(&data_dir)
            .args(["done", "1", "--date", format!("2024-06-{:02}", 10 + i).as_str()])
            .timeout(Duration::from_secs(10))
            .assert()
            .success();
    });

    let readers = spawn_all(5, &data_dir, |_, data_dir| {
        cli(&data_dir)
            .arg("list")
            .timeout(Duration::from_secs(10))
            .assert()
            .success();
    });

    for handle in writers.into_iter().chain(readers) {
        handle.join().expect("Thread panicked");
    }

    let snapshot = read_snapshot(&data_dir);
    assert_eq!(snapshot["completions"].as_array().unwrap().len(), 5);
}
