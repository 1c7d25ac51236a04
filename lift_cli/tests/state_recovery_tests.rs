//! Workout state file tests for the lift binary.
//!
//! These tests verify the system can handle:
//! - Corrupted state files
//! - Missing state files mid-workout (resume)
//! - Failed transitions leaving the saved state untouched

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn cli_on(data_dir: &Path, date: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("lift"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--user")
        .arg("alice")
        .arg("--date")
        .arg(date);
    cmd
}

fn cli(data_dir: &Path) -> Command {
    cli_on(data_dir, "2024-06-03")
}

fn setup_test_dir() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    cli(temp_dir.path()).arg("init").assert().success();
    temp_dir
}

fn state_file(data_dir: &Path) -> PathBuf {
    data_dir.join("state/alice.json")
}

fn read_state(data_dir: &Path) -> serde_json::Value {
    let content = fs::read_to_string(state_file(data_dir)).expect("Failed to read state");
    serde_json::from_str(&content).expect("State file is not valid JSON")
}

#[test]
fn test_state_file_tracks_transitions() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir).arg("preview").assert().success();
    let state = read_state(data_dir);
    assert_eq!(state["state"], "previewed");
    assert_eq!(state["session_index"], 1);
    assert_eq!(state["exercises"][0]["suggestion"], "new");

    cli(data_dir).arg("begin").assert().success();
    let state = read_state(data_dir);
    assert_eq!(state["state"], "active");
    assert_eq!(state["workout_id"], 1);
    assert!(state["exercise_attempt_ids"]["Squat"].is_number());

    cli(data_dir).arg("finish").assert().success();
    assert_eq!(read_state(data_dir)["state"], "finish_requested");

    cli(data_dir).arg("confirm").assert().success();
    assert_eq!(read_state(data_dir)["state"], "idle");
}

#[test]
fn test_corrupted_state_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::create_dir_all(data_dir.join("state")).unwrap();
    fs::write(state_file(data_dir), "{ invalid json }}}}").expect("Failed to write corrupted state");

    cli(data_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout state: idle"));

    // A fresh preview overwrites the bad file
    cli(data_dir).arg("preview").assert().success();
    assert_eq!(read_state(data_dir)["state"], "previewed");
}

#[test]
fn test_resume_after_lost_state() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir).arg("preview").assert().success();
    cli(data_dir).arg("begin").assert().success();
    cli(data_dir)
        .args(["log", "Squat", "1", "100"])
        .assert()
        .success();

    fs::remove_file(state_file(data_dir)).unwrap();

    cli(data_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Incomplete workout from today: session 1"));

    cli(data_dir)
        .arg("resume")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resumed session 1 (workout #1)"))
        .stdout(predicate::str::contains("set 1: 100 lbs"));

    // Resuming reuses the attempt rather than starting a new one
    cli(data_dir)
        .args(["log", "Squat", "2", "100"])
        .assert()
        .success();
    assert_eq!(read_state(data_dir)["workout_id"], 1);
}

#[test]
fn test_resume_ignores_other_days() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir).arg("preview").assert().success();
    cli(data_dir).arg("begin").assert().success();
    fs::remove_file(state_file(data_dir)).unwrap();

    cli_on(data_dir, "2024-06-04")
        .arg("resume")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no incomplete workout from today"));
}

#[test]
fn test_failed_transition_keeps_state() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir).arg("preview").assert().success();
    cli(data_dir).arg("begin").assert().success();
    let before = fs::read_to_string(state_file(data_dir)).unwrap();

    cli(data_dir)
        .arg("preview")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot preview while active"));
    cli(data_dir)
        .arg("confirm")
        .assert()
        .failure();

    let after = fs::read_to_string(state_file(data_dir)).unwrap();
    assert_eq!(before, after);
}
