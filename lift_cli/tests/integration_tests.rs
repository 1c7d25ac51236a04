//! Integration tests for the lift binary.
//!
//! These tests verify end-to-end behavior including:
//! - Program seeding
//! - The preview, begin, log, finish, confirm workflow
//! - Weight progression across the session rotation
//! - History edits and CSV export

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary, isolated from any user config
fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("lift"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

/// CLI invocation as `alice` on the given day of June 2024
fn lift(data_dir: &Path, day: u32) -> Command {
    let mut cmd = cli(data_dir);
    cmd.arg("--user")
        .arg("alice")
        .arg("--date")
        .arg(format!("2024-06-{:02}", day));
    cmd
}

fn init(data_dir: &Path) {
    cli(data_dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Seeded 4 sessions"));
}

/// Preview and begin the next session without logging anything
fn start_workout(data_dir: &Path, day: u32) {
    lift(data_dir, day).arg("preview").assert().success();
    lift(data_dir, day).arg("begin").assert().success();
}

fn finish_workout(data_dir: &Path, day: u32) {
    lift(data_dir, day).arg("finish").assert().success();
    lift(data_dir, day).arg("confirm").assert().success();
}

fn log_set(data_dir: &Path, day: u32, exercise: &str, set: u32, weight: &str) {
    lift(data_dir, day)
        .args(["log", exercise, &set.to_string(), weight])
        .assert()
        .success();
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Strength program logger with progressive overload",
        ));
}

#[test]
fn test_init_creates_database() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    init(data_dir);
    assert!(data_dir.join("workouts.db").exists());

    // Running again keeps the existing program
    cli(data_dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("4 sessions"));

    cli(data_dir)
        .arg("program")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Session 1"))
        .stdout(predicate::str::contains("Deadlift — 1x5"));
}

#[test]
fn test_init_from_program_sheet() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let sheet = data_dir.join("program.csv");
    fs::write(
        &sheet,
        "My Program,,\nDAY,EXERCISE,SETS\nLower,,4x6\n,Goblet Squat,\n,Lunge,\nUpper,,3x10\n,Push-up,\n",
    )
    .unwrap();

    cli(data_dir)
        .arg("init")
        .arg("--program")
        .arg(&sheet)
        .arg("--skip-rows")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Seeded 2 sessions"));

    lift(data_dir, 3)
        .arg("preview")
        .assert()
        .success()
        .stdout(predicate::str::contains("Goblet Squat — 4x6"))
        .stdout(predicate::str::contains("Lunge — 4x6"));
}

#[test]
fn test_full_workout_flow() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    init(data_dir);

    lift(data_dir, 3)
        .arg("preview")
        .assert()
        .success()
        .stdout(predicate::str::contains("SESSION 1"))
        .stdout(predicate::str::contains("Squat — 5x5: new exercise"));

    lift(data_dir, 3)
        .arg("begin")
        .assert()
        .success()
        .stdout(predicate::str::contains("Started session 1 (workout #1)"));

    lift(data_dir, 3)
        .args(["log", "Squat", "1", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Squat set 1: 100 lbs"));

    // Same weight again writes nothing
    lift(data_dir, 3)
        .args(["log", "Squat", "1", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already at 100 lbs"));

    lift(data_dir, 3)
        .args(["log", "Squat", "2", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unlogged"));

    lift(data_dir, 3)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Squat — 5x5 (1 of 5 sets)"))
        .stdout(predicate::str::contains("set 1: 100 lbs"));

    lift(data_dir, 3)
        .arg("finish")
        .assert()
        .success()
        .stdout(predicate::str::contains("Squat: 1 of 5 sets completed"))
        .stdout(predicate::str::contains("Bench Press: 0 of 5 sets completed"));

    // Logging is paused while the finish is pending
    lift(data_dir, 3)
        .args(["log", "Squat", "2", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot log a set while finish requested"));

    lift(data_dir, 3)
        .arg("cancel")
        .assert()
        .success();
    log_set(data_dir, 3, "Squat", 2, "102.5");
    finish_workout(data_dir, 3);

    lift(data_dir, 3)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout state: idle"))
        .stdout(predicate::str::contains("Next session: 2"));

    lift(data_dir, 3)
        .arg("bests")
        .assert()
        .success()
        .stdout(predicate::str::contains("Squat: 102.5 lbs"));
}

#[test]
fn test_progression_after_full_rotation() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    init(data_dir);

    // Session 1: every squat set done, bench short by one
    start_workout(data_dir, 3);
    for set in 1..=5 {
        log_set(data_dir, 3, "Squat", set, "100");
    }
    for (set, weight) in [(1, "60"), (2, "60"), (3, "55"), (4, "60")] {
        log_set(data_dir, 3, "Bench Press", set, weight);
    }
    finish_workout(data_dir, 3);

    // Sessions 2 to 4 with nothing logged
    for day in 4..=6 {
        start_workout(data_dir, day);
        finish_workout(data_dir, day);
    }

    lift(data_dir, 7)
        .arg("preview")
        .assert()
        .success()
        .stdout(predicate::str::contains("SESSION 1"))
        .stdout(predicate::str::contains(
            "Squat — 5x5: target 105 lbs, weight increased",
        ))
        .stdout(predicate::str::contains(
            "Bench Press — 5x5: target 55 lbs, let's try it again",
        ))
        .stdout(predicate::str::contains("Barbell Row — 5x5: new exercise"));
}

#[test]
fn test_begin_requires_preview() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    init(data_dir);

    lift(data_dir, 3)
        .arg("begin")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot begin while idle"));
}

#[test]
fn test_preview_requires_program() {
    let temp_dir = setup_test_dir();

    lift(temp_dir.path(), 3)
        .arg("preview")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no sessions"));
}

#[test]
fn test_anonymous_user_cannot_log() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    init(data_dir);

    cli(data_dir)
        .arg("preview")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no authenticated user"));
}

#[test]
fn test_invalid_weight_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    init(data_dir);
    start_workout(data_dir, 3);

    lift(data_dir, 3)
        .args(["log", "Squat", "1", "heavy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a number"));

    lift(data_dir, 3)
        .args(["log", "Squat", "6", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has sets 1-5"));

    lift(data_dir, 3)
        .args(["log", "Deadlift", "1", "100"])
        .assert()
        .failure();
}

#[test]
fn test_users_are_isolated() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    init(data_dir);

    start_workout(data_dir, 3);
    log_set(data_dir, 3, "Squat", 1, "100");

    cli(data_dir)
        .args(["--user", "bob", "--date", "2024-06-03", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout state: idle"))
        .stdout(predicate::str::contains("Next session: 1"));

    cli(data_dir)
        .args(["--user", "bob", "bests"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No personal bests yet"));
}

#[test]
fn test_edit_history() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    init(data_dir);

    start_workout(data_dir, 3);
    log_set(data_dir, 3, "Squat", 1, "100");
    log_set(data_dir, 3, "Squat", 2, "100");
    finish_workout(data_dir, 3);

    lift(data_dir, 4)
        .args(["edit", "1", "Squat=110,115", "Bench Press=50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated 2 weights for workout #1"))
        .stdout(predicate::str::contains(
            "Bench Press not changed: 1 weights supplied for 0 logged sets",
        ));

    lift(data_dir, 4)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("#1  2024-06-03 - Session 1"))
        .stdout(predicate::str::contains("Squat (5x5): 110, 115"))
        .stdout(predicate::str::contains("Barbell Row (5x5): -"));

    // Another user's workout is not found
    cli(data_dir)
        .args(["--user", "bob", "edit", "1", "Squat=1,2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotFound"));
}

#[test]
fn test_export_csv() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    init(data_dir);

    start_workout(data_dir, 3);
    log_set(data_dir, 3, "Squat", 1, "100");
    log_set(data_dir, 3, "Bench Press", 1, "60");
    finish_workout(data_dir, 3);

    let export_path = data_dir.join("out/history.csv");
    lift(data_dir, 3)
        .arg("export")
        .arg(&export_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 sets"));

    let csv_content = fs::read_to_string(&export_path).unwrap();
    let mut lines = csv_content.lines();
    assert_eq!(
        lines.next(),
        Some("workout_id,date,session_index,exercise,set_number,weight,completed")
    );
    assert_eq!(lines.count(), 2);
    assert!(csv_content.contains("Squat"));
}
