//! End-to-end tests for the `stride` binary in guest mode.
//!
//! Each test points the config and data dirs at a temp dir, so no session
//! file exists and no database is touched.

use std::path::Path;
use std::process::{Command, Output};

const CSV: &str = "Date,Day,Main Workout,Abs Focus,Plank Focus,Lower Back\n\
    Jan 5,Mon,\"Strength: Squats, Bench\",Crunches,Side plank,Bird dog\n\
    Jan 6,Tue,Rest,,,\n";

fn stride(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stride"))
        .args(args)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("STRIDE_DATABASE_URL")
        .env_remove("STRIDE_PLAN_PATH")
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run stride")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_plan(home: &Path) -> String {
    let path = home.join("plan.csv");
    std::fs::write(&path, CSV).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn plan_show_prints_the_selected_week() {
    let tmp = tempfile::TempDir::new().unwrap();
    let plan = write_plan(tmp.path());

    let out = stride(tmp.path(), &["plan", "show", &plan, "--week", "1"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let text = stdout(&out);
    assert!(text.contains("Week 1 (0/2 completed)"), "got:\n{text}");
    assert!(text.contains("[ ] Mon Jan 5  (Jan 5-Mon)"), "got:\n{text}");
    assert!(text.contains("Completed 0 of 2 days"), "got:\n{text}");
}

#[test]
fn done_is_remembered_between_runs() {
    let tmp = tempfile::TempDir::new().unwrap();
    let plan = write_plan(tmp.path());

    let out = stride(tmp.path(), &["done", "Jan 5-Mon", "--plan", &plan]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let text = stdout(&out);
    assert!(text.contains("Jan 5-Mon: done (Saved locally)"), "got:\n{text}");
    assert!(text.contains("Mode: Local"), "got:\n{text}");
    assert!(tmp.path().join("data/stride/guest.json").exists());

    let text = stdout(&stride(tmp.path(), &["status", "--plan", &plan]));
    assert!(text.contains("Week 1: 1/2"), "got:\n{text}");
    assert!(text.contains("Completed 1 of 2 days"), "got:\n{text}");
}

#[test]
fn guest_file_flag_overrides_the_data_dir() {
    let tmp = tempfile::TempDir::new().unwrap();
    let guest = tmp.path().join("elsewhere.json");
    let guest = guest.to_string_lossy().into_owned();

    let out = stride(
        tmp.path(),
        &["measure", "--week", "2", "weight=70", "--guest-file", &guest],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(stdout(&out).contains("Weight: 70"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&guest).unwrap()).unwrap();
    assert_eq!(saved["measurementsByWeek"]["2"]["weight"], "70");
    assert!(!tmp.path().join("data/stride/guest.json").exists());
}

#[test]
fn measure_rejects_week_zero() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = stride(tmp.path(), &["measure", "--week", "0", "weight=70"]);
    assert!(!out.status.success());
}

#[test]
fn missing_plan_file_reads_as_an_empty_plan() {
    let tmp = tempfile::TempDir::new().unwrap();
    let missing = tmp.path().join("no-such-plan.csv");
    let missing = missing.to_string_lossy().into_owned();

    let out = stride(tmp.path(), &["plan", "show", &missing]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(stdout(&out).contains("No workout days found in plan."));

    let out = stride(tmp.path(), &["status", "--plan", &missing]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
}
