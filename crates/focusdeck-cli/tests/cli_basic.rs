//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a temporary data directory and
//! verify outputs.

use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_focusdeck"))
        .args(args)
        .env("FOCUSDECK_DATA_DIR", data_dir)
        .env_remove("FOCUSDECK_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is JSON"))
        .collect()
}

#[test]
fn test_config_get_default() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "timer.work_minutes"]);
    assert_eq!(code, 0, "Config get failed");
    assert_eq!(stdout.trim(), "25");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_set_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "timer.auto_advance", "true"]);
    assert_eq!(code, 0, "Config set failed");
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "timer.auto_advance"]);
    assert_eq!(stdout.trim(), "true");
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "ui.dark_mode", "true"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_list() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "list"]);
    assert_eq!(code, 0, "Config list failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["rewards"]["pomodoro_points"], 10);
}

#[test]
fn test_stats_and_sessions_start_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["stats", "all"]);
    assert_eq!(code, 0, "Stats all failed");
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["total_sessions"], 0);

    let (stdout, _, code) = run_cli(dir.path(), &["sessions"]);
    assert_eq!(code, 0, "Sessions failed");
    assert_eq!(stdout.trim(), "[]");
}

#[test]
fn test_progress_starts_at_bronze() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["progress"]);
    assert_eq!(code, 0, "Progress failed");
    let progress: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(progress["points"], 0);
    assert_eq!(progress["rank"], "Bronze");
}

#[test]
fn test_progress_shop_lists_badges() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["progress", "shop"]);
    assert_eq!(code, 0, "Progress shop failed");
    let shop: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let items = shop.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[1]["id"], "focus-master");
    assert_eq!(items[1]["cost"], 100);
    assert!(items.iter().all(|item| item["owned"] == false));
}

#[test]
fn test_progress_redeem_refuses_short_balance() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["progress", "redeem", "starter"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Not enough points! Need 50, have 0"));

    let (stdout, _, _) = run_cli(dir.path(), &["progress"]);
    let progress: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(progress["points"], 0);
    assert_eq!(progress["badges"], serde_json::json!([]));
}

#[test]
fn test_progress_redeem_unknown_badge() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["progress", "redeem", "pomodoro-marathon"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown badge: pomodoro-marathon"));
}

#[test]
fn test_run_completes_one_work_phase() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(
        dir.path(),
        &["run", "--seconds", "2", "--tick-ms", "5", "--phases", "1"],
    );
    assert_eq!(code, 0, "Run failed");

    let events = json_lines(&stdout);
    let types: Vec<&str> = events.iter().filter_map(|e| e["type"].as_str()).collect();
    assert_eq!(types.first(), Some(&"snapshot"));
    assert!(types.contains(&"timer_started"));
    assert!(types.contains(&"work_completed"));
    assert!(types.contains(&"phase_entered"));

    let last = events.last().unwrap();
    assert_eq!(last["phase"], "short_break");
    assert_eq!(last["remaining_secs"], 300);

    let (stdout, _, _) = run_cli(dir.path(), &["sessions"]);
    let sessions: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(sessions.as_array().unwrap().len(), 1);
    assert_eq!(sessions[0]["type"], "work");

    let (stdout, _, _) = run_cli(dir.path(), &["progress"]);
    let progress: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(progress["points"], 10);
}

#[test]
fn test_run_in_memory_leaves_history_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(
        dir.path(),
        &["run", "--memory", "--seconds", "1", "--tick-ms", "5", "--phases", "1"],
    );
    assert_eq!(code, 0, "Run failed");
    let (stdout, _, _) = run_cli(dir.path(), &["sessions"]);
    assert_eq!(stdout.trim(), "[]");
}
