//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use serde_json::Value;
use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_momentum"))
        .env("MOMENTUM_DATA_DIR", data_dir)
        .env("MOMENTUM_USER", "artist")
        .env("MOMENTUM_LOG", "off")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (code, stdout, stderr) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout is JSON")
}

#[test]
fn test_ledger_init_and_show() {
    let dir = tempfile::tempdir().unwrap();

    let created = run_json(dir.path(), &["ledger", "init"]);
    assert_eq!(created["user_id"], "artist");
    assert_eq!(created["current_value"], 0);
    assert_eq!(created["max_value"], 100);

    let shown = run_json(dir.path(), &["ledger", "show"]);
    assert_eq!(shown["created_at"], created["created_at"]);
    assert_eq!(shown["momentum_percentage"], 0.0);
}

#[test]
fn test_show_missing_ledger_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["ledger", "show"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "stderr was: {stderr}");
}

#[test]
fn test_gain_creates_ledger_and_starts_streak() {
    let dir = tempfile::tempdir().unwrap();

    let outcome = run_json(dir.path(), &["gain", "7"]);
    assert_eq!(outcome["momentum_gained"], 7);
    assert_eq!(outcome["new_value"], 7);
    assert_eq!(outcome["new_streak"], 1);
    assert_eq!(outcome["streak_updated"], true);

    let again = run_json(dir.path(), &["gain", "3"]);
    assert_eq!(again["new_value"], 10);
    assert_eq!(again["streak_updated"], false);
    assert_eq!(again["total_completed_count"], 2);
}

#[test]
fn test_negative_gain_rejected() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["ledger", "init"]);

    let (code, _, stderr) = run_cli(dir.path(), &["gain", "-5"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let shown = run_json(dir.path(), &["ledger", "show"]);
    assert_eq!(shown["current_value"], 0);
    assert_eq!(shown["total_completed_count"], 0);
}

#[test]
fn test_decay_on_fresh_ledger_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["ledger", "init"]);

    let result = run_json(dir.path(), &["decay"]);
    assert_eq!(result["applied"], false);
    assert_eq!(result["decay_amount"], 0);
}

#[test]
fn test_item_lifecycle() {
    let dir = tempfile::tempdir().unwrap();

    let item = run_json(dir.path(), &["item", "add", "Mix single", "--weight", "5"]);
    let id = item["id"].as_str().unwrap().to_string();
    assert_eq!(item["status"], "pending");

    let pending = run_json(dir.path(), &["item", "list", "--status", "pending"]);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let done = run_json(dir.path(), &["item", "done", &id]);
    assert_eq!(done["item"]["status"], "done");
    assert_eq!(done["outcome"]["new_value"], 5);
    assert!(done["milestone_suggestion"].is_null());

    let (code, _, _) = run_cli(dir.path(), &["item", "done", &id]);
    assert_eq!(code, 1, "completing twice must fail");

    let pending = run_json(dir.path(), &["item", "list", "--status", "pending"]);
    assert!(pending.as_array().unwrap().is_empty());
}

#[test]
fn test_suggest_low_momentum() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["ledger", "init"]);
    run_json(dir.path(), &["item", "add", "Post teaser", "--weight", "3"]);

    let suggestions = run_json(dir.path(), &["suggest"]);
    let first = &suggestions.as_array().unwrap()[0];
    assert_eq!(first["kind"], "anti_drop");
    assert_eq!(first["urgency"], "critical");
    assert_eq!(first["suggested_work_item_ids"].as_array().unwrap().len(), 1);
}

#[test]
fn test_config_set_get_reset() {
    let dir = tempfile::tempdir().unwrap();

    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "cap.base_max"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "100");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "cap.base_max", "150"]);
    assert_eq!(code, 0);
    let created = run_json(dir.path(), &["ledger", "init"]);
    assert_eq!(created["max_value"], 150);

    let (code, _, _) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "cap.base_max"]);
    assert_eq!(stdout.trim(), "100");

    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}
