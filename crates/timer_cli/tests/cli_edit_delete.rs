use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tasktimer"))
        .args(args)
        .env("TASKTIMER_STORE_PATH", store_path(dir))
        .env("TASKTIMER_CONFIG_PATH", dir.join("config.json"))
        .env("TASKTIMER_DISABLE_NOTIFICATIONS", "1")
        .output()
        .expect("failed to run tasktimer")
}

fn store_path(dir: &Path) -> PathBuf {
    dir.join("tasks.json")
}

fn read_store(dir: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(store_path(dir)).unwrap()).unwrap()
}

#[test]
fn edit_changes_only_given_fields() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), &["add", "old name", "--notes", "keep me"]);
    run(dir.path(), &["toggle", "1"]);

    let output = run(dir.path(), &["edit", "1", "--name", "new name"]);

    assert!(output.status.success());
    let stored = read_store(dir.path());
    assert_eq!(stored["tasks"][0]["name"], "new name");
    assert_eq!(stored["tasks"][0]["notes"], "keep me");
    assert!(stored["tasks"][0]["running_since"].is_string());
}

#[test]
fn edit_requires_a_change() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), &["add", "task"]);

    let output = run(dir.path(), &["edit", "1"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nothing to change"));
}

#[test]
fn edit_rejects_non_numeric_id() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(dir.path(), &["edit", "task-1", "--name", "x"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid task id"));
}

#[test]
fn delete_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), &["add", "first"]);
    run(dir.path(), &["add", "second"]);

    let first = run(dir.path(), &["delete", "1"]);
    let second = run(dir.path(), &["delete", "1"]);

    assert!(first.status.success());
    assert!(second.status.success());
    assert!(String::from_utf8_lossy(&first.stdout).contains("Deleted task: first (1)"));
    assert!(String::from_utf8_lossy(&second.stdout).contains("already deleted"));

    let stored = read_store(dir.path());
    assert_eq!(stored["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(stored["tasks"][0]["id"], 2);
}

#[test]
fn clear_removes_everything_but_keeps_id_sequence() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), &["add", "a"]);
    run(dir.path(), &["add", "b"]);

    let output = run(dir.path(), &["clear"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Deleted 2 tasks"));
    assert!(read_store(dir.path())["tasks"].as_array().unwrap().is_empty());

    let added = run(dir.path(), &["add", "c"]);
    assert!(String::from_utf8_lossy(&added.stdout).contains("(3)"));
}

#[test]
fn show_prints_task_details() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), &["add", "detailed", "--notes", "context"]);

    let output = run(dir.path(), &["show", "1", "--json"]);

    assert!(output.status.success());
    let task: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(task["name"], "detailed");
    assert_eq!(task["notes"], "context");
    assert_eq!(task["accumulated_seconds"], 0);
}
