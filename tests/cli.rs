//! Runs the `flowstore` binary and checks what it prints.

use std::process::Command;

use tempfile::TempDir;

fn flowstore_cmd(config_dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_flowstore"));
    cmd.arg("--config")
        .arg(config_dir.path().join("config.toml"))
        .env_remove("FLOWSTORE_LOG");
    cmd
}

#[test]
fn test_steps_print_each_state_and_final_json() {
    let dir = TempDir::new().unwrap();
    let output = flowstore_cmd(&dir)
        .args(["--no-devtools", "inc", "inc", "dec"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec!["count = 1", "count = 2", "count = 1", r#"{"count":1}"#]
    );
}

#[test]
fn test_negative_start_and_untraced_steps() {
    let dir = TempDir::new().unwrap();
    let output = flowstore_cmd(&dir)
        .args(["--no-devtools", "--untraced", "--start", "-2", "decrement"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().last(), Some(r#"{"count":-3}"#));
}

#[test]
fn test_invalid_config_exits_with_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[devtools]\nhistory_capacity = 0\n").unwrap();

    let output = flowstore_cmd(&dir)
        .arg("inc")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loading configuration"));
}
