//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_breakwise"))
        .args(args)
        .env("BREAKWISE_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Feed `input` to `breakwise run` and collect the JSON lines it prints.
fn run_host(data_dir: &Path, input: &str) -> Vec<serde_json::Value> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_breakwise"))
        .args(["run", "--tick-ms", "50"])
        .env("BREAKWISE_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn host");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "host exited with {:?}", output.status);

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line is JSON"))
        .collect()
}

#[test]
fn test_settings_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["settings", "get", "intervalMinutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "45");
}

#[test]
fn test_settings_set_persists() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["settings", "set", "smartMode", "true"]);
    assert_eq!(code, 0);

    let (stdout, _, _) = run_cli(dir.path(), &["settings", "list"]);
    let settings: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(settings["smartMode"], true);
}

#[test]
fn test_settings_negative_interval_is_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["settings", "set", "intervalMinutes", "-5"]);
    assert_eq!(code, 0, "stderr: {stderr}");

    let (stdout, _, _) = run_cli(dir.path(), &["settings", "get", "intervalMinutes"]);
    assert_eq!(stdout.trim(), "1");
}

#[test]
fn test_settings_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["settings", "get", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: unknown setting"));
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "engine.max_interval_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "120");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "engine.smart_step_minutes", "10"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "engine.smart_step_minutes"]);
    assert_eq!(stdout.trim(), "10");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_stats_start_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["stats", "show"]);
    assert_eq!(code, 0);
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["totalReminders"], 0);

    let (stdout, _, code) = run_cli(dir.path(), &["stats", "history", "--days", "3"]);
    assert_eq!(code, 0);
    let history: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(history.len(), 3);
}

#[test]
fn test_stats_history_days_are_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["stats", "history", "--days", "200000000"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("--days"));

    let (_, _, code) = run_cli(dir.path(), &["stats", "history", "--days", "0"]);
    assert_eq!(code, 2);

    let (stdout, _, code) = run_cli(dir.path(), &["stats", "history", "--days", "3660"]);
    assert_eq!(code, 0);
    let history: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(history.len(), 3660);
}

#[test]
fn test_status_reports_stopped_timer() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["status"]);
    assert_eq!(code, 0);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["timer"]["phase"], "stopped");
}

#[test]
fn test_host_streams_events_and_replies() {
    let dir = tempfile::tempdir().unwrap();
    let input = concat!(
        r#"{"command": "save-settings", "settings": {"intervalMinutes": 30, "enabled": true}}"#,
        "\n",
        r#"{"command": "pause-for", "durationMs": 600000}"#,
        "\n",
        "not json\n",
        r#"{"command": "get-status"}"#,
        "\n",
    );
    let lines = run_host(dir.path(), input);

    let types: Vec<&str> = lines.iter().filter_map(|l| l["type"].as_str()).collect();
    assert!(types.contains(&"timer-armed"));
    assert!(types.contains(&"settings-updated"));
    assert!(types.contains(&"timer-paused"));
    assert!(types.contains(&"error"));

    let status = lines
        .iter()
        .find(|l| l["reply"] == "status")
        .expect("status reply");
    assert_eq!(status["status"]["timer"]["phase"], "paused");

    // Settings written by the host are visible to one-shot commands.
    let (stdout, _, _) = run_cli(dir.path(), &["settings", "get", "intervalMinutes"]);
    assert_eq!(stdout.trim(), "30");
}

#[cfg(unix)]
#[test]
fn test_host_exits_on_interrupt_with_stdin_open() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_breakwise"))
        .args(["run", "--tick-ms", "50"])
        .env("BREAKWISE_DATA_DIR", dir.path())
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn host");
    // Held open for the whole test.
    let _stdin = child.stdin.take().unwrap();

    let mut logs = BufReader::new(child.stderr.take().unwrap()).lines();
    for line in logs.by_ref() {
        if line.unwrap().contains("Reminder host started") {
            break;
        }
    }

    let rc = unsafe { libc::kill(child.id() as i32, libc::SIGINT) };
    assert_eq!(rc, 0);

    let deadline = Instant::now() + Duration::from_secs(5);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("host still running after SIGINT");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    assert!(status.success(), "host exited with {status:?}");
    drop(logs);
}
