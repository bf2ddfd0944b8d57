//! `st` binary tests

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Temp home with a config pointing storage and the client at it
struct Sandbox {
    temp: TempDir,
    config: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        Self::with_config("")
    }

    fn with_config(extra: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("smarttasks.yml");
        let yaml = format!(
            "storage:\n  data-dir: {}\nclient:\n  api-url: http://127.0.0.1:9\n  timeout-ms: 2000\n{}",
            temp.path().join("data").display(),
            extra
        );
        fs::write(&config, yaml).unwrap();
        Self { temp, config }
    }

    fn st(&self) -> Command {
        let mut cmd = Command::cargo_bin("st").unwrap();
        cmd.current_dir(self.temp.path())
            .env("XDG_DATA_HOME", self.temp.path())
            .env("NO_COLOR", "1")
            .env_remove("PORT")
            .arg("--config")
            .arg(&self.config);
        cmd
    }
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("st")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("prioritize"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("--log-level"));
}

#[test]
fn test_add_then_list() {
    let sandbox = Sandbox::new();

    sandbox.st().args(["add", "Buy", "milk"]).assert().success();
    sandbox.st().args(["add", "  Pay rent  "]).assert().success();

    sandbox
        .st()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Buy milk"))
        .stdout(predicate::str::contains("Pay rent"))
        .stdout(predicate::str::contains("2 task(s)"));
}

#[test]
fn test_duplicate_add_fails() {
    let sandbox = Sandbox::new();

    sandbox.st().args(["add", "Buy milk"]).assert().success();
    sandbox
        .st()
        .args(["add", "BUY MILK"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("This task already exists in your list."));
}

#[test]
fn test_too_long_add_fails() {
    let sandbox = Sandbox::new();
    let text = "x".repeat(201);

    sandbox
        .st()
        .args(["add", text.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("too long"));
}

#[test]
fn test_edit_and_rm_by_prefix() {
    let sandbox = Sandbox::new();

    let output = sandbox.st().args(["add", "Call mom"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let id = stdout.split_whitespace().last().unwrap().to_string();
    let prefix = &id[..13];

    sandbox.st().args(["edit", prefix, "Call mom tonight"]).assert().success();
    sandbox
        .st()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Call mom tonight"));

    sandbox.st().args(["rm", prefix]).assert().success();
    sandbox
        .st()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks yet"));
}

#[test]
fn test_rm_unknown_id_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .st()
        .args(["rm", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No task matches"));
}

#[test]
fn test_prioritize_empty_list_fails_without_network() {
    let sandbox = Sandbox::new();
    sandbox
        .st()
        .arg("prioritize")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No tasks to prioritize"));
}

#[test]
fn test_results_before_prioritizing() {
    let sandbox = Sandbox::new();
    sandbox
        .st()
        .arg("results")
        .assert()
        .success()
        .stdout(predicate::str::contains("No prioritized tasks yet"));
}

#[test]
fn test_clear() {
    let sandbox = Sandbox::new();
    sandbox.st().args(["add", "Water plants"]).assert().success();
    sandbox.st().arg("clear").assert().success();
    sandbox
        .st()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks yet"));
}

#[test]
fn test_health_without_gateway() {
    let sandbox = Sandbox::new();
    sandbox
        .st()
        .arg("health")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Server is not responding"));
}

#[test]
fn test_invalid_provider_is_rejected() {
    let sandbox = Sandbox::with_config("llm:\n  provider: mistral\n");
    sandbox
        .st()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown LLM provider"));
}
