// PyMonitor - Python Execution Recording Navigator
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use std::{fs, path::PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use tracing::info;

const RECORDING: &str = r#"{
    "function": "fib",
    "file": "fib.py",
    "snapshots": [
        {"id": 1, "line": 3, "locals": {"n": {"value": "3", "type": "int"}}},
        {"id": 2, "line": 5, "locals": {"n": {"value": "3", "type": "int"}}},
        {"id": 3, "line": 3, "locals": {"n": {"value": "2", "type": "int"}}},
        {"id": 4, "line": 6}
    ]
}"#;

struct Fixture {
    dir: TempDir,
    recording: PathBuf,
}

impl Fixture {
    fn new(contents: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let recording = dir.path().join("fib.json");
        fs::write(&recording, contents).unwrap();
        Self { dir, recording }
    }

    fn pymonitor(&self) -> Command {
        let mut cmd = Command::cargo_bin("pymonitor").unwrap();
        cmd.env_remove("PYMONITOR_API_URL")
            .current_dir(self.dir.path())
            .arg("--config")
            .arg(self.dir.path().join("pymonitor.toml"));
        cmd
    }
}

#[test]
fn test_help_command() {
    pymonitor_common::ensure_test_logging(None);
    info!("Running test");
    let mut cmd = Command::cargo_bin("pymonitor").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Navigate recorded Python function executions"));
}

#[test]
fn test_version_command() {
    pymonitor_common::ensure_test_logging(None);
    info!("Running test");
    let mut cmd = Command::cargo_bin("pymonitor").unwrap();
    cmd.arg("--version").assert().success().stdout(predicate::str::contains("pymonitor"));
}

#[test]
fn test_missing_subcommand() {
    pymonitor_common::ensure_test_logging(None);
    info!("Running test");
    let mut cmd = Command::cargo_bin("pymonitor").unwrap();
    cmd.assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_show_first_snapshot() {
    pymonitor_common::ensure_test_logging(None);
    info!("Running test");
    let fixture = Fixture::new(RECORDING);
    fixture
        .pymonitor()
        .arg("show")
        .arg(&fixture.recording)
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1/4 · line 3 · id 1"))
        .stdout(predicate::str::contains("Line 3 · visit 1 of 2"));
}

#[test]
fn test_show_line_json() {
    pymonitor_common::ensure_test_logging(None);
    info!("Running test");
    let fixture = Fixture::new(RECORDING);
    let output = fixture
        .pymonitor()
        .args(["show", "fib.json", "--line", "6", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["function"], "fib");
    assert_eq!(json["globalLength"], 4);
    assert_eq!(json["currentStep"], 3);
    assert_eq!(json["frame"]["id"], 4);
    assert_eq!(json["localTimeline"]["localLength"], 1);
}

#[test]
fn test_show_rejects_unknown_positions() {
    pymonitor_common::ensure_test_logging(None);
    info!("Running test");
    let fixture = Fixture::new(RECORDING);
    fixture
        .pymonitor()
        .args(["show", "fib.json", "--step", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
    fixture
        .pymonitor()
        .args(["show", "fib.json", "--line", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("never executed"));
}

#[test]
fn test_show_empty_recording() {
    pymonitor_common::ensure_test_logging(None);
    info!("Running test");
    let fixture = Fixture::new("[]");
    fixture
        .pymonitor()
        .args(["show", "fib.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recording has no snapshots"));
    fixture
        .pymonitor()
        .args(["show", "fib.json", "--step", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
    fixture
        .pymonitor()
        .args(["show", "fib.json", "--line", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("never executed"));
}

#[test]
fn test_show_missing_file() {
    pymonitor_common::ensure_test_logging(None);
    info!("Running test");
    let fixture = Fixture::new(RECORDING);
    fixture
        .pymonitor()
        .args(["show", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load recording"));
}

#[test]
fn test_show_drops_malformed_records() {
    pymonitor_common::ensure_test_logging(None);
    info!("Running test");
    let fixture = Fixture::new(r#"[{"id": "a", "line": 2}, {"id": "b"}, {"line": 4}]"#);
    fixture
        .pymonitor()
        .args(["show", "fib.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1/1 · line 2 · id a"));
}

#[test]
fn test_explore_session() {
    pymonitor_common::ensure_test_logging(None);
    info!("Running test");
    let fixture = Fixture::new(RECORDING);
    fixture
        .pymonitor()
        .args(["explore", "fib.json"])
        .write_stdin("lnext\ntable\nline 42\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded fib (fib.py): 4 snapshot(s)"))
        .stdout(predicate::str::contains("Step 3/4 · line 3 · id 3"))
        .stdout(predicate::str::contains("visit | n"))
        .stdout(predicate::str::contains("Line 42 was never executed"));
}

#[test]
fn test_explore_emits_events() {
    pymonitor_common::ensure_test_logging(None);
    info!("Running test");
    let fixture = Fixture::new(RECORDING);
    fixture
        .pymonitor()
        .args(["explore", "fib.json", "--emit-events"])
        .write_stdin("goto 2\nsync\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"event":"highlightRequested","line":5}"#))
        .stdout(predicate::str::contains(r#"{"event":"snapshotSelectedForStateSync","id":2}"#));
}

#[test]
fn test_explore_reload_keeps_position() {
    pymonitor_common::ensure_test_logging(None);
    info!("Running test");
    let fixture = Fixture::new(r#"[{"id": 1, "line": 1}, {"id": 2, "line": 2}]"#);
    fixture
        .pymonitor()
        .args(["explore", "fib.json"])
        .write_stdin("goto 2\nreload\nprev\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated: 2 snapshot(s)\nStep 2/2 · line 2 · id 2"))
        .stdout(predicate::str::contains("Step 1/2 · line 1 · id 1"));
}
