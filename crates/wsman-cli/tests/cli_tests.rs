//! Integration tests for the wsman CLI binary.
//!
//! These tests exercise the compiled binary using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use wsman_test_utils::TestWorkspace;

const ROBOTICS_SET: &str = r#"
name: robotics
packages:
  - { name: planning, depends: [viz] }
  - { name: viz }
"#;

/// Get a Command for the wsman binary
fn wsman_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wsman"));
    cmd.env_remove("WSMAN_ROOT")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// A workspace with one local package set and the sources of its packages.
fn robotics_workspace(extra_config: &str) -> TestWorkspace {
    let ws = TestWorkspace::new();
    ws.local_package_set("sets/robotics", ROBOTICS_SET);
    ws.write_config(&format!(
        "package_sets:\n  - {{ type: local, url: ../sets/robotics }}\n{extra_config}"
    ));
    ws.package_sources("planning", None);
    ws.package_sources("viz", None);
    ws
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_output() {
    wsman_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("package sets"))
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("snapshot"));
}

#[test]
fn test_version_output() {
    wsman_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wsman"));
}

#[test]
fn test_no_command_prints_hint() {
    wsman_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("wsman --help"));
}

#[test]
fn test_unknown_command_fails() {
    wsman_cmd().arg("bogus").assert().failure();
}

// ============================================================================
// Workspace Detection Tests
// ============================================================================

#[test]
fn test_outside_workspace_fails() {
    let ws = TestWorkspace::new();
    wsman_cmd()
        .current_dir(ws.root())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not inside a wsman workspace"));
}

#[test]
fn test_root_flag_selects_workspace() {
    let ws = robotics_workspace("");
    let elsewhere = TestWorkspace::new();
    wsman_cmd()
        .current_dir(elsewhere.root())
        .arg("--root")
        .arg(ws.root())
        .arg("sets")
        .assert()
        .success()
        .stdout(predicate::str::contains("robotics"));
}

#[test]
fn test_discovers_workspace_from_subdirectory() {
    let ws = robotics_workspace("");
    wsman_cmd()
        .current_dir(ws.path("planning"))
        .arg("sets")
        .assert()
        .success()
        .stdout(predicate::str::contains("robotics"));
}

// ============================================================================
// Command Tests
// ============================================================================

#[test]
fn test_sets_lists_load_order() {
    let ws = robotics_workspace("");
    wsman_cmd()
        .current_dir(ws.root())
        .arg("sets")
        .assert()
        .success()
        .stdout(predicate::str::is_match("(?s)robotics.*main").unwrap())
        .stdout(predicate::str::contains("local:"));
}

#[test]
fn test_update_imports_selection_in_build_order() {
    let ws = robotics_workspace("");
    wsman_cmd()
        .current_dir(ws.root())
        .args(["update", "planning"])
        .assert()
        .success()
        .stdout(predicate::str::is_match("(?s)viz.*planning").unwrap());
}

#[test]
fn test_update_reports_excluded_selection() {
    let ws = robotics_workspace("exclude_packages:\n  - { name: viz, reason: no display }\n");
    wsman_cmd()
        .current_dir(ws.root())
        .args(["update", "planning"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No package enabled"))
        .stdout(predicate::str::contains("no display"));
}

#[test]
fn test_update_unknown_selection_fails() {
    let ws = robotics_workspace("");
    wsman_cmd()
        .current_dir(ws.root())
        .args(["update", "nothing/here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "nothing/here is neither a package nor a package set",
        ));
}

#[test]
fn test_update_keep_going_lists_failures() {
    let ws = TestWorkspace::new();
    let missing = ws.path("upstream/missing");
    ws.local_package_set(
        "sets/robotics",
        &format!(
            "name: robotics\npackages:\n  - {{ name: drivers/imu, vcs: \"git:file://{}\" }}\n",
            missing.display()
        ),
    );
    ws.write_config("package_sets:\n  - { type: local, url: ../sets/robotics }\n");

    wsman_cmd()
        .current_dir(ws.root())
        .args(["update", "-k", "drivers/imu"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failures"))
        .stdout(predicate::str::contains("drivers/imu"))
        .stderr(predicate::str::contains("1 import(s) failed"));
}

#[test]
fn test_status_shows_sets_and_exclusions() {
    let ws = robotics_workspace(
        "exclude_packages:\n  - viz\nignore_packages:\n  - legacy/.*\n",
    );
    wsman_cmd()
        .current_dir(ws.root())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("robotics (2 packages)"))
        .stdout(predicate::str::contains("viz"))
        .stdout(predicate::str::contains("legacy/.*"));
}

#[test]
fn test_snapshot_writes_overrides_file() {
    let ws = robotics_workspace("");
    wsman_cmd()
        .current_dir(ws.root())
        .args(["snapshot", "-o", "pinned.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pinned 0 package set(s)"));
    ws.assert_file_exists("pinned.yml");
}

#[test]
fn test_verbose_logs_to_stderr() {
    let ws = robotics_workspace("");
    wsman_cmd()
        .current_dir(ws.root())
        .args(["--verbose", "sets"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Verbose mode enabled"));
}

#[test]
fn test_snapshot_format_follows_extension() {
    let ws = robotics_workspace("");
    wsman_cmd()
        .current_dir(ws.root())
        .args(["snapshot", "-o", "pinned.json"])
        .assert()
        .success();
    ws.assert_file_contains("pinned.json", "{");

    wsman_cmd()
        .current_dir(ws.root())
        .args(["snapshot", "-o", "pinned.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported config format"));
}

#[test]
fn test_status_shows_packages_excluded_by_their_manifest() {
    let ws = robotics_workspace("os: plan9\n");
    ws.write("viz/manifest.yml", "unsupported_on: [plan9]\n");
    wsman_cmd()
        .current_dir(ws.root())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Excluded packages"))
        .stdout(predicate::str::contains("viz: viz is not supported on plan9"));
}
