//! Full update against real git upstreams

use pretty_assertions::assert_eq;
use serde_yaml::Value;
use tempfile::TempDir;
use wsman_core::Workspace;
use wsman_test_utils::git::{commit_files, file_url, real_git_repo_with_commit};
use wsman_test_utils::{RecordingInstaller, TestWorkspace};
use wsman_vcs::ImporterRegistry;

struct Upstreams {
    _temp: TempDir,
    set: git2::Repository,
    set_url: String,
    driver_url: String,
}

fn upstreams() -> Upstreams {
    let temp = TempDir::new().unwrap();
    let driver_dir = temp.path().join("imu");
    real_git_repo_with_commit(&driver_dir, &[("CMakeLists.txt", "project(imu)\n")]);
    let driver_url = file_url(&driver_dir);

    let set_dir = temp.path().join("robotics");
    let source = format!(
        "name: robotics\npackages:\n  - {{ name: drivers/imu, vcs: \"git:{driver_url}\" }}\n"
    );
    let set = real_git_repo_with_commit(&set_dir, &[("source.yml", &source)]);
    Upstreams {
        set_url: file_url(&set_dir),
        _temp: temp,
        set,
        driver_url,
    }
}

fn load(ws: &TestWorkspace) -> Workspace {
    Workspace::load(
        ws.layout(),
        ImporterRegistry::with_builtins(),
        RecordingInstaller::new().installer(),
    )
    .unwrap()
}

#[test]
fn update_checks_out_sets_and_packages() {
    let upstreams = upstreams();
    let ws = TestWorkspace::new();
    ws.write_config(&format!("package_sets:\n  - git:{}\n", upstreams.set_url));

    let mut workspace = load(&ws);
    let failures = workspace.update_package_sets().unwrap();
    assert!(failures.is_empty());
    ws.assert_file_contains(".wsman/remotes/robotics/source.yml", "name: robotics");

    let report = workspace.import_packages(&["drivers/imu"]).unwrap();
    assert!(report.failures.is_empty());
    let order: Vec<&str> = report.build_order.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(order, vec!["drivers/imu"]);
    ws.assert_file_contains("drivers/imu/CMakeLists.txt", "project(imu)");
}

#[test]
fn snapshot_pins_the_checked_out_commit() {
    let upstreams = upstreams();
    let ws = TestWorkspace::new();
    ws.write_config(&format!("package_sets:\n  - git:{}\n", upstreams.set_url));

    let mut workspace = load(&ws);
    workspace.update_package_sets().unwrap();
    let pinned = workspace.snapshot_package_sets().unwrap();

    let head = upstreams
        .set
        .head()
        .unwrap()
        .peel_to_commit()
        .unwrap()
        .id()
        .to_string();
    let key = format!("git:{}", upstreams.set_url);
    assert_eq!(pinned.entries[&key]["commit"], Value::String(head));
}

#[test]
fn new_upstream_commits_are_pulled_unless_checkout_only() {
    let upstreams = upstreams();
    let ws = TestWorkspace::new();
    ws.write_config(&format!("package_sets:\n  - git:{}\n", upstreams.set_url));
    load(&ws).update_package_sets().unwrap();

    let source = format!(
        "name: robotics\npackages:\n  - {{ name: drivers/imu, vcs: \"git:{}\" }}\n  - {{ name: viz }}\n",
        upstreams.driver_url
    );
    commit_files(&upstreams.set, &[("source.yml", &source)], "Add viz");

    let mut workspace = load(&ws);
    workspace.config_mut().checkout_only = true;
    workspace.update_package_sets().unwrap();
    assert!(workspace.manifest().find_package("viz").is_none());

    let mut workspace = load(&ws);
    workspace.update_package_sets().unwrap();
    assert!(workspace.manifest().find_package("viz").is_some());
}
