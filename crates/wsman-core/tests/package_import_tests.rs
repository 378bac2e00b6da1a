//! Package import over resolved package sets

use pretty_assertions::assert_eq;
use rstest::rstest;
use wsman_core::{Error, Workspace};
use wsman_test_utils::{RecordingInstaller, ScriptedImporter, TestWorkspace};

const ROBOTICS: &str = "https://example.com/robotics.git";
const IMU: &str = "https://example.com/imu.git";
const TYPES: &str = "https://example.com/types.git";

const ROBOTICS_SET: &str = r#"
name: robotics
packages:
  - { name: drivers/imu, vcs: "git:https://example.com/imu.git", depends: [base/types, boost] }
  - { name: base/types, vcs: "git:https://example.com/types.git" }
  - { name: planning, depends: [drivers/imu], optional_depends: [viz] }
  - { name: viz }
osdeps:
  boost: libboost-dev
  vendor_sdk: { default: nonexistent, windows: vendor-sdk }
"#;

fn workspace(ws: &TestWorkspace, config: &str, importer: &ScriptedImporter) -> Workspace {
    ws.write_config(&format!("package_sets:\n  - git:{ROBOTICS}\n{config}"));
    ws.package_sources("planning", None);
    ws.package_sources("viz", None);
    importer.package_set(ROBOTICS, ROBOTICS_SET);
    importer.files(IMU, &[("CMakeLists.txt", "project(imu)\n")]);
    importer.files(TYPES, &[("CMakeLists.txt", "project(types)\n")]);

    let mut workspace = Workspace::load(
        ws.layout(),
        importer.registry(),
        RecordingInstaller::new().installer(),
    )
    .unwrap();
    workspace.update_package_sets().unwrap();
    workspace
}

fn enabled(report: &wsman_core::ImportReport) -> Vec<&str> {
    report.enabled.iter().map(String::as_str).collect()
}

#[test]
fn selection_pulls_in_its_dependencies() {
    let ws = TestWorkspace::new();
    let importer = ScriptedImporter::new();
    let mut workspace = workspace(&ws, "", &importer);

    let report = workspace.import_packages(&["planning"]).unwrap();

    assert_eq!(
        enabled(&report),
        vec!["base/types", "drivers/imu", "planning", "viz"]
    );
    let order: Vec<&str> = report.build_order.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(order, vec!["base/types", "drivers/imu", "viz", "planning"]);
    assert_eq!(importer.imports(), vec![ROBOTICS, IMU, TYPES]);
    ws.assert_file_exists("drivers/imu/CMakeLists.txt");
    assert!(report.os_packages.contains("libboost-dev"));
}

#[test]
fn excluded_dependency_is_reported_against_the_selection() {
    let ws = TestWorkspace::new();
    let importer = ScriptedImporter::new();
    let mut workspace = workspace(
        &ws,
        "exclude_packages:\n  - { name: base/types, reason: unsupported here }\n",
        &importer,
    );

    let report = workspace.import_packages(&["planning"]).unwrap();

    assert!(report.enabled.is_empty());
    assert_eq!(
        report.warnings,
        vec!["planning, which was selected for planning, cannot be built: unsupported here (dependency chain: planning>drivers/imu>base/types)"]
    );
    assert_eq!(
        workspace.manifest().exclusion_reason("drivers/imu").as_deref(),
        Some("its dependency base/types is excluded: unsupported here")
    );
    assert_eq!(importer.import_count(TYPES), 0);
}

#[test]
fn unsupported_os_in_package_manifest_excludes_dependents() {
    let ws = TestWorkspace::new();
    let importer = ScriptedImporter::new();
    importer.files(TYPES, &[("manifest.yml", "unsupported_on: [plan9]\n")]);
    let mut workspace = workspace(&ws, "os: plan9\n", &importer);

    let report = workspace.import_packages(&["drivers/imu"]).unwrap();

    assert!(report.enabled.is_empty());
    assert_eq!(
        report.warnings,
        vec!["drivers/imu, which was selected for drivers/imu, cannot be built: its dependency base/types is excluded: base/types is not supported on plan9"]
    );
}

#[test]
fn optional_dependency_is_only_enabled_when_reachable() {
    let ws = TestWorkspace::new();
    let importer = ScriptedImporter::new();
    let mut workspace = workspace(&ws, "ignore_packages: [viz]\n", &importer);

    let report = workspace.import_packages(&["planning"]).unwrap();
    assert!(!report.enabled.contains("viz"));

    let planning = report
        .build_order
        .iter()
        .find(|build| build.name == "planning")
        .unwrap();
    assert_eq!(planning.depends, vec!["drivers/imu"]);
}

#[test]
fn package_set_criterion_selects_all_its_packages() {
    let ws = TestWorkspace::new();
    let importer = ScriptedImporter::new();
    let mut workspace = workspace(&ws, "", &importer);

    let report = workspace.import_packages(&["robotics"]).unwrap();
    assert_eq!(
        enabled(&report),
        vec!["base/types", "drivers/imu", "planning", "viz"]
    );
}

#[test]
fn configured_layout_is_the_default_selection() {
    let ws = TestWorkspace::new();
    let importer = ScriptedImporter::new();
    let mut workspace = workspace(&ws, "layout: [base/types]\n", &importer);

    let report = workspace.import_packages::<&str>(&[]).unwrap();
    assert_eq!(enabled(&report), vec!["base/types"]);
}

#[test]
fn unknown_criterion_is_a_config_error() {
    let ws = TestWorkspace::new();
    let importer = ScriptedImporter::new();
    let mut workspace = workspace(&ws, "", &importer);

    let err = workspace.import_packages(&["nothing/here"]).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn failed_package_import_is_collected_with_keep_going() {
    let ws = TestWorkspace::new();
    let importer = ScriptedImporter::new();
    importer.fail(TYPES, "authentication required");
    let mut workspace = workspace(&ws, "keep_going: true\n", &importer);

    let report = workspace.import_packages(&["drivers/imu"]).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].subject, "base/types");
    assert!(report.enabled.contains("drivers/imu"));
}

#[test]
fn failed_package_import_aborts_without_keep_going() {
    let ws = TestWorkspace::new();
    let importer = ScriptedImporter::new();
    importer.fail(TYPES, "authentication required");
    let mut workspace = workspace(&ws, "", &importer);

    let err = workspace.import_packages(&["drivers/imu"]).unwrap_err();
    assert!(err.to_string().contains("authentication required"));
}

#[test]
fn package_overrides_apply_by_name() {
    let ws = TestWorkspace::new();
    let fork = "https://example.com/forks/imu.git";
    ws.write_overrides(&format!("drivers/imu:\n  url: \"{fork}\"\n"));
    let importer = ScriptedImporter::new();
    importer.files(fork, &[("CMakeLists.txt", "project(imu_fork)\n")]);
    let mut workspace = workspace(&ws, "", &importer);

    workspace.import_packages(&["drivers/imu"]).unwrap();

    assert_eq!(importer.import_count(fork), 1);
    assert_eq!(importer.import_count(IMU), 0);
    ws.assert_file_contains("drivers/imu/CMakeLists.txt", "imu_fork");
}

#[rstest]
#[case::keep_going(true)]
#[case::stop_on_first(false)]
fn interrupt_during_package_import_always_propagates(#[case] keep_going: bool) {
    let ws = TestWorkspace::new();
    let importer = ScriptedImporter::new();
    let mut workspace = workspace(&ws, &format!("keep_going: {keep_going}\n"), &importer);
    importer.interrupt(IMU);

    let err = workspace.import_packages(&["drivers/imu"]).unwrap_err();

    assert!(err.is_interrupt(), "{err}");
    assert!(workspace.interrupt().is_raised());
    assert_eq!(importer.import_count(IMU), 1);
    assert_eq!(importer.import_count(TYPES), 0);
}

#[test]
fn package_without_importer_needs_existing_sources() {
    let ws = TestWorkspace::new();
    ws.write_config(&format!("package_sets:\n  - git:{ROBOTICS}\n"));
    let importer = ScriptedImporter::new();
    importer.package_set(
        ROBOTICS,
        "name: robotics\npackages:\n  - { name: ghost, vcs: { type: none } }\n",
    );
    let mut workspace = Workspace::load(
        ws.layout(),
        importer.registry(),
        RecordingInstaller::new().installer(),
    )
    .unwrap();
    workspace.update_package_sets().unwrap();

    let err = workspace.import_packages(&["ghost"]).unwrap_err();

    assert!(matches!(err, Error::Config { .. }), "{err}");
    assert!(err.to_string().contains("does not exist"));
}

#[rstest]
#[case::parent("../outside")]
#[case::absolute("/etc")]
#[case::nested_parent("drivers/../../outside")]
fn package_name_must_stay_inside_the_workspace(#[case] name: &str) {
    let ws = TestWorkspace::new();
    ws.write_config(&format!("package_sets:\n  - git:{ROBOTICS}\n"));
    let importer = ScriptedImporter::new();
    importer.package_set(
        ROBOTICS,
        &format!("name: robotics\npackages:\n  - {{ name: \"{name}\", vcs: \"git:{IMU}\" }}\n"),
    );
    let mut workspace = Workspace::load(
        ws.layout(),
        importer.registry(),
        RecordingInstaller::new().installer(),
    )
    .unwrap();

    let err = workspace.update_package_sets().unwrap_err();

    assert!(matches!(err, Error::Config { .. }), "{err}");
    assert_eq!(importer.import_count(IMU), 0);
}

#[test]
fn package_manifests_record_unsupported_packages_without_importing() {
    let ws = TestWorkspace::new();
    let importer = ScriptedImporter::new();
    let mut workspace = workspace(&ws, "os: plan9\n", &importer);
    ws.write("viz/manifest.yml", "unsupported_on: [plan9]\n");

    workspace.load_package_manifests().unwrap();

    let exclusions: Vec<(&str, &str)> = workspace
        .manifest()
        .exclusions()
        .iter()
        .map(|(name, reason)| (name.as_str(), reason.as_str()))
        .collect();
    assert_eq!(exclusions, vec![("viz", "viz is not supported on plan9")]);
    assert_eq!(importer.imports(), vec![ROBOTICS]);
}
