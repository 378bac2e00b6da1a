use std::fs;
use tempfile::TempDir;
use wsman_fs::{NormalizedPath, WorkspaceLayout};

#[test]
fn test_discover_from_nested_directory() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join(".wsman")).unwrap();
    fs::write(root.join(".wsman/workspace.yml"), "package_sets: []\n").unwrap();
    fs::create_dir_all(root.join("drivers/imu/src")).unwrap();

    let layout = WorkspaceLayout::discover(&root.join("drivers/imu/src")).unwrap();
    assert_eq!(layout.root(), &NormalizedPath::new(root));
}

#[test]
fn test_discover_fails_outside_workspace() {
    let temp = TempDir::new().unwrap();
    let result = WorkspaceLayout::discover(temp.path());
    assert!(result.is_err());
}
