//! [`TestWorkspace`] builder for on-disk workspace scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use wsman_fs::{NormalizedPath, WorkspaceLayout};

/// A temporary workspace root with helpers to write its configuration.
///
/// # Example
///
/// ```rust,no_run
/// use wsman_test_utils::TestWorkspace;
///
/// let ws = TestWorkspace::new();
/// ws.write_config("package_sets:\n  - git:https://example.com/base.git\n");
/// ws.assert_file_exists(".wsman/workspace.yml");
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Create an empty temporary workspace root.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new()
                .unwrap_or_else(|e| panic!("TestWorkspace::new: failed to create temp dir: {e}")),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn layout(&self) -> WorkspaceLayout {
        WorkspaceLayout::new(self.root())
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("TestWorkspace::write: failed to create {}: {e}", parent.display())
            });
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("TestWorkspace::write: failed to write {}: {e}", path.display()));
        self
    }

    /// Write `.wsman/workspace.yml`.
    pub fn write_config(&self, yaml: &str) -> &Self {
        self.write(".wsman/workspace.yml", yaml)
    }

    /// Write `.wsman/overrides.yml`.
    pub fn write_overrides(&self, yaml: &str) -> &Self {
        self.write(".wsman/overrides.yml", yaml)
    }

    /// Create a local package set in `relative` and return its directory.
    pub fn local_package_set(&self, relative: &str, source_yml: &str) -> NormalizedPath {
        self.write(&format!("{relative}/source.yml"), source_yml);
        NormalizedPath::new(self.path(relative))
    }

    /// Create the source directory of package `name`, with an optional
    /// `manifest.yml`.
    pub fn package_sources(&self, name: &str, manifest_yml: Option<&str>) -> &Self {
        let dir = self.path(name);
        fs::create_dir_all(&dir).unwrap_or_else(|e| {
            panic!("TestWorkspace::package_sources: failed to create {}: {e}", dir.display())
        });
        if let Some(manifest) = manifest_yml {
            self.write(&format!("{name}/manifest.yml"), manifest);
        }
        self
    }

    /// Assert that `relative` exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, relative: &str) {
        let full_path = self.path(relative);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `relative` does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, relative: &str) {
        let full_path = self.path(relative);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `relative` contains `content`.
    pub fn assert_file_contains(&self, relative: &str, content: &str) {
        let full_path = self.path(relative);
        let file_content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            full_path.display(),
            content,
            file_content
        );
    }
}
