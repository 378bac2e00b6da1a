//! Workspace layout
//!
//! Computes where configuration, package set checkouts and package sources
//! live relative to the workspace root.

use std::path::Path;

use crate::{Error, NormalizedPath, Result, WorkspacePath};

/// On-disk layout of a workspace.
///
/// ```text
/// <root>/
///   .wsman/
///     workspace.yml
///     overrides.yml
///     remotes/<name> -> ../../.remotes/<automatic-name>
///   .remotes/<automatic-name>/source.yml
///   <package name>/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: NormalizedPath,
}

impl WorkspaceLayout {
    /// Create a layout rooted at `root`.
    pub fn new(root: impl Into<NormalizedPath>) -> Self {
        Self { root: root.into() }
    }

    /// Find the workspace containing `start` by walking up the directory tree
    /// until a `.wsman/workspace.yml` is found.
    pub fn discover(start: &Path) -> Result<Self> {
        let mut current = Some(start);
        while let Some(dir) = current {
            let candidate = NormalizedPath::new(dir);
            let layout = Self::new(candidate);
            if layout.workspace_config().is_file() {
                tracing::debug!(root = %layout.root, "Found workspace");
                return Ok(layout);
            }
            current = dir.parent();
        }
        Err(Error::WorkspaceNotFound {
            path: start.to_path_buf(),
        })
    }

    /// Workspace root directory.
    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// The configuration directory (`.wsman`), also the local directory of
    /// the root package set.
    pub fn config_dir(&self) -> NormalizedPath {
        self.root.join(WorkspacePath::ConfigDir.as_str())
    }

    /// Path of `workspace.yml`.
    pub fn workspace_config(&self) -> NormalizedPath {
        self.config_dir().join(WorkspacePath::WorkspaceConfig.as_str())
    }

    /// Path of `overrides.yml`.
    pub fn overrides_file(&self) -> NormalizedPath {
        self.config_dir().join(WorkspacePath::Overrides.as_str())
    }

    /// Directory holding the real checkouts of remote package sets.
    pub fn remotes_dir(&self) -> NormalizedPath {
        self.root.join(WorkspacePath::RemotesDir.as_str())
    }

    /// Directory of user-visible links named after the package sets.
    pub fn user_remotes_dir(&self) -> NormalizedPath {
        self.config_dir().join(WorkspacePath::UserRemotes.as_str())
    }

    /// Source directory of a package.
    pub fn package_dir(&self, name: &str) -> NormalizedPath {
        self.root.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_rooted_at_workspace() {
        let layout = WorkspaceLayout::new("/ws");
        assert_eq!(layout.workspace_config().as_str(), "/ws/.wsman/workspace.yml");
        assert_eq!(layout.overrides_file().as_str(), "/ws/.wsman/overrides.yml");
        assert_eq!(layout.remotes_dir().as_str(), "/ws/.remotes");
        assert_eq!(layout.user_remotes_dir().as_str(), "/ws/.wsman/remotes");
        assert_eq!(layout.package_dir("drivers/imu").as_str(), "/ws/drivers/imu");
    }
}
