//! Well-known file and directory names of a workspace.

use std::path::Path;

/// Standard workspace filesystem markers and paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspacePath {
    /// The `.wsman` directory (configuration root)
    ConfigDir,
    /// The `workspace.yml` file inside the configuration root
    WorkspaceConfig,
    /// The `overrides.yml` file inside the configuration root
    Overrides,
    /// The `remotes` directory of user-visible package set links
    UserRemotes,
    /// The `.remotes` directory holding the actual package set checkouts
    RemotesDir,
    /// The `source.yml` description file of a package set
    SourceFile,
    /// The `manifest.yml` file of a package
    PackageManifest,
}

impl WorkspacePath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigDir => ".wsman",
            Self::WorkspaceConfig => "workspace.yml",
            Self::Overrides => "overrides.yml",
            Self::UserRemotes => "remotes",
            Self::RemotesDir => ".remotes",
            Self::SourceFile => "source.yml",
            Self::PackageManifest => "manifest.yml",
        }
    }
}

impl AsRef<Path> for WorkspacePath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for WorkspacePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for WorkspacePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
