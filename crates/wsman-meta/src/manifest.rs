//! Package manifest (`<srcdir>/manifest.yml`)

use serde::{Deserialize, Serialize};

/// Dependency information shipped with a package's sources.
///
/// Entries add to what the package set declares.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageManifestFile {
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub optional_depends: Vec<String>,
    /// Operating systems the package cannot be built on
    #[serde(default)]
    pub unsupported_on: Vec<String>,
}
