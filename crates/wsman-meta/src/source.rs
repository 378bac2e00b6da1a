//! Package-set description (`source.yml`)
//!
//! # Example
//!
//! ```yaml
//! name: robotics
//! required_version: ">=0.1"
//! constants: { ROCK_GIT: "https://example.com/rock" }
//! imports:
//!   - { type: git, url: "${ROCK_GIT}/base.git", auto_imports: true }
//! packages:
//!   - { name: drivers/imu, vcs: "git:${ROCK_GIT}/imu.git", depends: [base/types] }
//! osdeps:
//!   boost: libboost-dev
//!   vendor_sdk: { linux: nonexistent, default: vendor-sdk }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use wsman_vcs::RawVcs;

/// Metadata a package set declares about itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSetDescription {
    /// Logical name of the set
    pub name: String,
    /// Requirement on the running tool version (semver syntax)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_version: Option<String>,
    /// `${NAME}` substitutions for the set's VCS specifications
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constants: BTreeMap<String, String>,
    /// Other package sets this one imports, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<ImportEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<PackageEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub osdeps: BTreeMap<String, OsdepEntry>,
}

/// One imported package set: a VCS specification plus import options.
///
/// Import options live in the same mapping as the VCS fields, so they are
/// split off before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportEntry(pub RawVcs);

impl ImportEntry {
    const AUTO_IMPORTS: &'static str = "auto_imports";

    /// The VCS specification without import options.
    pub fn vcs(&self) -> RawVcs {
        match &self.0 {
            RawVcs::Short(text) => RawVcs::Short(text.clone()),
            RawVcs::Full(map) => {
                let mut map = map.clone();
                map.remove(Self::AUTO_IMPORTS);
                RawVcs::Full(map)
            }
        }
    }

    /// Whether the imported set's own imports should be followed.
    pub fn auto_imports(&self) -> bool {
        let RawVcs::Full(map) = &self.0 else {
            return true;
        };
        match map.get(Self::AUTO_IMPORTS) {
            Some(Value::Bool(value)) => *value,
            Some(Value::String(text)) => !matches!(text.as_str(), "false" | "no" | "off"),
            _ => true,
        }
    }
}

impl From<&str> for ImportEntry {
    fn from(text: &str) -> Self {
        Self(RawVcs::from(text))
    }
}

/// A source package defined by a package set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageEntry {
    pub name: String,
    /// Where the sources come from; absent for packages already in the workspace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcs: Option<RawVcs>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_depends: Vec<String>,
}

/// OS package names for one osdep.
///
/// The per-OS form maps an OS name (or `default`) to another entry. The
/// special names `nonexistent` and `ignore` are interpreted by the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OsdepEntry {
    Single(String),
    List(Vec<String>),
    PerOs(BTreeMap<String, OsdepEntry>),
}
