//! Workspace configuration (`.wsman/workspace.yml`)
//!
//! The workspace configuration doubles as the description of the root
//! package set: `package_sets` are its imports and `constants` its
//! variable table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ImportEntry, PackageSetDescription};

fn default_name() -> String {
    "main".to_string()
}

/// Top-level workspace settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Name of the root package set
    #[serde(default = "default_name")]
    pub name: String,
    /// Imported package sets, in preference order
    #[serde(default)]
    pub package_sets: Vec<ImportEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constants: BTreeMap<String, String>,
    /// Default selection when none is given on the command line
    #[serde(default)]
    pub layout: Vec<String>,
    #[serde(default)]
    pub exclude_packages: Vec<ExcludeEntry>,
    #[serde(default)]
    pub ignore_packages: Vec<String>,
    /// Operating system name used to resolve osdeps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default)]
    pub keep_going: bool,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub checkout_only: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            package_sets: Vec::new(),
            constants: BTreeMap::new(),
            layout: Vec::new(),
            exclude_packages: Vec::new(),
            ignore_packages: Vec::new(),
            os: None,
            keep_going: false,
            retry_count: 0,
            checkout_only: false,
        }
    }
}

impl WorkspaceConfig {
    /// Configured OS, or the one we are running on.
    pub fn os(&self) -> &str {
        self.os.as_deref().unwrap_or(std::env::consts::OS)
    }

    /// Description of the root package set.
    pub fn root_description(&self) -> PackageSetDescription {
        PackageSetDescription {
            name: self.name.clone(),
            required_version: None,
            constants: self.constants.clone(),
            imports: self.package_sets.clone(),
            packages: Vec::new(),
            osdeps: BTreeMap::new(),
        }
    }
}

/// An `exclude_packages` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExcludeEntry {
    /// Package name, package set name or regular expression
    Pattern(String),
    Detailed {
        name: String,
        #[serde(default)]
        reason: Option<String>,
    },
}

impl ExcludeEntry {
    pub fn pattern(&self) -> &str {
        match self {
            Self::Pattern(name) | Self::Detailed { name, .. } => name,
        }
    }

    /// Reason recorded on excluded packages.
    pub fn reason(&self) -> String {
        match self {
            Self::Detailed {
                reason: Some(reason),
                ..
            } => reason.clone(),
            _ => format!(
                "{} is listed in the exclude_packages section of the workspace configuration",
                self.pattern()
            ),
        }
    }
}
