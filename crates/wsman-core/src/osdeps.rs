//! OS dependencies
//!
//! Resolution of osdep entries for the current OS, and the installer seam
//! the resolver calls to make sure VCS tools are available.

use std::collections::BTreeSet;
use std::process::{Command, Stdio};

use wsman_meta::OsdepEntry;

use crate::{Error, Result};

/// Entry value marking an osdep as unavailable on an OS.
pub const NONEXISTENT: &str = "nonexistent";
/// Entry value marking an osdep as provided without installing anything.
pub const IGNORE: &str = "ignore";

/// What an osdep means on a given OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsdepResolution {
    /// OS packages to install
    Packages(Vec<String>),
    /// Nothing to install
    Ignore,
    /// Cannot be satisfied on this OS
    Nonexistent,
}

/// Resolve `entry` for `os`.
///
/// Per-OS maps fall back to their `default` key; an OS that is neither
/// listed nor covered by a default cannot satisfy the osdep.
pub fn resolve_osdep(entry: &OsdepEntry, os: &str) -> OsdepResolution {
    match entry {
        OsdepEntry::Single(name) => match name.as_str() {
            NONEXISTENT => OsdepResolution::Nonexistent,
            IGNORE => OsdepResolution::Ignore,
            _ => OsdepResolution::Packages(vec![name.clone()]),
        },
        OsdepEntry::List(names) if names.is_empty() => OsdepResolution::Ignore,
        OsdepEntry::List(names) => {
            if names.iter().any(|name| name == NONEXISTENT) {
                OsdepResolution::Nonexistent
            } else {
                OsdepResolution::Packages(names.clone())
            }
        }
        OsdepEntry::PerOs(map) => match map.get(os).or_else(|| map.get("default")) {
            Some(entry) => resolve_osdep(entry, os),
            None => OsdepResolution::Nonexistent,
        },
    }
}

/// Installs OS packages.
pub trait OsPackageInstaller {
    fn install(&mut self, packages: &[String]) -> Result<()>;
}

/// Checks that each package is an executable answering `--version`.
///
/// Nothing is installed; a missing tool is reported as an install failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandProbeInstaller;

impl CommandProbeInstaller {
    fn is_available(command: &str) -> bool {
        Command::new(command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl OsPackageInstaller for CommandProbeInstaller {
    fn install(&mut self, packages: &[String]) -> Result<()> {
        let missing: Vec<String> = packages
            .iter()
            .filter(|package| !Self::is_available(package))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(Error::Install {
            packages: missing,
            message: "not found on PATH, install them with the system package manager".into(),
        })
    }
}

/// Calls the backend at most once per distinct package in a run.
pub struct OsdepInstaller {
    backend: Box<dyn OsPackageInstaller>,
    installed: BTreeSet<String>,
}

impl OsdepInstaller {
    pub fn new(backend: Box<dyn OsPackageInstaller>) -> Self {
        Self {
            backend,
            installed: BTreeSet::new(),
        }
    }

    /// Install whatever in `packages` was not installed yet.
    pub fn ensure(&mut self, packages: &[String]) -> Result<()> {
        let pending: Vec<String> = packages
            .iter()
            .filter(|package| !self.installed.contains(*package))
            .cloned()
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        tracing::debug!(packages = ?pending, "Installing OS packages");
        self.backend.install(&pending)?;
        self.installed.extend(pending);
        Ok(())
    }

    pub fn installed(&self) -> &BTreeSet<String> {
        &self.installed
    }
}

impl std::fmt::Debug for OsdepInstaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsdepInstaller")
            .field("installed", &self.installed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn per_os(entries: &[(&str, &str)]) -> OsdepEntry {
        OsdepEntry::PerOs(
            entries
                .iter()
                .map(|(os, name)| (os.to_string(), OsdepEntry::Single(name.to_string())))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[rstest]
    #[case("linux", OsdepResolution::Nonexistent)]
    #[case("macos", OsdepResolution::Packages(vec!["vendor-sdk".into()]))]
    fn per_os_entries_fall_back_to_default(#[case] os: &str, #[case] expected: OsdepResolution) {
        let entry = per_os(&[("linux", NONEXISTENT), ("default", "vendor-sdk")]);
        assert_eq!(resolve_osdep(&entry, os), expected);
    }

    #[test]
    fn unlisted_os_is_unavailable() {
        let entry = per_os(&[("linux", "libboost-dev")]);
        assert_eq!(resolve_osdep(&entry, "windows"), OsdepResolution::Nonexistent);
    }

    #[test]
    fn ignore_maps_to_nothing() {
        let entry = OsdepEntry::Single(IGNORE.into());
        assert_eq!(resolve_osdep(&entry, "linux"), OsdepResolution::Ignore);
    }

    struct Counting(usize);

    impl OsPackageInstaller for Counting {
        fn install(&mut self, _packages: &[String]) -> Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    #[test]
    fn ensure_installs_each_package_once() {
        let mut installer = OsdepInstaller::new(Box::new(Counting(0)));
        installer.ensure(&["git".to_string()]).unwrap();
        installer.ensure(&["git".to_string()]).unwrap();
        assert_eq!(installer.installed().len(), 1);
    }
}
