//! Registry of packages, osdeps, exclusions and ignores
//!
//! Filled from the sequenced package sets, then read and written by the
//! package import walker. Passed explicitly; there is no global manifest.

use std::collections::BTreeMap;

use regex::Regex;
use wsman_fs::{NormalizedPath, WorkspaceLayout};
use wsman_meta::{ExcludeEntry, OsdepEntry};
use wsman_vcs::{ImporterRegistry, VcsDefinition};

use crate::names::check_package_name;
use crate::osdeps::{OsdepResolution, resolve_osdep};
use crate::{Error, Overrides, PackageSet, Result};

/// A source package as the manifest knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDefinition {
    pub name: String,
    /// `None` when the sources are expected to be in the workspace already
    pub vcs: Option<VcsDefinition>,
    pub srcdir: NormalizedPath,
    /// Name of the package set defining the package
    pub package_set: String,
    pub depends: Vec<String>,
    pub optional_depends: Vec<String>,
}

/// Name, package-set name or regular expression.
#[derive(Debug, Clone)]
struct PackageMatcher {
    pattern: String,
    regex: Option<Regex>,
    reason: String,
}

impl PackageMatcher {
    fn new(pattern: &str, reason: String) -> Self {
        let regex = Regex::new(&format!("^(?:{pattern})$")).ok();
        Self {
            pattern: pattern.to_string(),
            regex,
            reason,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Manifest {
    os: String,
    packages: BTreeMap<String, PackageDefinition>,
    /// Package set names in registration order, with their packages
    package_sets: Vec<(String, Vec<String>)>,
    osdeps: BTreeMap<String, OsdepEntry>,
    exclusions: BTreeMap<String, String>,
    exclude_matchers: Vec<PackageMatcher>,
    ignore_matchers: Vec<PackageMatcher>,
}

impl Manifest {
    /// An empty manifest resolving osdeps for `os`.
    pub fn new(os: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            packages: BTreeMap::new(),
            package_sets: Vec::new(),
            osdeps: BTreeMap::new(),
            exclusions: BTreeMap::new(),
            exclude_matchers: Vec::new(),
            ignore_matchers: Vec::new(),
        }
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    /// Register the packages and osdeps of a loaded package set.
    ///
    /// A package already defined by an earlier set is replaced.
    pub fn register_package_set(
        &mut self,
        set: &PackageSet,
        layout: &WorkspaceLayout,
        registry: &ImporterRegistry,
        overrides: &Overrides,
    ) -> Result<()> {
        let Some(description) = set.description() else {
            return Err(Error::internal(format!(
                "package set {} registered before its description was loaded",
                set.vcs()
            )));
        };
        let ctx = set.normalize_context(registry);

        self.package_sets.push((set.name().to_string(), Vec::new()));
        for entry in &description.packages {
            check_package_name(&entry.name)?;
            let vcs = match &entry.vcs {
                Some(raw) => {
                    let vcs = VcsDefinition::normalize(raw, &ctx)?;
                    Some(overrides.apply(&vcs, Some(&entry.name), registry)?)
                }
                None => None,
            };
            // Local packages are used in place
            let srcdir = match &vcs {
                Some(vcs) if vcs.is_local() => NormalizedPath::new(vcs.url()),
                _ => layout.package_dir(&entry.name),
            };
            self.define_package(
                set.name(),
                PackageDefinition {
                    name: entry.name.clone(),
                    vcs,
                    srcdir,
                    package_set: set.name().to_string(),
                    depends: entry.depends.clone(),
                    optional_depends: entry.optional_depends.clone(),
                },
            );
        }

        for (name, entry) in &description.osdeps {
            self.osdeps.insert(name.clone(), entry.clone());
        }
        Ok(())
    }

    /// Add `package` to the package set called `set`.
    ///
    /// A package already defined by another set moves to `set`.
    pub fn define_package(&mut self, set: &str, package: PackageDefinition) {
        let name = package.name.clone();
        if let Some(previous) = self.packages.insert(name.clone(), package) {
            tracing::warn!(
                package = %name,
                previous = %previous.package_set,
                current = %set,
                "Package redefined by a later package set"
            );
            for (_, packages) in &mut self.package_sets {
                packages.retain(|existing| existing != &name);
            }
        }
        match self.package_sets.iter_mut().find(|(existing, _)| existing == set) {
            Some((_, packages)) => packages.push(name),
            None => self.package_sets.push((set.to_string(), vec![name])),
        }
    }

    /// Define an osdep, replacing an earlier definition.
    pub fn define_osdep(&mut self, name: &str, entry: OsdepEntry) {
        self.osdeps.insert(name.to_string(), entry);
    }

    /// Forget every registered package set, with their packages and osdeps.
    pub fn reset_package_sets(&mut self) {
        self.packages.clear();
        self.package_sets.clear();
        self.osdeps.clear();
    }

    /// Apply the workspace's `exclude_packages` and `ignore_packages`.
    pub fn configure_exclusions(&mut self, exclude: &[ExcludeEntry], ignore: &[String]) {
        self.exclude_matchers = exclude
            .iter()
            .map(|entry| PackageMatcher::new(entry.pattern(), entry.reason()))
            .collect();
        self.ignore_matchers = ignore
            .iter()
            .map(|pattern| PackageMatcher::new(pattern, String::new()))
            .collect();
    }

    pub fn find_package(&self, name: &str) -> Option<&PackageDefinition> {
        self.packages.get(name)
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageDefinition> {
        self.packages.values()
    }

    pub fn find_osdep(&self, name: &str) -> Option<&OsdepEntry> {
        self.osdeps.get(name)
    }

    /// What osdep `name` means on this manifest's OS.
    pub fn resolve_osdep(&self, name: &str) -> Option<OsdepResolution> {
        self.find_osdep(name).map(|entry| resolve_osdep(entry, &self.os))
    }

    /// Registered package set names, in registration order.
    pub fn package_set_names(&self) -> impl Iterator<Item = &str> {
        self.package_sets.iter().map(|(name, _)| name.as_str())
    }

    /// Packages defined by the package set called `name`.
    pub fn packages_of_set(&self, name: &str) -> Option<&[String]> {
        self.package_sets
            .iter()
            .find(|(set, _)| set == name)
            .map(|(_, packages)| packages.as_slice())
    }

    fn matching<'a>(&self, matchers: &'a [PackageMatcher], name: &str) -> Option<&'a PackageMatcher> {
        matchers.iter().find(|matcher| {
            matcher.pattern == name
                || self
                    .packages_of_set(&matcher.pattern)
                    .is_some_and(|packages| packages.iter().any(|p| p == name))
                || matcher.regex.as_ref().is_some_and(|re| re.is_match(name))
        })
    }

    /// Mark `name` as excluded, replacing any reason recorded before.
    pub fn add_exclusion(&mut self, name: &str, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::debug!(package = %name, reason = %reason, "Excluding package");
        self.exclusions.insert(name.to_string(), reason);
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclusions.contains_key(name) || self.matching(&self.exclude_matchers, name).is_some()
    }

    pub fn exclusion_reason(&self, name: &str) -> Option<String> {
        if let Some(reason) = self.exclusions.get(name) {
            return Some(reason.clone());
        }
        self.matching(&self.exclude_matchers, name)
            .map(|matcher| matcher.reason.clone())
    }

    /// Exclusions recorded during the run (configured patterns not included).
    pub fn exclusions(&self) -> &BTreeMap<String, String> {
        &self.exclusions
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.matching(&self.ignore_matchers, name).is_some()
    }

    /// Merge `<srcdir>/manifest.yml` into the package definition.
    ///
    /// May exclude the package if it does not support the current OS.
    pub fn load_package_manifest(&mut self, name: &str) -> Result<()> {
        let Some(package) = self.packages.get_mut(name) else {
            return Err(Error::config(format!("{name} is not a known package")));
        };
        let Some(file) = wsman_meta::load_package_manifest(&package.srcdir)? else {
            return Ok(());
        };

        for dep in file.depends {
            if !package.depends.contains(&dep) {
                package.depends.push(dep);
            }
        }
        for dep in file.optional_depends {
            if !package.optional_depends.contains(&dep) {
                package.optional_depends.push(dep);
            }
        }

        if file.unsupported_on.iter().any(|os| os == &self.os) && !self.is_excluded(name) {
            let reason = format!("{name} is not supported on {}", self.os);
            self.add_exclusion(name, reason);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_with(packages: &[(&str, &str)]) -> Manifest {
        let mut manifest = Manifest::new("linux");
        for (set, name) in packages {
            manifest.define_package(
                set,
                PackageDefinition {
                    name: name.to_string(),
                    vcs: None,
                    srcdir: NormalizedPath::new("/ws").join(name),
                    package_set: set.to_string(),
                    depends: Vec::new(),
                    optional_depends: Vec::new(),
                },
            );
        }
        manifest
    }

    #[test]
    fn exclusion_patterns_match_names_sets_and_regexes() {
        let mut manifest = manifest_with(&[
            ("base", "base/types"),
            ("legacy", "old/driver"),
            ("drivers", "drivers/imu"),
            ("drivers", "drivers/gps"),
        ]);
        manifest.configure_exclusions(
            &[
                ExcludeEntry::Pattern("legacy".into()),
                ExcludeEntry::Detailed {
                    name: "drivers/g.*".into(),
                    reason: Some("no gps here".into()),
                },
            ],
            &["base/types".to_string()],
        );

        assert!(manifest.is_excluded("old/driver"));
        assert!(manifest.is_excluded("drivers/gps"));
        assert_eq!(manifest.exclusion_reason("drivers/gps").as_deref(), Some("no gps here"));
        assert!(!manifest.is_excluded("drivers/imu"));
        assert!(manifest.is_ignored("base/types"));
        assert!(!manifest.is_ignored("drivers/imu"));
    }

    #[test]
    fn add_exclusion_replaces_reason() {
        let mut manifest = Manifest::new("linux");
        manifest.add_exclusion("a", "first");
        manifest.add_exclusion("a", "second");
        assert_eq!(manifest.exclusion_reason("a").as_deref(), Some("second"));
        assert!(manifest.exclusion_reason("b").is_none());
    }

    #[test]
    fn reset_forgets_packages_but_keeps_exclusions() {
        let mut manifest = manifest_with(&[("base", "base/types")]);
        manifest.add_exclusion("base/types", "broken");
        manifest.reset_package_sets();
        assert!(manifest.find_package("base/types").is_none());
        assert_eq!(manifest.package_set_names().count(), 0);
        assert!(manifest.is_excluded("base/types"));
    }

    #[test]
    fn redefined_package_moves_to_the_later_set() {
        let mut manifest = manifest_with(&[("base", "common"), ("base", "base/types")]);
        manifest.define_package(
            "override",
            PackageDefinition {
                name: "common".into(),
                vcs: None,
                srcdir: NormalizedPath::new("/ws/common"),
                package_set: "override".into(),
                depends: vec!["base/types".into()],
                optional_depends: Vec::new(),
            },
        );

        assert_eq!(manifest.packages_of_set("base"), Some(&["base/types".to_string()][..]));
        assert_eq!(manifest.packages_of_set("override"), Some(&["common".to_string()][..]));
        assert_eq!(manifest.find_package("common").unwrap().depends, vec!["base/types"]);
    }

    #[test]
    fn package_manifest_adds_dependencies_and_os_exclusion() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut manifest = Manifest::new("windows");
        manifest.define_package(
            "base",
            PackageDefinition {
                name: "tool".into(),
                vcs: None,
                srcdir: NormalizedPath::new(temp.path()),
                package_set: "base".into(),
                depends: vec!["a".into()],
                optional_depends: Vec::new(),
            },
        );
        std::fs::write(
            temp.path().join("manifest.yml"),
            "depends: [a, b]\noptional_depends: [c]\nunsupported_on: [windows]\n",
        )
        .unwrap();

        manifest.load_package_manifest("tool").unwrap();
        let tool = manifest.find_package("tool").unwrap();
        assert_eq!(tool.depends, vec!["a", "b"]);
        assert_eq!(tool.optional_depends, vec!["c"]);
        assert_eq!(
            manifest.exclusion_reason("tool").as_deref(),
            Some("tool is not supported on windows")
        );
    }
}
