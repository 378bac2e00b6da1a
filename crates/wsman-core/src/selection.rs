//! User package selection
//!
//! Maps each criterion the user gave (package name, package set name or
//! directory prefix) to the packages it matched, so that end-of-run
//! warnings can name the criterion that pulled a package in.

use crate::{Error, Manifest, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSelection {
    /// Criteria in the order given, each with its matches in manifest order
    matches: Vec<(String, Vec<String>)>,
}

impl PackageSelection {
    /// Match `criteria` against the manifest.
    ///
    /// A criterion matching nothing is a configuration error.
    pub fn resolve<S: AsRef<str>>(criteria: &[S], manifest: &Manifest) -> Result<Self> {
        let mut selection = Self::default();
        for criterion in criteria {
            let criterion = criterion.as_ref().trim_end_matches('/');
            let packages = match_criterion(criterion, manifest);
            if packages.is_empty() {
                return Err(Error::config(format!(
                    "{criterion} is neither a package nor a package set"
                )));
            }
            tracing::debug!(criterion = %criterion, packages = ?packages, "Selected packages");
            selection.matches.push((criterion.to_string(), packages));
        }
        Ok(selection)
    }

    /// Every package of the manifest, each selected for itself.
    pub fn all(manifest: &Manifest) -> Self {
        Self {
            matches: manifest
                .packages()
                .map(|package| (package.name.clone(), vec![package.name.clone()]))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Selected packages, first match first, without duplicates.
    pub fn packages(&self) -> Vec<String> {
        let mut packages: Vec<String> = Vec::new();
        for name in self.matches.iter().flat_map(|(_, names)| names) {
            if !packages.contains(name) {
                packages.push(name.clone());
            }
        }
        packages
    }

    /// Criteria that selected `package`.
    pub fn criteria_for(&self, package: &str) -> Vec<&str> {
        self.matches
            .iter()
            .filter(|(_, names)| names.iter().any(|name| name == package))
            .map(|(criterion, _)| criterion.as_str())
            .collect()
    }

    /// `(criterion, matched packages)` pairs in the order given.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.matches
            .iter()
            .map(|(criterion, names)| (criterion.as_str(), names.as_slice()))
    }
}

fn match_criterion(criterion: &str, manifest: &Manifest) -> Vec<String> {
    if manifest.find_package(criterion).is_some() {
        return vec![criterion.to_string()];
    }
    if let Some(packages) = manifest.packages_of_set(criterion) {
        return packages.to_vec();
    }
    let prefix = format!("{criterion}/");
    manifest
        .packages()
        .filter(|package| package.name.starts_with(&prefix))
        .map(|package| package.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PackageDefinition;
    use pretty_assertions::assert_eq;
    use wsman_fs::NormalizedPath;

    fn manifest() -> Manifest {
        let mut manifest = Manifest::new("linux");
        for (set, name) in [
            ("base", "base/types"),
            ("drivers", "drivers/imu"),
            ("drivers", "drivers/gps"),
            ("tools", "planning"),
        ] {
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
    fn criteria_match_packages_sets_and_prefixes() {
        let manifest = manifest();
        let selection =
            PackageSelection::resolve(&["planning", "drivers", "base/"], &manifest).unwrap();

        assert_eq!(
            selection.packages(),
            vec!["planning", "drivers/imu", "drivers/gps", "base/types"]
        );
        assert_eq!(selection.criteria_for("drivers/gps"), vec!["drivers"]);
        assert_eq!(selection.criteria_for("base/types"), vec!["base"]);
    }

    #[test]
    fn overlapping_criteria_keep_each_package_once() {
        let manifest = manifest();
        let selection =
            PackageSelection::resolve(&["drivers/imu", "drivers"], &manifest).unwrap();

        assert_eq!(selection.packages(), vec!["drivers/imu", "drivers/gps"]);
        assert_eq!(
            selection.criteria_for("drivers/imu"),
            vec!["drivers/imu", "drivers"]
        );
    }

    #[test]
    fn unknown_criterion_is_a_config_error() {
        let err = PackageSelection::resolve(&["nothing"], &manifest()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("nothing"));
    }

    #[test]
    fn all_selects_every_package() {
        let selection = PackageSelection::all(&manifest());
        assert_eq!(selection.packages().len(), 4);
        assert_eq!(selection.criteria_for("planning"), vec!["planning"]);
    }
}
