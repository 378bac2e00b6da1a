//! Package import graph walk
//!
//! Imports the selected packages and everything they depend on, one
//! package at a time from a FIFO queue. Exclusions found on the way (a
//! package unsupported on this OS, an unavailable osdep, an excluded
//! dependency) are propagated to the dependents instead of aborting.
//!
//! ```text
//! selection ──► queue ──► next step deps ──► import ──► manifest.yml
//!                 ▲            │ excluded?                 │
//!                 │            ▼                           ▼
//!                 │        propagate ◄──────────── unsupported here?
//!                 └──────── new deps (sorted)
//! ```

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use wsman_vcs::ImporterRegistry;

use crate::exclusion::{ReverseDependencies, add_reverse_dependency, propagate};
use crate::osdeps::OsdepResolution;
use crate::{
    Error, Failure, KeepGoing, Manifest, OsdepInstaller, PackageDefinition, PackageSelection,
    Result, UpdateOptions,
};

/// A package ready to be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageBuild {
    pub name: String,
    /// Enabled source packages this one needs, strong and optional
    pub depends: Vec<String>,
    /// OS packages this one needs
    pub os_packages: Vec<String>,
}

/// Outcome of a package import.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Every package reached that is neither excluded nor ignored
    pub enabled: BTreeSet<String>,
    /// Enabled packages, dependencies first
    pub build_order: Vec<PackageBuild>,
    /// OS packages needed by the enabled packages
    pub os_packages: BTreeSet<String>,
    /// Selected packages that cannot be built or are ignored
    pub warnings: Vec<String>,
    /// Failures collected in keep-going mode
    pub failures: Vec<Failure>,
}

/// One dependency of a package, as seen from the walker.
enum Dependency {
    /// A source package to walk into
    Package(String),
    /// An osdep resolved to OS packages
    Os,
    /// Excluded, ignored, or an osdep with nothing to install
    Dropped,
}

pub struct PackageWalker<'a> {
    manifest: &'a mut Manifest,
    registry: &'a ImporterRegistry,
    installer: &'a mut OsdepInstaller,
    options: &'a UpdateOptions,
    reverse_dependencies: ReverseDependencies,
    /// Package to the OS packages its osdeps resolved to
    os_packages: BTreeMap<String, BTreeSet<String>>,
    keep_going: KeepGoing,
}

impl<'a> PackageWalker<'a> {
    pub fn new(
        manifest: &'a mut Manifest,
        registry: &'a ImporterRegistry,
        installer: &'a mut OsdepInstaller,
        options: &'a UpdateOptions,
    ) -> Self {
        Self {
            manifest,
            registry,
            installer,
            options,
            reverse_dependencies: ReverseDependencies::new(),
            os_packages: BTreeMap::new(),
            keep_going: KeepGoing::new(options.keep_going),
        }
    }

    /// Import `selection` and its dependencies.
    pub fn import(mut self, selection: &PackageSelection) -> Result<ImportReport> {
        let mut queue: VecDeque<String> = selection.packages().into();
        let mut processed: BTreeSet<String> = BTreeSet::new();

        while let Some(name) = queue.pop_front() {
            self.options.import.interrupt.check()?;
            if !processed.insert(name.clone()) {
                continue;
            }
            let package = self.package(&name)?;
            let has_importer = package.vcs.as_ref().is_some_and(|vcs| !vcs.is_none());
            if !has_importer && !package.srcdir.is_dir() {
                return Err(Error::config(format!(
                    "{name} has no VCS definition and its source directory {} does not exist",
                    package.srcdir
                )));
            }

            self.next_step(&name)?;
            if self.is_disabled(&name) {
                tracing::debug!(package = %name, "Not importing disabled package");
                continue;
            }

            if let Err(error) = self.import_package(&package) {
                self.keep_going.handle(name.clone(), error)?;
                if !package.srcdir.is_dir() {
                    continue;
                }
            }

            self.manifest.load_package_manifest(&name)?;
            if self.manifest.is_excluded(&name) {
                propagate(self.manifest, &name, &self.reverse_dependencies)?;
                continue;
            }

            let mut discovered: Vec<String> = self
                .next_step(&name)?
                .into_iter()
                .filter(|dep| !processed.contains(dep))
                .collect();
            if self.is_disabled(&name) {
                continue;
            }
            discovered.sort();
            queue.extend(discovered);
        }

        let (enabled, build_order) = self.resolve_build(selection, &processed)?;
        let os_packages = build_order
            .iter()
            .flat_map(|build| build.os_packages.iter().cloned())
            .collect();
        let warnings = self.selection_warnings(selection);

        Ok(ImportReport {
            enabled,
            build_order,
            os_packages,
            warnings,
            failures: self.keep_going.into_failures(),
        })
    }

    fn package(&self, name: &str) -> Result<PackageDefinition> {
        self.manifest
            .find_package(name)
            .cloned()
            .ok_or_else(|| Error::config(format!("{name} is not a known package")))
    }

    fn is_disabled(&self, name: &str) -> bool {
        self.manifest.is_excluded(name) || self.manifest.is_ignored(name)
    }

    /// Source packages to walk into after `name`.
    ///
    /// Records the reverse dependencies of the strong ones, and excludes
    /// `name` when one of them is excluded or unavailable on this OS.
    fn next_step(&mut self, name: &str) -> Result<Vec<String>> {
        let package = self.package(name)?;
        let mut next = Vec::new();

        for dep in &package.depends {
            add_reverse_dependency(&mut self.reverse_dependencies, dep, name);
            if let Dependency::Package(dep) = self.classify(name, dep, true)?
                && !next.contains(&dep)
            {
                next.push(dep);
            }
        }
        for dep in &package.optional_depends {
            if let Dependency::Package(dep) = self.classify(name, dep, false)?
                && !next.contains(&dep)
            {
                next.push(dep);
            }
        }
        Ok(next)
    }

    fn classify(&mut self, package: &str, dep: &str, strong: bool) -> Result<Dependency> {
        if self.manifest.find_package(dep).is_some() {
            if self.manifest.is_excluded(dep) {
                if strong {
                    propagate(self.manifest, dep, &self.reverse_dependencies)?;
                }
                return Ok(Dependency::Dropped);
            }
            if self.manifest.is_ignored(dep) {
                return Ok(Dependency::Dropped);
            }
            return Ok(Dependency::Package(dep.to_string()));
        }

        match self.manifest.resolve_osdep(dep) {
            Some(OsdepResolution::Packages(os_packages)) => {
                self.os_packages
                    .entry(package.to_string())
                    .or_default()
                    .extend(os_packages);
                Ok(Dependency::Os)
            }
            Some(OsdepResolution::Ignore) => Ok(Dependency::Dropped),
            Some(OsdepResolution::Nonexistent) => {
                if strong && !self.manifest.is_excluded(package) {
                    self.manifest.add_exclusion(
                        package,
                        format!(
                            "{dep}, which is listed as a dependency of {package}, is not available on this operating system"
                        ),
                    );
                    propagate(self.manifest, package, &self.reverse_dependencies)?;
                }
                Ok(Dependency::Dropped)
            }
            None if strong => Err(Error::config(format!(
                "{dep}, which is listed as a dependency of {package}, is neither a package nor an osdep"
            ))),
            None => {
                tracing::debug!(package = %package, dependency = %dep, "Ignoring unknown optional dependency");
                Ok(Dependency::Dropped)
            }
        }
    }

    fn import_package(&mut self, package: &PackageDefinition) -> Result<()> {
        // Sources already in the workspace
        let Some(vcs) = &package.vcs else {
            return Ok(());
        };
        let importer = self.registry.get(vcs.vcs_type()).ok_or_else(|| {
            Error::config(format!("no importer registered for {vcs}"))
        })?;
        if let Some(osdep) = importer.required_osdep() {
            self.installer.ensure(&[osdep.to_string()])?;
        }

        let action = importer.import(vcs, &package.srcdir, &self.options.import)?;
        tracing::info!(package = %package.name, vcs = %vcs, action = %action, "Imported package");
        Ok(())
    }

    /// Second pass over the selection and its dependencies, without imports.
    ///
    /// Repeats until no dependency of an enabled package becomes excluded,
    /// then orders the enabled packages dependencies first.
    fn resolve_build(
        &mut self,
        selection: &PackageSelection,
        processed: &BTreeSet<String>,
    ) -> Result<(BTreeSet<String>, Vec<PackageBuild>)> {
        loop {
            let reachable = self.reachable(selection, processed);
            let mut changed = false;
            for name in &reachable {
                if self.is_disabled(name) {
                    continue;
                }
                let package = self.package(name)?;
                let excluded_dep = package
                    .depends
                    .iter()
                    .find(|dep| self.manifest.find_package(dep).is_some() && self.manifest.is_excluded(dep));
                if let Some(dep) = excluded_dep {
                    add_reverse_dependency(&mut self.reverse_dependencies, dep, name);
                    propagate(self.manifest, dep, &self.reverse_dependencies)?;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let reachable = self.reachable(selection, processed);
        let enabled: BTreeSet<String> = reachable
            .iter()
            .filter(|name| !self.is_disabled(name))
            .cloned()
            .collect();

        let mut build_order = Vec::new();
        let mut visited = BTreeSet::new();
        for name in selection.packages() {
            self.order_builds(&name, &enabled, &mut visited, &mut build_order)?;
        }
        for name in &enabled {
            self.order_builds(name, &enabled, &mut visited, &mut build_order)?;
        }
        Ok((enabled, build_order))
    }

    /// The selection plus every package dependency reached from it.
    ///
    /// Optional dependencies only count when they were imported.
    fn reachable(&self, selection: &PackageSelection, processed: &BTreeSet<String>) -> BTreeSet<String> {
        let mut reachable = BTreeSet::new();
        let mut pending: Vec<String> = selection.packages();
        while let Some(name) = pending.pop() {
            if !reachable.insert(name.clone()) {
                continue;
            }
            let Some(package) = self.manifest.find_package(&name) else {
                continue;
            };
            if self.is_disabled(&name) {
                continue;
            }
            let strong = package.depends.iter();
            let optional = package
                .optional_depends
                .iter()
                .filter(|dep| processed.contains(*dep));
            pending.extend(
                strong
                    .chain(optional)
                    .filter(|dep| self.manifest.find_package(dep).is_some())
                    .cloned(),
            );
        }
        reachable
    }

    fn order_builds(
        &self,
        name: &str,
        enabled: &BTreeSet<String>,
        visited: &mut BTreeSet<String>,
        build_order: &mut Vec<PackageBuild>,
    ) -> Result<()> {
        if !enabled.contains(name) || !visited.insert(name.to_string()) {
            return Ok(());
        }
        let package = self.package(name)?;
        let depends: Vec<String> = package
            .depends
            .iter()
            .chain(package.optional_depends.iter())
            .filter(|dep| enabled.contains(*dep))
            .cloned()
            .collect();
        for dep in &depends {
            self.order_builds(dep, enabled, visited, build_order)?;
        }
        build_order.push(PackageBuild {
            name: name.to_string(),
            depends,
            os_packages: self
                .os_packages
                .get(name)
                .map(|packages| packages.iter().cloned().collect())
                .unwrap_or_default(),
        });
        Ok(())
    }

    fn selection_warnings(&self, selection: &PackageSelection) -> Vec<String> {
        let mut warnings = Vec::new();
        for (criterion, packages) in selection.iter() {
            for package in packages {
                let warning = if let Some(reason) = self.manifest.exclusion_reason(package) {
                    format!("{package}, which was selected for {criterion}, cannot be built: {reason}")
                } else if self.manifest.is_ignored(package) {
                    format!("{package}, which was selected for {criterion}, is ignored")
                } else {
                    continue;
                };
                tracing::warn!("{warning}");
                warnings.push(warning);
            }
        }
        warnings
    }
}
