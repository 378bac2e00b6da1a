//! Workspace context
//!
//! Owns everything one run needs: layout, configuration, overrides,
//! importer table, manifest and the resolved package sets. Every operation
//! goes through this value; nothing is kept in global state.

use std::collections::BTreeMap;

use serde_yaml::Value;
use wsman_fs::WorkspaceLayout;
use wsman_meta::{OverridesFile, WorkspaceConfig};
use wsman_vcs::{ImportOptions, ImporterRegistry, Interrupt};

use crate::{
    Failure, ImportReport, Manifest, OsdepInstaller, Overrides, PackageSelection, PackageSet,
    PackageSetId, PackageWalker, Resolver, Result, UpdateOptions, sequence,
};

#[derive(Debug)]
pub struct Workspace {
    layout: WorkspaceLayout,
    config: WorkspaceConfig,
    overrides: Overrides,
    registry: ImporterRegistry,
    installer: OsdepInstaller,
    manifest: Manifest,
    interrupt: Interrupt,
    /// Resolved sets, indexed by id; the root is always id 0
    package_sets: Vec<PackageSet>,
    /// Sequenced order, root last
    order: Vec<PackageSetId>,
}

impl Workspace {
    /// Load the configuration and overrides of the workspace at `layout`.
    pub fn load(
        layout: WorkspaceLayout,
        registry: ImporterRegistry,
        installer: OsdepInstaller,
    ) -> Result<Self> {
        let config = wsman_meta::load_workspace_config(&layout)?;
        let overrides_file = wsman_meta::load_overrides(&layout)?;
        let overrides = Overrides::from_file(
            &overrides_file,
            &layout.config_dir(),
            &config.constants,
            &registry,
        )?;

        let mut manifest = Manifest::new(config.os());
        manifest.configure_exclusions(&config.exclude_packages, &config.ignore_packages);

        tracing::debug!(root = %layout.root(), os = %manifest.os(), "Loaded workspace");
        Ok(Self {
            layout,
            config,
            overrides,
            registry,
            installer,
            manifest,
            interrupt: Interrupt::new(),
            package_sets: Vec::new(),
            order: Vec::new(),
        })
    }

    /// Use `interrupt` to cancel running operations.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    fn update_options(&self) -> UpdateOptions {
        UpdateOptions {
            keep_going: self.config.keep_going,
            import: ImportOptions {
                retry_count: self.config.retry_count,
                checkout_only: self.config.checkout_only,
                interrupt: self.interrupt.clone(),
            },
        }
    }

    /// Resolve, check out and sequence the package sets, then register
    /// their packages in the manifest.
    ///
    /// Returns the failures collected in keep-going mode.
    pub fn update_package_sets(&mut self) -> Result<Vec<Failure>> {
        let options = self.update_options();
        let root = PackageSet::root(PackageSetId::new(0), &self.layout, &self.config);
        let resolution = Resolver::new(
            &self.layout,
            &self.registry,
            &self.overrides,
            &mut self.installer,
            &options,
        )
        .resolve(root)?;

        let order = sequence(&resolution.package_sets, resolution.root)?;

        self.manifest.reset_package_sets();
        for id in &order {
            self.manifest.register_package_set(
                &resolution.package_sets[id.index()],
                &self.layout,
                &self.registry,
                &self.overrides,
            )?;
        }
        self.manifest
            .configure_exclusions(&self.config.exclude_packages, &self.config.ignore_packages);

        tracing::info!(count = order.len(), "Package sets up to date");
        self.package_sets = resolution.package_sets;
        self.order = order;
        Ok(resolution.failures)
    }

    /// Import the packages matching `criteria`.
    ///
    /// Without criteria, the configured layout is used, and without a
    /// layout every known package.
    pub fn import_packages<S: AsRef<str>>(&mut self, criteria: &[S]) -> Result<ImportReport> {
        let selection = if !criteria.is_empty() {
            PackageSelection::resolve(criteria, &self.manifest)?
        } else if !self.config.layout.is_empty() {
            PackageSelection::resolve(&self.config.layout, &self.manifest)?
        } else {
            PackageSelection::all(&self.manifest)
        };

        let options = self.update_options();
        PackageWalker::new(&mut self.manifest, &self.registry, &mut self.installer, &options)
            .import(&selection)
    }

    /// Read the `manifest.yml` of every package whose sources are present.
    ///
    /// Packages that do not support the current OS end up in
    /// [`Manifest::exclusions`] without importing anything.
    pub fn load_package_manifests(&mut self) -> Result<()> {
        let names: Vec<String> = self.manifest.packages().map(|p| p.name.clone()).collect();
        for name in &names {
            self.manifest.load_package_manifest(name)?;
        }
        Ok(())
    }

    /// Overrides pinning every checked-out package set to its current state.
    pub fn snapshot_package_sets(&self) -> Result<OverridesFile> {
        let mut file = OverridesFile::default();
        for set in self.package_sets() {
            if !set.vcs().needs_checkout() {
                continue;
            }
            let Some(pin) = set.snapshot(&self.registry)? else {
                continue;
            };
            let patch: BTreeMap<String, Value> = pin
                .into_iter()
                .map(|(field, value)| (field, Value::String(value)))
                .collect();
            tracing::debug!(set = %set.name(), vcs = %set.vcs(), "Pinned package set");
            file.insert(set.vcs().overrides_key(), patch);
        }
        Ok(file)
    }

    /// Resolved package sets in sequenced order, root last.
    pub fn package_sets(&self) -> impl Iterator<Item = &PackageSet> {
        self.order.iter().map(|id| &self.package_sets[id.index()])
    }

    pub fn package_set(&self, id: PackageSetId) -> Option<&PackageSet> {
        self.package_sets.get(id.index())
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Command-line options override the file's settings through this.
    pub fn config_mut(&mut self) -> &mut WorkspaceConfig {
        &mut self.config
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn registry(&self) -> &ImporterRegistry {
        &self.registry
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }
}
