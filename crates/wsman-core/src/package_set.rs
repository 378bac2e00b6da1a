//! Package sets
//!
//! A package set is a directory (usually a checkout) holding a `source.yml`
//! description. Sets live in an arena owned by the resolution and refer to
//! each other through [`PackageSetId`].

use std::collections::BTreeMap;
use std::fmt;

use semver::{Version, VersionReq};
use wsman_fs::{NormalizedPath, WorkspaceLayout};
use wsman_meta::{PackageSetDescription, WorkspaceConfig};
use wsman_vcs::{ImporterRegistry, NormalizeContext, PinInfo, RawVcs, VcsDefinition};

use crate::names::check_package_set_name;
use crate::{Error, Result};

/// Version checked against `required_version`.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Stable identity of a package set within one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageSetId(usize);

impl PackageSetId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PackageSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Options attached to one import of a package set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetImportOptions {
    /// Follow the imported set's own imports
    pub auto_imports: bool,
}

impl Default for SetImportOptions {
    fn default() -> Self {
        Self { auto_imports: true }
    }
}

#[derive(Debug, Clone)]
pub struct PackageSet {
    id: PackageSetId,
    name: String,
    vcs: VcsDefinition,
    local_dir: NormalizedPath,
    explicit: bool,
    auto_imports: bool,
    imports: Vec<PackageSetId>,
    imported_from: Vec<PackageSetId>,
    description: Option<PackageSetDescription>,
}

impl PackageSet {
    /// A package set that still needs its description loaded.
    ///
    /// Remote sets live under `.remotes/<automatic name>`, local ones where
    /// their url points.
    pub fn new(
        id: PackageSetId,
        vcs: VcsDefinition,
        layout: &WorkspaceLayout,
        explicit: bool,
    ) -> Self {
        let local_dir = if vcs.needs_checkout() {
            layout
                .remotes_dir()
                .join(&wsman_vcs::automatic_name(&vcs))
        } else {
            NormalizedPath::new(vcs.url())
        };
        Self {
            id,
            name: String::new(),
            vcs,
            local_dir,
            explicit,
            auto_imports: true,
            imports: Vec::new(),
            imported_from: Vec::new(),
            description: None,
        }
    }

    /// The root package set, described by the workspace configuration.
    pub fn root(id: PackageSetId, layout: &WorkspaceLayout, config: &WorkspaceConfig) -> Self {
        let config_dir = layout.config_dir();
        let description = config.root_description();
        Self {
            id,
            name: description.name.clone(),
            vcs: VcsDefinition::local(&config_dir),
            local_dir: config_dir,
            explicit: true,
            auto_imports: true,
            imports: Vec::new(),
            imported_from: Vec::new(),
            description: Some(description),
        }
    }

    /// Read `source.yml` from the set's directory.
    ///
    /// Fails if the set was never checked out, if the file is absent or
    /// malformed, if its name is not a plain directory name, or if the set
    /// requires a newer tool.
    pub fn load_description_file(&mut self) -> Result<()> {
        if !self.local_dir.is_dir() {
            return Err(Error::config(format!(
                "package set {} has not been checked out in {}",
                self.vcs, self.local_dir
            )));
        }
        let description = wsman_meta::load_package_set_description(&self.local_dir)?;
        check_required_version(&description)?;
        check_package_set_name(&description.name)?;

        tracing::debug!(name = %description.name, dir = %self.local_dir, "Loaded package set description");
        self.name = description.name.clone();
        self.description = Some(description);
        Ok(())
    }

    /// The set's own declared imports, in declaration order.
    ///
    /// Empty until the description is loaded.
    pub fn each_raw_imported_set(&self) -> impl Iterator<Item = (RawVcs, SetImportOptions)> + '_ {
        self.description
            .iter()
            .flat_map(|description| description.imports.iter())
            .map(|entry| {
                (
                    entry.vcs(),
                    SetImportOptions {
                        auto_imports: entry.auto_imports(),
                    },
                )
            })
    }

    /// Context used to normalize the VCS specifications this set declares.
    pub fn normalize_context<'a>(&'a self, registry: &'a ImporterRegistry) -> NormalizeContext<'a> {
        NormalizeContext {
            base_dir: &self.local_dir,
            variables: self.constants(),
            registry,
        }
    }

    /// Pinning information for the set's checkout, if its VCS supports it.
    pub fn snapshot(&self, registry: &ImporterRegistry) -> Result<Option<PinInfo>> {
        let importer = registry.get(self.vcs.vcs_type()).ok_or_else(|| {
            Error::config(format!("no importer registered for {}", self.vcs))
        })?;
        Ok(importer.snapshot(&self.vcs, &self.local_dir)?)
    }

    pub fn id(&self) -> PackageSetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vcs(&self) -> &VcsDefinition {
        &self.vcs
    }

    /// Where the set's files are on disk.
    pub fn local_dir(&self) -> &NormalizedPath {
        &self.local_dir
    }

    /// Whether the root set imports this one directly.
    pub fn explicit(&self) -> bool {
        self.explicit
    }

    pub fn auto_imports(&self) -> bool {
        self.auto_imports
    }

    pub(crate) fn set_auto_imports(&mut self, auto_imports: bool) {
        self.auto_imports = auto_imports;
    }

    /// Sets this one imports, in the order the edges were recorded.
    pub fn imports(&self) -> &[PackageSetId] {
        &self.imports
    }

    /// Sets that import this one.
    pub fn imported_from(&self) -> &[PackageSetId] {
        &self.imported_from
    }

    pub fn description(&self) -> Option<&PackageSetDescription> {
        self.description.as_ref()
    }

    pub fn constants(&self) -> &BTreeMap<String, String> {
        static EMPTY: BTreeMap<String, String> = BTreeMap::new();
        self.description
            .as_ref()
            .map(|description| &description.constants)
            .unwrap_or(&EMPTY)
    }
}

#[cfg(test)]
impl PackageSet {
    /// A local set with a name and no description.
    pub(crate) fn named(id: usize, name: &str) -> Self {
        let layout = WorkspaceLayout::new("/ws");
        let dir = NormalizedPath::new("/sets").join(name);
        let mut set = Self::new(PackageSetId::new(id), VcsDefinition::local(&dir), &layout, false);
        set.name = name.to_string();
        set
    }
}

/// Record that `importer` imports `imported`, in both directions.
pub(crate) fn link(sets: &mut [PackageSet], importer: PackageSetId, imported: PackageSetId) {
    if importer == imported {
        return;
    }
    let forward = &mut sets[importer.index()].imports;
    if !forward.contains(&imported) {
        forward.push(imported);
    }
    let backward = &mut sets[imported.index()].imported_from;
    if !backward.contains(&importer) {
        backward.push(importer);
    }
}

fn check_required_version(description: &PackageSetDescription) -> Result<()> {
    let Some(requirement) = &description.required_version else {
        return Ok(());
    };
    let requirement = VersionReq::parse(requirement).map_err(|e| {
        Error::config(format!(
            "package set {} has an invalid required_version '{requirement}': {e}",
            description.name
        ))
    })?;
    let current = Version::parse(TOOL_VERSION)
        .map_err(|e| Error::internal(format!("invalid tool version {TOOL_VERSION}: {e}")))?;

    if !requirement.matches(&current) {
        return Err(Error::config(format!(
            "package set {} requires version {requirement}, but this is {current}",
            description.name
        )));
    }
    Ok(())
}
