//! Package set import resolution
//!
//! Starting from the root package set, walks the imports breadth-first,
//! checking each repository out (or updating it) exactly once, and
//! returns every set that was reached in processing order.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use wsman_fs::{NormalizedPath, WorkspaceLayout, io};
use wsman_vcs::{ImportOptions, ImporterRegistry, VcsDefinition};

use crate::package_set::link;
use crate::{
    Error, Failure, KeepGoing, OsdepInstaller, Overrides, PackageSet, PackageSetId, Result,
};

/// Settings shared by package set resolution and package import.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Collect import failures instead of aborting on the first one
    pub keep_going: bool,
    /// Passed through to the importers
    pub import: ImportOptions,
}

/// Outcome of a resolution.
#[derive(Debug)]
pub struct Resolution {
    /// Every resolved set, indexed by [`PackageSetId`], in processing order
    pub package_sets: Vec<PackageSet>,
    pub root: PackageSetId,
    /// Failures collected in keep-going mode
    pub failures: Vec<Failure>,
}

impl Resolution {
    pub fn get(&self, id: PackageSetId) -> &PackageSet {
        &self.package_sets[id.index()]
    }

    /// Names in processing order.
    pub fn names(&self) -> Vec<&str> {
        self.package_sets.iter().map(PackageSet::name).collect()
    }
}

/// An import waiting in the queue.
struct PendingImport {
    vcs: VcsDefinition,
    auto_imports: bool,
    importer: PackageSetId,
}

/// First resolution of a repository identity.
struct Resolved {
    vcs: VcsDefinition,
    importer: PackageSetId,
    /// `None` when the checkout failed and the branch was abandoned
    set: Option<PackageSetId>,
}

pub struct Resolver<'a> {
    layout: &'a WorkspaceLayout,
    registry: &'a ImporterRegistry,
    overrides: &'a Overrides,
    installer: &'a mut OsdepInstaller,
    options: &'a UpdateOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(
        layout: &'a WorkspaceLayout,
        registry: &'a ImporterRegistry,
        overrides: &'a Overrides,
        installer: &'a mut OsdepInstaller,
        options: &'a UpdateOptions,
    ) -> Self {
        Self {
            layout,
            registry,
            overrides,
            installer,
            options,
        }
    }

    /// Resolve every package set reachable from `root`.
    ///
    /// Stale checkouts under `.remotes` and stale links under
    /// `.wsman/remotes` are removed afterwards.
    pub fn resolve(mut self, root: PackageSet) -> Result<Resolution> {
        let root_id = PackageSetId::new(0);
        if root.id() != root_id {
            return Err(Error::internal("the root package set must have the first id"));
        }

        let mut keep_going = KeepGoing::new(self.options.keep_going);
        let mut by_key: BTreeMap<String, Resolved> = BTreeMap::new();
        let mut by_name: BTreeMap<String, (VcsDefinition, PackageSetId)> = BTreeMap::new();
        let mut visited_dirs: BTreeSet<NormalizedPath> = BTreeSet::new();

        by_key.insert(
            root.vcs().overrides_key(),
            Resolved {
                vcs: root.vcs().clone(),
                importer: root_id,
                set: Some(root_id),
            },
        );
        by_name.insert(root.name().to_string(), (root.vcs().clone(), root_id));

        let mut queue = VecDeque::new();
        self.enqueue_imports(&root, &mut queue)?;
        let mut sets = vec![root];

        while let Some(pending) = queue.pop_front() {
            self.options.import.interrupt.check()?;
            let key = pending.vcs.overrides_key();

            // Same repository already processed: only record the edge
            if let Some(resolved) = by_key.get(&key) {
                if resolved.importer != pending.importer && resolved.vcs != pending.vcs {
                    tracing::warn!(
                        "already loaded the package set from {} from {}, this overrides different settings ({}) found in {}",
                        resolved.vcs,
                        sets[resolved.importer.index()].name(),
                        pending.vcs,
                        sets[pending.importer.index()].name(),
                    );
                }
                if let Some(set) = resolved.set {
                    link(&mut sets, pending.importer, set);
                }
                continue;
            }
            by_key.insert(
                key.clone(),
                Resolved {
                    vcs: pending.vcs.clone(),
                    importer: pending.importer,
                    set: None,
                },
            );

            let id = PackageSetId::new(sets.len());
            let explicit = pending.importer == root_id;
            let mut set = PackageSet::new(id, pending.vcs.clone(), self.layout, explicit);

            if set.vcs().needs_checkout() {
                visited_dirs.insert(set.local_dir().clone());
                if let Err(error) = self.checkout(&set) {
                    keep_going.handle(set.vcs().to_string(), error)?;
                    if !set.local_dir().is_dir() {
                        tracing::warn!(vcs = %set.vcs(), "Package set is not checked out, skipping its imports");
                        continue;
                    }
                }
            }

            set.load_description_file()?;

            if let Some((other_vcs, other)) = by_name.get(set.name()) {
                tracing::warn!(
                    "{} from {} has the same name as the package set from {}, using the latter",
                    set.name(),
                    set.vcs(),
                    other_vcs,
                );
                let other = *other;
                if let Some(resolved) = by_key.get_mut(&key) {
                    resolved.set = Some(other);
                }
                if other != root_id {
                    link(&mut sets, pending.importer, other);
                }
                continue;
            }

            set.set_auto_imports(pending.auto_imports);
            if pending.auto_imports {
                self.enqueue_imports(&set, &mut queue)?;
            }
            by_name.insert(set.name().to_string(), (set.vcs().clone(), id));
            if let Some(resolved) = by_key.get_mut(&key) {
                resolved.set = Some(id);
            }
            tracing::debug!(name = %set.name(), vcs = %set.vcs(), "Resolved package set");
            sets.push(set);
            link(&mut sets, pending.importer, id);
        }

        self.collect_garbage(&visited_dirs)?;
        self.update_user_links(&sets)?;

        Ok(Resolution {
            package_sets: sets,
            root: root_id,
            failures: keep_going.into_failures(),
        })
    }

    fn enqueue_imports(&self, set: &PackageSet, queue: &mut VecDeque<PendingImport>) -> Result<()> {
        let ctx = set.normalize_context(self.registry);
        for (raw, options) in set.each_raw_imported_set() {
            let vcs = VcsDefinition::normalize(&raw, &ctx)?;
            let vcs = self.overrides.apply(&vcs, None, self.registry)?;
            queue.push_back(PendingImport {
                vcs,
                auto_imports: options.auto_imports,
                importer: set.id(),
            });
        }
        Ok(())
    }

    fn checkout(&mut self, set: &PackageSet) -> Result<()> {
        let importer = self.registry.get(set.vcs().vcs_type()).ok_or_else(|| {
            Error::config(format!("no importer registered for {}", set.vcs()))
        })?;
        if let Some(osdep) = importer.required_osdep() {
            self.installer.ensure(&[osdep.to_string()])?;
        }

        let action = importer.import(set.vcs(), set.local_dir(), &self.options.import)?;
        tracing::info!(vcs = %set.vcs(), action = %action, "Imported package set");
        Ok(())
    }

    /// Remove checkouts under `.remotes` that were not visited.
    fn collect_garbage(&self, visited: &BTreeSet<NormalizedPath>) -> Result<()> {
        let remotes = self.layout.remotes_dir();
        for entry in io::list_dir_names(&remotes)? {
            let path = remotes.join(&entry);
            if !visited.contains(&path) {
                tracing::warn!(path = %path, "Removing stale package set checkout");
                io::remove_path(&path)?;
            }
        }
        Ok(())
    }

    /// Recreate `.wsman/remotes/<name>` links, pruning the ones no longer needed.
    fn update_user_links(&self, sets: &[PackageSet]) -> Result<()> {
        let links_dir = self.layout.user_remotes_dir();
        let wanted: BTreeMap<&str, &NormalizedPath> = sets
            .iter()
            .skip(1)
            .map(|set| (set.name(), set.local_dir()))
            .collect();

        for entry in io::list_dir_names(&links_dir)? {
            if !wanted.contains_key(entry.as_str()) {
                tracing::debug!(link = %entry, "Removing stale package set link");
                io::remove_path(&links_dir.join(&entry))?;
            }
        }
        let links_dir = links_dir.clean();
        for (name, target) in wanted {
            let link = links_dir.join(name).clean();
            if link.parent().as_ref() != Some(&links_dir) {
                return Err(Error::config(format!(
                    "refusing to link package set {name:?} outside of {links_dir}"
                )));
            }
            io::replace_symlink(target, &link)?;
        }
        Ok(())
    }
}
