//! Importer trait and registry

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use wsman_fs::NormalizedPath;

use crate::{GitImporter, ImportError, Interrupt, LocalImporter, NoneImporter, VcsDefinition};

/// Pinning information produced by a snapshot (`commit: <sha>`, ...).
pub type PinInfo = BTreeMap<String, String>;

/// Knobs shared by every import of a run.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Additional attempts after a failed network operation
    pub retry_count: u32,
    /// Check out missing trees but never update existing ones
    pub checkout_only: bool,
    /// Polled during long-running operations
    pub interrupt: Interrupt,
}

/// What an import actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    /// A fresh checkout was created
    CheckedOut,
    /// An existing checkout moved to a newer revision
    Updated,
    /// An existing checkout was already current
    UpToDate,
    /// Nothing to do (local directories, `checkout_only` on an existing tree)
    Skipped,
}

impl fmt::Display for ImportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::CheckedOut => "checked out",
            Self::Updated => "updated",
            Self::UpToDate => "up to date",
            Self::Skipped => "skipped",
        };
        f.write_str(text)
    }
}

/// Checks out, updates and pins one kind of VCS.
pub trait Importer: Send + Sync {
    /// VCS type this importer handles (`git`, `local`, ...)
    fn vcs_type(&self) -> &str;

    /// OS package that must be installed before this importer can run.
    fn required_osdep(&self) -> Option<&str> {
        None
    }

    /// Whether `target_dir` already holds a checkout.
    fn is_present(&self, target_dir: &NormalizedPath) -> bool {
        target_dir.is_dir()
    }

    /// Check out `vcs` into `target_dir`, or update the existing checkout.
    fn import(
        &self,
        vcs: &VcsDefinition,
        target_dir: &NormalizedPath,
        options: &ImportOptions,
    ) -> Result<ImportAction, ImportError>;

    /// Pinning information for the checkout in `checkout_dir`.
    ///
    /// `None` means the importer cannot pin anything (local directories).
    fn snapshot(
        &self,
        vcs: &VcsDefinition,
        checkout_dir: &NormalizedPath,
    ) -> Result<Option<PinInfo>, ImportError>;
}

/// VCS type to importer mapping.
#[derive(Clone, Default)]
pub struct ImporterRegistry {
    importers: BTreeMap<String, Arc<dyn Importer>>,
}

impl ImporterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the `git`, `local` and `none` importers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GitImporter::new()));
        registry.register(Arc::new(LocalImporter));
        registry.register(Arc::new(NoneImporter));
        registry
    }

    /// Add or replace the importer for its VCS type.
    pub fn register(&mut self, importer: Arc<dyn Importer>) {
        self.importers
            .insert(importer.vcs_type().to_string(), importer);
    }

    pub fn get(&self, vcs_type: &str) -> Option<Arc<dyn Importer>> {
        self.importers.get(vcs_type).cloned()
    }

    pub fn is_registered(&self, vcs_type: &str) -> bool {
        self.importers.contains_key(vcs_type)
    }

    /// Registered VCS types, sorted.
    pub fn types(&self) -> Vec<&str> {
        self.importers.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for ImporterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImporterRegistry")
            .field("types", &self.types())
            .finish()
    }
}
