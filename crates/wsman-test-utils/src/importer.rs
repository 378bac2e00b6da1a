//! [`ScriptedImporter`], a VCS importer answering from a script.
//!
//! Each url is scripted to materialize files, fail or raise the interrupt.
//! Every import call is recorded so tests can assert on fetch counts and
//! order.

use std::collections::BTreeMap;
use std::fs;
use std::sync::{Arc, Mutex, MutexGuard};

use wsman_fs::NormalizedPath;
use wsman_vcs::{
    ImportAction, ImportError, ImportOptions, Importer, ImporterRegistry, PinInfo, VcsDefinition,
};

#[derive(Debug, Clone, Default)]
struct Script {
    files: Vec<(String, String)>,
    failure: Option<String>,
    interrupt: bool,
}

#[derive(Debug, Default)]
struct State {
    scripts: BTreeMap<String, Script>,
    imports: Vec<String>,
}

/// Simulated checkouts keyed by url.
///
/// Clones share their script and call log.
///
/// # Example
///
/// ```rust,no_run
/// use wsman_test_utils::ScriptedImporter;
///
/// let importer = ScriptedImporter::new();
/// importer.package_set("https://example.com/base.git", "name: base\n");
/// importer.fail("https://example.com/broken.git", "connection refused");
/// let registry = importer.registry();
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedImporter {
    vcs_type: String,
    state: Arc<Mutex<State>>,
}

impl Default for ScriptedImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedImporter {
    /// An importer standing in for `git`.
    pub fn new() -> Self {
        Self::with_type("git")
    }

    pub fn with_type(vcs_type: &str) -> Self {
        Self {
            vcs_type: vcs_type.to_string(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|e| panic!("ScriptedImporter: poisoned state: {e}"))
    }

    /// Checking out `url` produces a package set with `source_yml`.
    pub fn package_set(&self, url: &str, source_yml: &str) -> &Self {
        self.files(url, &[("source.yml", source_yml)])
    }

    /// Checking out `url` writes `files` (relative path, content).
    pub fn files(&self, url: &str, files: &[(&str, &str)]) -> &Self {
        let mut state = self.state();
        let script = state.scripts.entry(url.to_string()).or_default();
        script
            .files
            .extend(files.iter().map(|(p, c)| (p.to_string(), c.to_string())));
        self
    }

    /// Importing `url` fails with `message`.
    pub fn fail(&self, url: &str, message: &str) -> &Self {
        self.state()
            .scripts
            .entry(url.to_string())
            .or_default()
            .failure = Some(message.to_string());
        self
    }

    /// Importing `url` raises the run's interrupt.
    pub fn interrupt(&self, url: &str) -> &Self {
        self.state()
            .scripts
            .entry(url.to_string())
            .or_default()
            .interrupt = true;
        self
    }

    /// Urls imported so far, in call order.
    pub fn imports(&self) -> Vec<String> {
        self.state().imports.clone()
    }

    /// How many times `url` was imported.
    pub fn import_count(&self, url: &str) -> usize {
        self.state().imports.iter().filter(|u| *u == url).count()
    }

    /// The builtin importers with this one in place of its VCS type.
    pub fn registry(&self) -> ImporterRegistry {
        let mut registry = ImporterRegistry::with_builtins();
        registry.register(Arc::new(self.clone()));
        registry
    }
}

impl Importer for ScriptedImporter {
    fn vcs_type(&self) -> &str {
        &self.vcs_type
    }

    fn required_osdep(&self) -> Option<&str> {
        Some(&self.vcs_type)
    }

    fn import(
        &self,
        vcs: &VcsDefinition,
        target_dir: &NormalizedPath,
        options: &ImportOptions,
    ) -> Result<ImportAction, ImportError> {
        options.interrupt.check()?;
        let script = {
            let mut state = self.state();
            state.imports.push(vcs.url().to_string());
            state.scripts.get(vcs.url()).cloned()
        };
        let Some(script) = script else {
            return Err(ImportError::failed(vcs.url(), "repository not found"));
        };
        if script.interrupt {
            options.interrupt.raise();
            return Err(ImportError::Interrupted);
        }
        if let Some(message) = script.failure {
            return Err(ImportError::failed(vcs.url(), message));
        }

        let present = self.is_present(target_dir);
        if present && options.checkout_only {
            return Ok(ImportAction::Skipped);
        }
        for (relative, content) in &script.files {
            let path = target_dir.join(relative).to_native();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| ImportError::failed(vcs.url(), e.to_string()))?;
            }
            fs::write(&path, content).map_err(|e| ImportError::failed(vcs.url(), e.to_string()))?;
        }
        fs::create_dir_all(target_dir.to_native())
            .map_err(|e| ImportError::failed(vcs.url(), e.to_string()))?;

        Ok(if present {
            ImportAction::Updated
        } else {
            ImportAction::CheckedOut
        })
    }

    fn snapshot(
        &self,
        vcs: &VcsDefinition,
        checkout_dir: &NormalizedPath,
    ) -> Result<Option<PinInfo>, ImportError> {
        if !checkout_dir.is_dir() {
            return Err(ImportError::failed(vcs.url(), "not checked out"));
        }
        let commit = format!("{:040x}", vcs.url().len());
        Ok(Some(PinInfo::from([("commit".to_string(), commit)])))
    }
}
