//! Importers for sources that are never fetched

use wsman_fs::NormalizedPath;

use crate::{ImportAction, ImportError, ImportOptions, Importer, PinInfo, VcsDefinition};

/// A directory that already exists on disk.
///
/// The directory is used in place; importing only checks it is there.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalImporter;

impl Importer for LocalImporter {
    fn vcs_type(&self) -> &str {
        "local"
    }

    fn import(
        &self,
        vcs: &VcsDefinition,
        _target_dir: &NormalizedPath,
        _options: &ImportOptions,
    ) -> Result<ImportAction, ImportError> {
        let dir = NormalizedPath::new(vcs.url());
        if dir.is_dir() {
            Ok(ImportAction::Skipped)
        } else {
            Err(ImportError::failed(
                vcs.to_string(),
                format!("local directory {dir} does not exist"),
            ))
        }
    }

    fn snapshot(
        &self,
        _vcs: &VcsDefinition,
        _checkout_dir: &NormalizedPath,
    ) -> Result<Option<PinInfo>, ImportError> {
        Ok(None)
    }
}

/// Packages whose sources are provided by some other means.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneImporter;

impl Importer for NoneImporter {
    fn vcs_type(&self) -> &str {
        "none"
    }

    fn import(
        &self,
        _vcs: &VcsDefinition,
        _target_dir: &NormalizedPath,
        _options: &ImportOptions,
    ) -> Result<ImportAction, ImportError> {
        Ok(ImportAction::Skipped)
    }

    fn snapshot(
        &self,
        _vcs: &VcsDefinition,
        _checkout_dir: &NormalizedPath,
    ) -> Result<Option<PinInfo>, ImportError> {
        Ok(None)
    }
}
