//! Loaders for the files under a workspace
//!
//! ```text
//! <root>/.wsman/workspace.yml        WorkspaceConfig
//! <root>/.wsman/overrides.yml        OverridesFile (optional)
//! <set checkout>/source.yml          PackageSetDescription
//! <package srcdir>/manifest.yml      PackageManifestFile (optional)
//! ```

use wsman_fs::{ConfigStore, NormalizedPath, WorkspaceLayout, WorkspacePath};

use crate::{Error, OverridesFile, PackageManifestFile, PackageSetDescription, Result, WorkspaceConfig};

/// Load `.wsman/workspace.yml`.
pub fn load_workspace_config(layout: &WorkspaceLayout) -> Result<WorkspaceConfig> {
    let path = layout.workspace_config();
    if !path.is_file() {
        return Err(Error::ConfigNotFound {
            path: path.to_native(),
        });
    }
    Ok(ConfigStore::new().load(&path)?)
}

/// Load `.wsman/overrides.yml`, or an empty table if there is none.
pub fn load_overrides(layout: &WorkspaceLayout) -> Result<OverridesFile> {
    let path = layout.overrides_file();
    let overrides: Option<OverridesFile> = ConfigStore::new().load_optional(&path)?;
    Ok(overrides.unwrap_or_default())
}

/// Write an override table atomically.
pub fn save_overrides(path: &NormalizedPath, overrides: &OverridesFile) -> Result<()> {
    ConfigStore::new().save(path, overrides)?;
    tracing::debug!(path = %path, entries = overrides.entries.len(), "Saved overrides");
    Ok(())
}

/// Load the description file of a package set checked out in `dir`.
///
/// Fails if the set was never checked out or the file is absent or malformed.
pub fn load_package_set_description(dir: &NormalizedPath) -> Result<PackageSetDescription> {
    let path = dir.join(WorkspacePath::SourceFile.as_str());
    if !path.is_file() {
        return Err(Error::ConfigNotFound {
            path: path.to_native(),
        });
    }

    let description: PackageSetDescription = ConfigStore::new().load(&path)?;
    if description.name.trim().is_empty() {
        return Err(Error::InvalidConfig {
            path: path.to_native(),
            message: "package set name is empty".into(),
        });
    }
    Ok(description)
}

/// Load the manifest shipped in a package's source directory, if any.
pub fn load_package_manifest(srcdir: &NormalizedPath) -> Result<Option<PackageManifestFile>> {
    let path = srcdir.join(WorkspacePath::PackageManifest.as_str());
    Ok(ConfigStore::new().load_optional(&path)?)
}
