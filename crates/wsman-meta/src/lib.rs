//! Configuration schemas for wsman.
//!
//! Serde types for every file wsman reads or writes: the workspace
//! configuration, package-set descriptions, the overrides table and
//! per-package manifests, plus the loaders that find them on disk.

pub mod error;
pub mod loader;
pub mod manifest;
pub mod overrides;
pub mod source;
pub mod workspace;

pub use error::{Error, Result};
pub use loader::{
    load_overrides, load_package_manifest, load_package_set_description, load_workspace_config,
    save_overrides,
};
pub use manifest::PackageManifestFile;
pub use overrides::OverridesFile;
pub use source::{ImportEntry, OsdepEntry, PackageEntry, PackageSetDescription};
pub use workspace::{ExcludeEntry, WorkspaceConfig};
