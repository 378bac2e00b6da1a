//! Core engine for wsman
//!
//! This crate turns a workspace configuration into an ordered list of
//! package sets and a set of imported packages:
//!
//! - **Import resolution**: breadth-first walk of the package set imports,
//!   deduplicated by repository identity, with first-wins conflicts and
//!   name-collision redirection
//! - **Sequencing**: topological order of the package sets, root last,
//!   keeping the order the user listed them in
//! - **Package import**: FIFO walk of the selected packages and their
//!   dependencies, with exclusion propagation
//!
//! # Architecture
//!
//! `wsman-core` sits above the Layer 0 crates and below the CLI:
//!
//! ```text
//!                    wsman-cli
//!                        |
//!                   wsman-core
//!                        |
//!         +--------------+--------------+
//!         |              |              |
//!     wsman-fs       wsman-vcs      wsman-meta
//! ```
//!
//! # Example
//!
//! ```ignore
//! use wsman_core::{CommandProbeInstaller, OsdepInstaller, Workspace};
//! use wsman_fs::WorkspaceLayout;
//! use wsman_vcs::ImporterRegistry;
//!
//! fn update(layout: WorkspaceLayout) -> wsman_core::Result<()> {
//!     let installer = OsdepInstaller::new(Box::new(CommandProbeInstaller));
//!     let mut workspace = Workspace::load(layout, ImporterRegistry::with_builtins(), installer)?;
//!     workspace.update_package_sets()?;
//!     let report = workspace.import_packages::<&str>(&[])?;
//!     println!("{} packages enabled", report.enabled.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod exclusion;
pub mod manifest;
pub mod names;
pub mod osdeps;
pub mod overrides;
pub mod package_import;
pub mod package_set;
pub mod resolver;
pub mod selection;
pub mod sequence;
pub mod workspace;

pub use error::{Error, Failure, KeepGoing, Result};
pub use exclusion::{ReverseDependencies, add_reverse_dependency, propagate};
pub use manifest::{Manifest, PackageDefinition};
pub use osdeps::{
    CommandProbeInstaller, OsPackageInstaller, OsdepInstaller, OsdepResolution, resolve_osdep,
};
pub use overrides::Overrides;
pub use package_import::{ImportReport, PackageBuild, PackageWalker};
pub use package_set::{PackageSet, PackageSetId, SetImportOptions, TOOL_VERSION};
pub use resolver::{Resolution, Resolver, UpdateOptions};
pub use selection::PackageSelection;
pub use sequence::sequence;
pub use workspace::Workspace;
