//! Shared test utilities for the wsman workspace.
//!
//! This crate provides the fixtures the crate test suites share. It is a
//! dev-dependency only and never published.
//!
//! # Modules
//!
//! - [`git`]: real git upstreams to check out from
//! - [`importer`]: [`ScriptedImporter`], simulated checkouts
//! - [`installer`]: [`RecordingInstaller`], an OS package installer that only records
//! - [`workspace`]: [`TestWorkspace`] builder for on-disk workspaces

pub mod git;
pub mod importer;
pub mod installer;
pub mod workspace;

pub use importer::ScriptedImporter;
pub use installer::RecordingInstaller;
pub use workspace::TestWorkspace;
