//! Workspace context detection
//!
//! Finds the workspace root from any directory below it, git-like, and
//! opens the workspace with the builtin importers.

use std::path::Path;

use colored::Colorize;
use wsman_core::{CommandProbeInstaller, OsdepInstaller, Workspace};
use wsman_fs::{NormalizedPath, WorkspaceLayout, io};
use wsman_vcs::{ImporterRegistry, Interrupt};

use crate::error::{CliError, Result};

/// Layout of the workspace at `root`, or of the one containing `cwd`.
pub fn detect_layout(root: Option<&Path>, cwd: &Path) -> Result<WorkspaceLayout> {
    match root {
        Some(root) => {
            let root = io::canonicalize(&NormalizedPath::new(root))
                .map_err(|_| CliError::user(format!("{} does not exist", root.display())))?;
            let layout = WorkspaceLayout::new(root);
            if !layout.workspace_config().is_file() {
                return Err(CliError::user(format!(
                    "{} has no {}",
                    layout.root(),
                    ".wsman/workspace.yml".cyan()
                )));
            }
            Ok(layout)
        }
        None => WorkspaceLayout::discover(cwd).map_err(|_| {
            CliError::user(format!(
                "Not inside a wsman workspace (no {} found above {})",
                ".wsman/workspace.yml".cyan(),
                cwd.display()
            ))
        }),
    }
}

/// Open the workspace with the git, local and none importers.
///
/// VCS tools are not installed, only checked for on `PATH`. Imports stop once
/// `interrupt` is raised.
pub fn open_workspace(layout: WorkspaceLayout, interrupt: Interrupt) -> Result<Workspace> {
    let installer = OsdepInstaller::new(Box::new(CommandProbeInstaller));
    let workspace = Workspace::load(layout, ImporterRegistry::with_builtins(), installer)?;
    Ok(workspace.with_interrupt(interrupt))
}
