//! Snapshot command implementation

use std::path::Path;

use colored::Colorize;
use wsman_fs::{NormalizedPath, WorkspaceLayout};
use wsman_vcs::Interrupt;

use crate::context::open_workspace;
use crate::error::Result;

/// Run the snapshot command
pub fn run_snapshot(
    layout: WorkspaceLayout,
    interrupt: Interrupt,
    output: Option<&Path>,
) -> Result<()> {
    let mut workspace = open_workspace(layout, interrupt)?;
    workspace.config_mut().checkout_only = true;
    workspace.update_package_sets()?;

    let pinned = workspace.snapshot_package_sets()?;
    match output {
        Some(path) => {
            let path = NormalizedPath::new(std::path::absolute(path)?);
            wsman_meta::save_overrides(&path, &pinned)?;
            println!(
                "{} Pinned {} package set(s) in {}",
                "OK".green().bold(),
                pinned.entries.len(),
                path
            );
        }
        None => print!("{}", serde_yaml::to_string(&pinned)?),
    }
    Ok(())
}
