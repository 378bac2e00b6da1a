//! Sets command implementation

use colored::Colorize;
use wsman_fs::WorkspaceLayout;
use wsman_vcs::Interrupt;

use crate::context::open_workspace;
use crate::error::Result;

/// Run the sets command
pub fn run_sets(layout: WorkspaceLayout, interrupt: Interrupt) -> Result<()> {
    let mut workspace = open_workspace(layout, interrupt)?;
    workspace.config_mut().checkout_only = true;
    let failures = workspace.update_package_sets()?;

    println!("{}", "Package sets (load order)".bold());
    println!();
    for set in workspace.package_sets() {
        println!("{}", set.name().cyan().bold());
        println!("  {}:    {}", "VCS".dimmed(), set.vcs());
        println!("  {}:    {}", "Dir".dimmed(), set.local_dir());

        let imports: Vec<&str> = set
            .imports()
            .iter()
            .filter_map(|id| workspace.package_set(*id))
            .map(|imported| imported.name())
            .collect();
        if !imports.is_empty() {
            println!("  {}: {}", "Imports".dimmed(), imports.join(", "));
        }
    }

    for failure in &failures {
        println!("{}: {}", "warning".yellow().bold(), failure);
    }
    Ok(())
}
