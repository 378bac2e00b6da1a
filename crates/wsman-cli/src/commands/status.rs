//! Status command implementation

use colored::Colorize;
use wsman_fs::WorkspaceLayout;
use wsman_vcs::Interrupt;

use crate::context::open_workspace;
use crate::error::Result;

/// Run the status command
pub fn run_status(layout: WorkspaceLayout, interrupt: Interrupt) -> Result<()> {
    let mut workspace = open_workspace(layout, interrupt)?;
    workspace.config_mut().checkout_only = true;
    workspace.update_package_sets()?;
    workspace.load_package_manifests()?;

    println!("{}", "Workspace Status".bold());
    println!();
    println!("{}:   {}", "Root".dimmed(), workspace.layout().root());
    println!("{}:     {}", "OS".dimmed(), workspace.manifest().os());
    println!();

    println!("{}:", "Package Sets".bold());
    for set in workspace.package_sets() {
        let packages = workspace
            .manifest()
            .packages_of_set(set.name())
            .map_or(0, <[String]>::len);
        println!(
            "  {} {} ({} packages)",
            "+".green(),
            set.name().cyan(),
            packages
        );
    }
    println!();

    let config = workspace.config();
    println!("{}:", "Excluded".bold());
    if config.exclude_packages.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for entry in &config.exclude_packages {
        println!("  {} {}: {}", "-".red(), entry.pattern().cyan(), entry.reason());
    }
    println!();

    println!("{}:", "Excluded packages".bold());
    let exclusions = workspace.manifest().exclusions();
    if exclusions.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for (name, reason) in exclusions {
        println!("  {} {}: {}", "-".red(), name.cyan(), reason);
    }
    println!();

    println!("{}:", "Ignored".bold());
    if config.ignore_packages.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for pattern in &config.ignore_packages {
        println!("  {} {}", "-".yellow(), pattern.cyan());
    }
    Ok(())
}
