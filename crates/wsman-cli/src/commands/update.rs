//! Update command implementation

use colored::Colorize;
use wsman_core::{Failure, ImportReport};
use wsman_fs::WorkspaceLayout;
use wsman_vcs::Interrupt;

use crate::context::open_workspace;
use crate::error::{CliError, Result};

/// Command-line settings overriding the workspace configuration.
#[derive(Debug, Clone, Default)]
pub struct UpdateArgs {
    pub selection: Vec<String>,
    pub keep_going: bool,
    pub retry_count: Option<u32>,
    pub checkout_only: bool,
}

/// Run the update command
pub fn run_update(
    layout: WorkspaceLayout,
    interrupt: Interrupt,
    args: &UpdateArgs,
) -> Result<()> {
    let mut workspace = open_workspace(layout, interrupt)?;
    {
        let config = workspace.config_mut();
        config.keep_going |= args.keep_going;
        config.checkout_only |= args.checkout_only;
        if let Some(retry_count) = args.retry_count {
            config.retry_count = retry_count;
        }
    }

    println!("{}", "Updating package sets".bold());
    let set_failures = workspace.update_package_sets()?;
    for set in workspace.package_sets() {
        println!("  {} {} ({})", "+".green(), set.name().cyan(), set.vcs());
    }
    println!();

    println!("{}", "Importing packages".bold());
    let report = workspace.import_packages(&args.selection)?;
    print_report(&report);

    let failures: Vec<&Failure> = set_failures.iter().chain(report.failures.iter()).collect();
    if failures.is_empty() {
        return Ok(());
    }
    println!();
    println!("{}:", "Failures".red().bold());
    for failure in &failures {
        println!("  {} {}", "x".red(), failure);
    }
    Err(CliError::user(format!("{} import(s) failed", failures.len())))
}

fn print_report(report: &ImportReport) {
    if report.build_order.is_empty() {
        println!("  {}", "No package enabled".dimmed());
    }
    for build in &report.build_order {
        println!("  {} {}", "+".green(), build.name.cyan());
    }

    if !report.os_packages.is_empty() {
        println!();
        println!("{}:", "OS packages needed".bold());
        for package in &report.os_packages {
            println!("  {package}");
        }
    }

    if !report.warnings.is_empty() {
        println!();
        for warning in &report.warnings {
            println!("{}: {}", "warning".yellow().bold(), warning);
        }
    }
}
