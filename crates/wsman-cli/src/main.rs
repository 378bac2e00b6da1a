//! wsman CLI
//!
//! The command-line interface for updating a workspace of package sets and
//! source packages.

mod cli;
mod commands;
mod context;
mod error;
mod signal;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wsman_vcs::Interrupt;

use cli::{Cli, Commands};
use commands::UpdateArgs;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(cli.verbose)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
    tracing::debug!("Verbose mode enabled");

    let Some(command) = cli.command else {
        println!("{} workspace manager", "wsman".green().bold());
        println!();
        println!("Run {} for available commands.", "wsman --help".cyan());
        return Ok(());
    };

    let cwd = std::env::current_dir()?;
    let layout = context::detect_layout(cli.root.as_deref(), &cwd)?;
    let interrupt = Interrupt::new();
    signal::raise_on_ctrl_c(&interrupt)?;
    match command {
        Commands::Update {
            selection,
            keep_going,
            retry_count,
            checkout_only,
        } => commands::run_update(
            layout,
            interrupt,
            &UpdateArgs {
                selection,
                keep_going,
                retry_count,
                checkout_only,
            },
        ),
        Commands::Sets => commands::run_sets(layout, interrupt),
        Commands::Snapshot { output } => commands::run_snapshot(layout, interrupt, output.as_deref()),
        Commands::Status => commands::run_status(layout, interrupt),
    }
}
