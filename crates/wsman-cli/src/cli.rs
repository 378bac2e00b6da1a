//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// wsman - Check out and update the package sets and packages of a workspace
#[derive(Parser, Debug)]
#[command(name = "wsman")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace root (default: discovered from the current directory)
    #[arg(long, global = true, env = "WSMAN_ROOT")]
    pub root: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Update the package sets, then import the selected packages
    ///
    /// Without a selection, the workspace layout is used, and without a
    /// layout every package.
    ///
    /// Examples:
    ///   wsman update                  # Everything in the layout
    ///   wsman update drivers/imu      # One package and its dependencies
    ///   wsman update robotics -k      # A whole package set, keep going on errors
    Update {
        /// Package names, package set names or directory prefixes
        selection: Vec<String>,

        /// Collect failures instead of stopping at the first one
        #[arg(short, long)]
        keep_going: bool,

        /// Additional attempts after a failed network operation
        #[arg(long)]
        retry_count: Option<u32>,

        /// Check out missing repositories but do not update existing ones
        #[arg(long)]
        checkout_only: bool,
    },

    /// List the package sets in load order
    Sets,

    /// Pin every package set to its current commit
    ///
    /// The result is an overrides file; copy it to .wsman/overrides.yml to
    /// reproduce the current state.
    Snapshot {
        /// Write to this file instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the package sets and the exclusions of the workspace
    Status,
}
