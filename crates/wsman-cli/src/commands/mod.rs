//! Command implementations for wsman-cli

pub mod sets;
pub mod snapshot;
pub mod status;
pub mod update;

pub use sets::run_sets;
pub use snapshot::run_snapshot;
pub use status::run_status;
pub use update::{UpdateArgs, run_update};
