//! Filesystem abstraction for wsman
//!
//! Provides normalized path handling, atomic I/O, the format-agnostic
//! configuration store and the on-disk layout of a workspace.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod layout;
pub mod path;

pub use config::{ConfigFormat, ConfigStore};
pub use constants::WorkspacePath;
pub use error::{Error, Result};
pub use layout::WorkspaceLayout;
pub use path::NormalizedPath;
