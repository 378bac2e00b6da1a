//! Version control abstraction for wsman
//!
//! A [`VcsDefinition`] says where a package or package set comes from. The
//! [`ImporterRegistry`] maps each VCS type to the [`Importer`] that knows how
//! to check it out, update it and pin it.

pub mod definition;
pub mod error;
pub mod git;
pub mod importer;
pub mod interrupt;
pub mod local;
pub mod naming;

pub use definition::{NormalizeContext, RawVcs, VcsDefinition};
pub use error::{Error, ImportError, Result};
pub use git::GitImporter;
pub use importer::{ImportAction, ImportOptions, Importer, ImporterRegistry, PinInfo};
pub use interrupt::Interrupt;
pub use local::{LocalImporter, NoneImporter};
pub use naming::automatic_name;
