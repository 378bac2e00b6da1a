//! Error types for wsman-vcs

/// Result type for wsman-vcs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading or patching a VCS specification.
///
/// All of these describe invalid configuration; none is transient.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid VCS specification {spec}: {message}")]
    InvalidSpec { spec: String, message: String },

    #[error("Unknown importer type '{vcs_type}' in {spec}")]
    UnknownImporter { vcs_type: String, spec: String },

    #[error("Unknown variable '{name}' in {spec}")]
    UnknownVariable { name: String, spec: String },

    #[error("Filesystem error: {0}")]
    Fs(#[from] wsman_fs::Error),
}

impl Error {
    pub(crate) fn invalid(spec: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSpec {
            spec: spec.into(),
            message: message.into(),
        }
    }
}

/// Outcome of a failed checkout, update or snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    /// The VCS operation failed (network, authentication, disk, ...)
    #[error("Failed to import {target}: {message}")]
    Failed { target: String, message: String },

    /// The operation was interrupted by the user
    #[error("Interrupted")]
    Interrupted,
}

impl ImportError {
    pub fn failed(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Interrupts are never collected, whatever the keep-going setting.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}
