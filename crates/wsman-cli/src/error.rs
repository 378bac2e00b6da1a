//! Error types for wsman-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from wsman-core
    #[error(transparent)]
    Core(#[from] wsman_core::Error),

    /// Error from wsman-fs
    #[error(transparent)]
    Fs(#[from] wsman_fs::Error),

    /// Error from wsman-meta
    #[error(transparent)]
    Meta(#[from] wsman_meta::Error),

    /// Snapshot serialization error
    #[error("Failed to serialize the snapshot: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
