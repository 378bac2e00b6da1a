//! Error types for wsman-core

use std::fmt;

use wsman_vcs::ImportError;

/// Result type for wsman-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving package sets or importing packages
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration itself is invalid; never retried
    #[error("{message}")]
    Config { message: String },

    /// A checkout or update failed, or the user interrupted it
    #[error(transparent)]
    Import(#[from] ImportError),

    /// OS packages could not be installed
    #[error("Failed to install OS packages {}: {message}", packages.join(", "))]
    Install {
        packages: Vec<String>,
        message: String,
    },

    /// Package sets import each other
    #[error(
        "Cannot resolve the dependencies between package sets, there seems to be a cycle amongst {}",
        sets.join(", ")
    )]
    CyclicImports { sets: Vec<String> },

    /// Internal consistency check failed
    #[error("Internal error: {message}")]
    Internal { message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from wsman-fs
    #[error(transparent)]
    Fs(#[from] wsman_fs::Error),

    /// VCS specification error from wsman-vcs
    #[error(transparent)]
    Vcs(#[from] wsman_vcs::Error),

    /// Configuration file error from wsman-meta
    #[error(transparent)]
    Meta(#[from] wsman_meta::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Import(e) if e.is_interrupt())
    }
}

/// A failure recorded instead of aborting the run.
#[derive(Debug)]
pub struct Failure {
    /// Package set or package the failure is about
    pub subject: String,
    pub error: Error,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.error)
    }
}

/// Collect-or-raise policy for recoverable failures.
///
/// With keep-going disabled every failure is handed back to the caller.
/// Interrupts are handed back whatever the setting.
#[derive(Debug, Default)]
pub struct KeepGoing {
    enabled: bool,
    failures: Vec<Failure>,
}

impl KeepGoing {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            failures: Vec::new(),
        }
    }

    /// Record `error` against `subject`, or return it.
    pub fn handle(&mut self, subject: impl Into<String>, error: Error) -> Result<()> {
        if !self.enabled || error.is_interrupt() {
            return Err(error);
        }
        let subject = subject.into();
        tracing::warn!(subject = %subject, error = %error, "Recorded failure, continuing");
        self.failures.push(Failure { subject, error });
        Ok(())
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<Failure> {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_lists_sets() {
        let error = Error::CyclicImports {
            sets: vec!["a".into(), "b".into()],
        };
        assert!(error.to_string().ends_with("amongst a, b"));
    }

    #[test]
    fn keep_going_collects_failures() {
        let mut keep_going = KeepGoing::new(true);
        keep_going
            .handle("base", ImportError::failed("base", "network down").into())
            .unwrap();
        assert_eq!(keep_going.failures().len(), 1);
        assert_eq!(
            keep_going.failures()[0].to_string(),
            "base: Failed to import base: network down"
        );
    }

    #[test]
    fn keep_going_never_collects_interrupts() {
        let mut keep_going = KeepGoing::new(true);
        let err = keep_going
            .handle("base", ImportError::Interrupted.into())
            .unwrap_err();
        assert!(err.is_interrupt());
        assert!(keep_going.failures().is_empty());
    }

    #[test]
    fn disabled_keep_going_raises() {
        let mut keep_going = KeepGoing::new(false);
        assert!(
            keep_going
                .handle("base", ImportError::failed("base", "boom").into())
                .is_err()
        );
        assert!(keep_going.into_failures().is_empty());
    }
}
