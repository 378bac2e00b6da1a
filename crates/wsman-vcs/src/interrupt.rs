//! Cooperative interruption of long-running imports

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ImportError;

/// Shared flag raised when the user asks to stop.
///
/// Clones share the same flag. Queue loops call [`Interrupt::check`] between
/// steps and the git importer polls it from its transfer callbacks.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    raised: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request interruption.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Return `Err(ImportError::Interrupted)` once the flag is raised.
    pub fn check(&self) -> Result<(), ImportError> {
        if self.is_raised() {
            Err(ImportError::Interrupted)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let interrupt = Interrupt::new();
        let clone = interrupt.clone();
        assert!(clone.check().is_ok());

        interrupt.raise();
        assert_eq!(clone.check(), Err(ImportError::Interrupted));
    }
}
