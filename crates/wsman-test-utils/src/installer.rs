//! [`RecordingInstaller`], an OS package installer that installs nothing.

use std::sync::{Arc, Mutex};

use wsman_core::{Error, OsPackageInstaller, OsdepInstaller, Result};

/// Records every install request. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingInstaller {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    missing: Arc<Mutex<Vec<String>>>,
}

impl RecordingInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installing `package` fails.
    pub fn missing(&self, package: &str) -> &Self {
        self.missing
            .lock()
            .unwrap_or_else(|e| panic!("RecordingInstaller: poisoned state: {e}"))
            .push(package.to_string());
        self
    }

    /// Install requests received so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(|e| panic!("RecordingInstaller: poisoned state: {e}"))
            .clone()
    }

    /// An [`OsdepInstaller`] backed by a clone of this recorder.
    pub fn installer(&self) -> OsdepInstaller {
        OsdepInstaller::new(Box::new(self.clone()))
    }
}

impl OsPackageInstaller for RecordingInstaller {
    fn install(&mut self, packages: &[String]) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| panic!("RecordingInstaller: poisoned state: {e}"))
            .push(packages.to_vec());

        let missing: Vec<String> = {
            let missing = self
                .missing
                .lock()
                .unwrap_or_else(|e| panic!("RecordingInstaller: poisoned state: {e}"));
            packages
                .iter()
                .filter(|package| missing.contains(package))
                .cloned()
                .collect()
        };
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Install {
                packages: missing,
                message: "not available in this test".into(),
            })
        }
    }
}
