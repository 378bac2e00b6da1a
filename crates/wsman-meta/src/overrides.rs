//! Override table (`.wsman/overrides.yml`)
//!
//! ```yaml
//! "git:https://example.com/base.git": { branch: next }
//! drivers/imu: { type: local, url: /home/me/src/imu }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Key (raw VCS specification or package name) to VCS patch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverridesFile {
    pub entries: BTreeMap<String, BTreeMap<String, Value>>,
}

impl OverridesFile {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, patch: BTreeMap<String, Value>) {
        self.entries.insert(key.into(), patch);
    }
}
