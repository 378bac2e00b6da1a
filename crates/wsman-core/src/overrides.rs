//! Normalized override table
//!
//! `overrides.yml` keys are either VCS specifications, normalized here to
//! their overrides key, or package names.

use std::collections::BTreeMap;

use serde_yaml::Value;
use wsman_fs::NormalizedPath;
use wsman_meta::OverridesFile;
use wsman_vcs::{ImporterRegistry, NormalizeContext, RawVcs, VcsDefinition};

use crate::Result;

type Patch = BTreeMap<String, Value>;

/// Override patches ready to apply.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Directory relative paths in patches are resolved from
    base_dir: NormalizedPath,
    variables: BTreeMap<String, String>,
    by_key: BTreeMap<String, Patch>,
    by_package: BTreeMap<String, Patch>,
}

impl Overrides {
    /// Normalize the keys of an override file.
    ///
    /// `base_dir` is the directory holding the file and `variables` the
    /// workspace constants.
    pub fn from_file(
        file: &OverridesFile,
        base_dir: &NormalizedPath,
        variables: &BTreeMap<String, String>,
        registry: &ImporterRegistry,
    ) -> Result<Self> {
        let ctx = NormalizeContext {
            base_dir,
            variables,
            registry,
        };
        let mut overrides = Self {
            base_dir: base_dir.clone(),
            variables: variables.clone(),
            ..Default::default()
        };

        for (key, patch) in &file.entries {
            if key.contains(':') {
                let vcs = VcsDefinition::normalize(&RawVcs::from(key.as_str()), &ctx)?;
                overrides.by_key.insert(vcs.overrides_key(), patch.clone());
            } else {
                overrides.by_package.insert(key.clone(), patch.clone());
            }
        }
        Ok(overrides)
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty() && self.by_package.is_empty()
    }

    /// Apply the patch registered for `vcs`'s overrides key, then the one
    /// registered for `package`.
    pub fn apply(
        &self,
        vcs: &VcsDefinition,
        package: Option<&str>,
        registry: &ImporterRegistry,
    ) -> Result<VcsDefinition> {
        let ctx = NormalizeContext {
            base_dir: &self.base_dir,
            variables: &self.variables,
            registry,
        };

        let mut result = vcs.clone();
        if let Some(patch) = self.by_key.get(&vcs.overrides_key()) {
            result = result.apply_override(patch, &ctx)?;
            tracing::debug!(from = %vcs, to = %result, "Applied override");
        }
        if let Some(name) = package
            && let Some(patch) = self.by_package.get(name)
        {
            let before = result.clone();
            result = result.apply_override(patch, &ctx)?;
            tracing::debug!(package = %name, from = %before, to = %result, "Applied package override");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(entries: &[(&str, &str)]) -> Patch {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn applies_by_key_then_by_package() {
        let registry = ImporterRegistry::with_builtins();
        let base = NormalizedPath::new("/ws/.wsman");
        let mut file = OverridesFile::default();
        file.insert("git:https://example.com/imu.git", patch(&[("branch", "next")]));
        file.insert("drivers/imu", patch(&[("tag", "v1.0")]));
        let overrides = Overrides::from_file(&file, &base, &BTreeMap::new(), &registry).unwrap();

        let vcs = VcsDefinition::normalize(
            &RawVcs::from("git:https://example.com/imu"),
            &NormalizeContext {
                base_dir: &base,
                variables: &BTreeMap::new(),
                registry: &registry,
            },
        )
        .unwrap();

        let patched = overrides.apply(&vcs, Some("drivers/imu"), &registry).unwrap();
        assert_eq!(patched.option("branch"), Some("next"));
        assert_eq!(patched.option("tag"), Some("v1.0"));

        let untouched = overrides.apply(&vcs, Some("planning"), &registry).unwrap();
        assert_eq!(untouched.option("tag"), None);
    }
}
