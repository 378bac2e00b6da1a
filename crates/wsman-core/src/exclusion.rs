//! Exclusion propagation
//!
//! When a package is excluded, everything that strongly depends on it
//! becomes unbuildable as well. Each dependent records why, either as
//! `its dependency <pkg> is excluded: <reason>` (one hop) or as
//! `<reason> (dependency chain: C>B>A)`.

use std::collections::{BTreeMap, BTreeSet};

use crate::{Error, Manifest, Result};

/// Package name to the packages that strongly depend on it.
pub type ReverseDependencies = BTreeMap<String, BTreeSet<String>>;

/// Record that `dependent` strongly depends on `dependency`.
pub fn add_reverse_dependency(revdeps: &mut ReverseDependencies, dependency: &str, dependent: &str) {
    revdeps
        .entry(dependency.to_string())
        .or_default()
        .insert(dependent.to_string());
}

/// Propagate the exclusion of `name` to its reverse dependencies.
///
/// `name` must already be excluded. Packages that are already excluded keep
/// their reason and are not walked through, so calling this twice has no
/// further effect.
pub fn propagate(manifest: &mut Manifest, name: &str, revdeps: &ReverseDependencies) -> Result<()> {
    let reason = manifest.exclusion_reason(name).ok_or_else(|| {
        Error::internal(format!("cannot propagate the exclusion of {name}, which is not excluded"))
    })?;
    let mut chain = vec![name.to_string()];
    propagate_chain(manifest, &mut chain, revdeps, &reason);
    Ok(())
}

/// `chain` runs from the originally excluded package to the current one.
fn propagate_chain(
    manifest: &mut Manifest,
    chain: &mut Vec<String>,
    revdeps: &ReverseDependencies,
    root_reason: &str,
) {
    let Some(current) = chain.last().cloned() else {
        return;
    };
    let Some(dependents) = revdeps.get(&current) else {
        return;
    };

    for dependent in dependents {
        if manifest.is_excluded(dependent) {
            continue;
        }
        chain.push(dependent.clone());

        let reason = if chain.len() == 2 {
            format!("its dependency {} is excluded: {root_reason}", chain[0])
        } else {
            let rendered: Vec<&str> = chain.iter().rev().map(String::as_str).collect();
            format!("{root_reason} (dependency chain: {})", rendered.join(">"))
        };
        manifest.add_exclusion(dependent, reason);
        propagate_chain(manifest, chain, revdeps, root_reason);

        chain.pop();
    }
}
