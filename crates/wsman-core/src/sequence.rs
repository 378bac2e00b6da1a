//! Package set ordering
//!
//! Orders resolved package sets so that every set comes after the sets it
//! imports, while keeping the order in which the root lists its imports.

use std::collections::VecDeque;

use crate::{Error, PackageSet, PackageSetId, Result};

/// Order `sets` for loading, root last.
///
/// Fails with [`Error::CyclicImports`] if the imports form a cycle.
pub fn sequence(sets: &[PackageSet], root: PackageSetId) -> Result<Vec<PackageSetId>> {
    let topological = topological_order(sets)?;

    let root_set = sets
        .get(root.index())
        .ok_or_else(|| Error::internal(format!("root package set {root} is not part of the resolution")))?;

    // The root's own imports keep the user's order
    let mut result: Vec<PackageSetId> = root_set.imports().to_vec();
    for id in topological {
        if id == root || result.contains(&id) {
            continue;
        }
        let set = &sets[id.index()];
        let position = set
            .imports()
            .iter()
            .filter_map(|dependency| result.iter().position(|placed| placed == dependency))
            .max();
        match position {
            Some(last_dependency) => result.insert(last_dependency + 1, id),
            None => result.insert(0, id),
        }
    }
    // Appended rather than inserted: a set imported only through the last of
    // the root's imports would otherwise end up after the root
    result.push(root);

    let root_count = result.iter().filter(|id| **id == root).count();
    if result.last() != Some(&root) || root_count != 1 || result.len() != sets.len() {
        let names: Vec<&str> = result.iter().map(|id| sets[id.index()].name()).collect();
        return Err(Error::internal(format!(
            "failed to sort the package sets: the root package set should be last, got {}",
            names.join(", ")
        )));
    }
    Ok(result)
}

/// Kahn-style passes over a FIFO queue of pending sets.
fn topological_order(sets: &[PackageSet]) -> Result<Vec<PackageSetId>> {
    let mut ordered: Vec<PackageSetId> = Vec::with_capacity(sets.len());
    let mut queue: VecDeque<PackageSetId> = sets.iter().map(PackageSet::id).collect();

    while !queue.is_empty() {
        let last_size = queue.len();
        let mut pending = std::mem::take(&mut queue);

        while let Some(id) = pending.pop_front() {
            let ready = sets[id.index()]
                .imports()
                .iter()
                .all(|dependency| ordered.contains(dependency));
            if ready {
                ordered.push(id);
            } else {
                queue.push_back(id);
            }
        }

        if queue.len() == last_size {
            let mut names: Vec<String> = queue
                .iter()
                .map(|id| sets[id.index()].name().to_string())
                .collect();
            names.sort();
            return Err(Error::CyclicImports { sets: names });
        }
    }
    Ok(ordered)
}
