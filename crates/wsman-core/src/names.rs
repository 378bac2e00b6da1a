//! Checks on names that end up as paths inside the workspace
//!
//! Package set names become `.wsman/remotes/<name>` and package names become
//! `<root>/<name>`, and both come from files fetched from elsewhere.

use crate::error::{Error, Result};

/// A package set name must be a single plain directory name.
pub fn check_package_set_name(name: &str) -> Result<()> {
    if name.contains('/') || !is_plain_segment(name) {
        return Err(Error::config(format!(
            "invalid package set name {name:?}: expected a single directory name"
        )));
    }
    Ok(())
}

/// A package name must be a relative path without `.` or `..` components.
pub fn check_package_name(name: &str) -> Result<()> {
    if !name.split('/').all(is_plain_segment) {
        return Err(Error::config(format!(
            "invalid package name {name:?}: expected a relative path without . or .. components"
        )));
    }
    Ok(())
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['\\', ':', '\0'])
}
