//! Checkout directory names derived from a repository identity

use crate::VcsDefinition;

/// Directory name under which a remote package set is checked out.
///
/// Derived from the overrides key so that two specifications of the same
/// repository (e.g. differing only by branch) share one checkout.
/// `git:https://github.com/org/base.git` -> `git-https-github-com-org-base`
pub fn automatic_name(vcs: &VcsDefinition) -> String {
    slugify(&vcs.overrides_key())
}

/// Convert an identity string to a flat slug.
fn slugify(identity: &str) -> String {
    let mut result = String::with_capacity(identity.len());
    let mut last_was_dash = true; // Start true to skip leading dashes

    for c in identity.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            result.push(c);
            last_was_dash = false;
        } else if !last_was_dash {
            // Everything else, including '-', collapses to a single dash
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_url() {
        assert_eq!(
            slugify("git:https://github.com/org/base"),
            "git-https-github-com-org-base"
        );
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("--a//b--c--"), "a-b-c");
    }

    #[test]
    fn test_slugify_keeps_underscores() {
        assert_eq!(slugify("local:/ws/my_sets"), "local-ws-my_sets");
    }
}
