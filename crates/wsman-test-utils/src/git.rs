//! Git repository fixtures.
//!
//! Upstreams are built with `git2` directly, so no `git` executable is
//! needed to run the tests.

use std::fs;
use std::path::Path;

/// Initialises a real git repository with one commit holding `files`.
///
/// The branch is `main`. Returns the repository, ready for more commits
/// through [`commit_files`].
///
/// # Panics
/// Panics if any git operation fails.
pub fn real_git_repo_with_commit(path: &Path, files: &[(&str, &str)]) -> git2::Repository {
    let mut options = git2::RepositoryInitOptions::new();
    options.initial_head("main");
    let repo = git2::Repository::init_opts(path, &options).unwrap_or_else(|e| {
        panic!(
            "real_git_repo_with_commit: failed to init repository at {}: {e}",
            path.display()
        )
    });
    commit_files(&repo, files, "Initial commit");
    repo
}

/// Writes `files` into the work tree of `repo` and commits them on HEAD.
///
/// Returns the new commit id as a hex string.
///
/// # Panics
/// Panics if any filesystem or git operation fails.
pub fn commit_files(repo: &git2::Repository, files: &[(&str, &str)], message: &str) -> String {
    let workdir = repo
        .workdir()
        .unwrap_or_else(|| panic!("commit_files: repository has no work tree"));

    let mut index = repo
        .index()
        .unwrap_or_else(|e| panic!("commit_files: failed to open index: {e}"));
    for (relative, content) in files {
        let full = workdir.join(relative);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("commit_files: failed to create {}: {e}", parent.display()));
        }
        fs::write(&full, content)
            .unwrap_or_else(|e| panic!("commit_files: failed to write {}: {e}", full.display()));
        index
            .add_path(Path::new(relative))
            .unwrap_or_else(|e| panic!("commit_files: failed to stage {relative}: {e}"));
    }
    index
        .write()
        .unwrap_or_else(|e| panic!("commit_files: failed to write index: {e}"));

    let tree_id = index
        .write_tree()
        .unwrap_or_else(|e| panic!("commit_files: failed to write tree: {e}"));
    let tree = repo
        .find_tree(tree_id)
        .unwrap_or_else(|e| panic!("commit_files: failed to find tree: {e}"));
    let signature = git2::Signature::now("Test User", "test@test.com")
        .unwrap_or_else(|e| panic!("commit_files: failed to create signature: {e}"));

    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    let oid = repo
        .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .unwrap_or_else(|e| panic!("commit_files: failed to commit: {e}"));
    oid.to_string()
}

/// File URL git2 can clone from.
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}
