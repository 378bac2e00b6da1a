//! Git importer backed by libgit2

use std::time::Duration;

use backoff::ExponentialBackoff;
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{AutotagOption, Commit, ErrorClass, FetchOptions, RemoteCallbacks, Repository};
use wsman_fs::{NormalizedPath, io};

use crate::{
    ImportAction, ImportError, ImportOptions, Importer, Interrupt, PinInfo, VcsDefinition,
};

/// Imports git repositories.
///
/// Recognized options:
/// - `branch`: branch to track (defaults to the remote's default branch)
/// - `tag` / `commit`: pin to a revision, leaving HEAD detached
#[derive(Debug, Clone)]
pub struct GitImporter {
    retry_interval: Duration,
}

/// What the working tree should end up on.
enum Revision<'a> {
    Branch(String),
    Pinned(&'a str),
}

impl GitImporter {
    pub fn new() -> Self {
        Self {
            retry_interval: Duration::from_secs(1),
        }
    }

    /// Initial delay between retries of a failed network operation.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Run `op` until it succeeds, fails permanently or exhausts `retry_count`.
    fn with_retry<T>(
        &self,
        target: &str,
        options: &ImportOptions,
        mut op: impl FnMut() -> Result<T, git2::Error>,
    ) -> Result<T, ImportError> {
        let policy = ExponentialBackoff {
            initial_interval: self.retry_interval,
            current_interval: self.retry_interval,
            max_elapsed_time: None,
            ..Default::default()
        };
        let mut attempts = 0u32;

        backoff::retry(policy, || {
            options.interrupt.check().map_err(backoff::Error::permanent)?;
            attempts += 1;
            op().map_err(|e| {
                if options.interrupt.is_raised() {
                    return backoff::Error::permanent(ImportError::Interrupted);
                }
                let error = ImportError::failed(target, e.message());
                if attempts > options.retry_count || !is_transient(&e) {
                    backoff::Error::permanent(error)
                } else {
                    tracing::warn!(
                        repository = %target,
                        attempt = attempts,
                        error = %e.message(),
                        "Git operation failed, retrying"
                    );
                    backoff::Error::transient(error)
                }
            })
        })
        .map_err(|e| match e {
            backoff::Error::Permanent(err) => err,
            backoff::Error::Transient { err, .. } => err,
        })
    }

    fn checkout(
        &self,
        vcs: &VcsDefinition,
        target_dir: &NormalizedPath,
        options: &ImportOptions,
    ) -> Result<ImportAction, ImportError> {
        let target = vcs.to_string();
        let existed = target_dir.exists();
        if existed {
            let entries = io::list_dir_names(target_dir)
                .map_err(|e| ImportError::failed(&target, e.to_string()))?;
            if !entries.is_empty() {
                return Err(ImportError::failed(
                    &target,
                    format!("{target_dir} exists but is not a git checkout"),
                ));
            }
        }

        let result = self.with_retry(&target, options, || {
            discard_partial_clone(target_dir, existed)
                .map_err(|e| git2::Error::from_str(&e.to_string()))?;

            let mut builder = RepoBuilder::new();
            builder.fetch_options(fetch_options(&options.interrupt));
            if let Some(branch) = vcs.option("branch") {
                builder.branch(branch);
            }
            let repo = builder.clone(vcs.url(), &target_dir.to_native())?;

            if let Revision::Pinned(rev) = revision(vcs, &repo)? {
                let commit = repo.revparse_single(rev)?.peel_to_commit()?;
                detach_at(&repo, &commit)?;
            }
            Ok(())
        });
        if let Err(error) = result {
            if let Err(cleanup) = discard_partial_clone(target_dir, existed) {
                tracing::warn!(dir = %target_dir, error = %cleanup, "Failed to remove partial clone");
            }
            return Err(error);
        }

        tracing::info!(vcs = %vcs, dir = %target_dir, "Checked out");
        Ok(ImportAction::CheckedOut)
    }

    fn update(
        &self,
        vcs: &VcsDefinition,
        target_dir: &NormalizedPath,
        options: &ImportOptions,
    ) -> Result<ImportAction, ImportError> {
        let target = vcs.to_string();
        let repo = Repository::open(target_dir.to_native())
            .map_err(|e| ImportError::failed(&target, e.message()))?;

        self.with_retry(&target, options, || {
            let mut remote = repo.find_remote("origin")?;
            let mut fetch = fetch_options(&options.interrupt);
            fetch.download_tags(AutotagOption::All);
            remote.fetch::<&str>(&[], Some(&mut fetch), None)
        })?;

        let action = move_to_revision(&repo, vcs)
            .map_err(|e| ImportError::failed(&target, e.message()))?;
        tracing::debug!(vcs = %vcs, dir = %target_dir, action = %action, "Updated");
        Ok(action)
    }
}

impl Default for GitImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Importer for GitImporter {
    fn vcs_type(&self) -> &str {
        "git"
    }

    fn required_osdep(&self) -> Option<&str> {
        Some("git")
    }

    fn is_present(&self, target_dir: &NormalizedPath) -> bool {
        target_dir.join(".git").exists()
    }

    fn import(
        &self,
        vcs: &VcsDefinition,
        target_dir: &NormalizedPath,
        options: &ImportOptions,
    ) -> Result<ImportAction, ImportError> {
        options.interrupt.check()?;

        if !self.is_present(target_dir) {
            return self.checkout(vcs, target_dir, options);
        }
        if options.checkout_only {
            return Ok(ImportAction::Skipped);
        }
        self.update(vcs, target_dir, options)
    }

    fn snapshot(
        &self,
        vcs: &VcsDefinition,
        checkout_dir: &NormalizedPath,
    ) -> Result<Option<PinInfo>, ImportError> {
        let failed = |e: git2::Error| ImportError::failed(vcs.to_string(), e.message());
        let repo = Repository::open(checkout_dir.to_native()).map_err(failed)?;
        let head = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(failed)?;

        let mut pin = PinInfo::new();
        pin.insert("commit".to_string(), head.id().to_string());
        Ok(Some(pin))
    }
}

/// Remove what a failed clone left in `target_dir`.
///
/// A directory that existed before the checkout was empty, so only its
/// contents are ours to remove.
fn discard_partial_clone(target_dir: &NormalizedPath, existed: bool) -> wsman_fs::Result<()> {
    if !existed {
        return io::remove_path(target_dir);
    }
    for entry in io::list_dir_names(target_dir)? {
        io::remove_path(&target_dir.join(&entry))?;
    }
    Ok(())
}

fn fetch_options(interrupt: &Interrupt) -> FetchOptions<'static> {
    let interrupt = interrupt.clone();
    let mut callbacks = RemoteCallbacks::new();
    // Returning false aborts the transfer
    callbacks.transfer_progress(move |_| !interrupt.is_raised());

    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}

fn is_transient(error: &git2::Error) -> bool {
    matches!(
        error.class(),
        ErrorClass::Net | ErrorClass::Http | ErrorClass::Ssh | ErrorClass::Ssl
    )
}

fn revision<'a>(vcs: &'a VcsDefinition, repo: &Repository) -> Result<Revision<'a>, git2::Error> {
    if let Some(rev) = vcs.option("commit").or_else(|| vcs.option("tag")) {
        return Ok(Revision::Pinned(rev));
    }
    if let Some(branch) = vcs.option("branch") {
        return Ok(Revision::Branch(branch.to_string()));
    }
    let head = repo.head()?;
    match head.shorthand() {
        Some(name) if head.is_branch() => Ok(Revision::Branch(name.to_string())),
        _ => Ok(Revision::Pinned("refs/remotes/origin/HEAD")),
    }
}

fn move_to_revision(repo: &Repository, vcs: &VcsDefinition) -> Result<ImportAction, git2::Error> {
    let head = repo.head()?.peel_to_commit()?.id();
    match revision(vcs, repo)? {
        Revision::Pinned(rev) => {
            let commit = repo.revparse_single(rev)?.peel_to_commit()?;
            if commit.id() == head && repo.head_detached()? {
                return Ok(ImportAction::UpToDate);
            }
            detach_at(repo, &commit)?;
            Ok(ImportAction::Updated)
        }
        Revision::Branch(branch) => fast_forward(repo, &branch, head),
    }
}

fn fast_forward(
    repo: &Repository,
    branch: &str,
    head: git2::Oid,
) -> Result<ImportAction, git2::Error> {
    let upstream = repo
        .revparse_single(&format!("refs/remotes/origin/{branch}"))?
        .peel_to_commit()?;
    let refname = format!("refs/heads/{branch}");

    let local = match repo.find_reference(&refname) {
        Ok(reference) => reference.peel_to_commit()?.id(),
        Err(_) => {
            repo.branch(branch, &upstream, false)?;
            upstream.id()
        }
    };

    if local == upstream.id() && local == head {
        return Ok(ImportAction::UpToDate);
    }

    if local != upstream.id() {
        if !repo.graph_descendant_of(upstream.id(), local)? {
            return Err(git2::Error::from_str(&format!(
                "cannot fast-forward {branch} from {local} to {}, manual merge required",
                upstream.id()
            )));
        }
        repo.find_reference(&refname)?
            .set_target(upstream.id(), &format!("wsman: fast-forward to {}", upstream.id()))?;
    }

    repo.set_head(&refname)?;
    repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
    Ok(ImportAction::Updated)
}

fn detach_at(repo: &Repository, commit: &Commit<'_>) -> Result<(), git2::Error> {
    repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::default().force()))?;
    repo.set_head_detached(commit.id())
}
