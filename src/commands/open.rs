//! Open command - create a new merge request record
//! Usage: mergectl open --source <branch> [--target <branch>] [--title <title>]

use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::config::CoordinatorConfig;
use crate::git::{self, GitBackend, VcsBackend};
use crate::models::request::MergeRequest;
use crate::store::FileStore;

/// Execute the open command
///
/// # Arguments
/// * `source` - Source branch to merge from
/// * `target` - Target branch; defaults to the repository default branch
/// * `title` - Optional human-readable title
/// * `remove_source_branch` - Delete the source branch after merging
/// * `user` - Acting user recorded as the request author
pub fn execute(
    source: String,
    target: Option<String>,
    title: Option<String>,
    remove_source_branch: bool,
    user: Option<String>,
) -> Result<()> {
    let repo_root = git::repo_root()?;
    let config = CoordinatorConfig::load(&repo_root)?;
    let backend = GitBackend::new(repo_root.clone());

    if !backend.branch_exists(&source)? {
        bail!("Source branch '{source}' does not exist");
    }

    let target = match target {
        Some(target) => target,
        None => backend
            .default_branch()
            .context("Failed to determine default branch")?,
    };
    if !backend.branch_exists(&target)? {
        bail!("Target branch '{target}' does not exist");
    }
    if source == target {
        bail!("Source and target branch are the same: '{source}'");
    }

    let author = match user {
        Some(user) => user,
        None => default_acting_user(&repo_root)?,
    };

    let mut request = MergeRequest::new(source, target, author);
    request.title = title;
    request.remove_source_branch = remove_source_branch;

    let store = FileStore::new(config.requests_path(&repo_root));
    store.save(&request)?;

    println!(
        "Opened merge request {} ({} -> {})",
        request.id.bold(),
        request.source_branch,
        request.target_branch
    );
    println!("Approve it with: mergectl approve {}", request.id);

    Ok(())
}

/// Default acting user from the repository's git identity.
pub fn default_acting_user(repo_root: &std::path::Path) -> Result<String> {
    let name = git::runner::run_git_checked(&["config", "user.name"], repo_root)
        .context("No git user.name configured; pass --user")?;
    let email = git::runner::run_git_checked(&["config", "user.email"], repo_root)
        .context("No git user.email configured; pass --user")?;
    Ok(format!("{name} <{email}>"))
}
