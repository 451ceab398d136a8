//! Merge command - run the coordinator against a merge request
//! Usage: mergectl merge <request_id> [--message <msg>] [--delete-source-branch]

use anyhow::{bail, Result};
use colored::Colorize;

use crate::config::CoordinatorConfig;
use crate::coordinator::identity::ConfigIdentityResolver;
use crate::coordinator::notify::{DesktopNotifier, LogNotifier, Notifier};
use crate::coordinator::{MergeCoordinator, MergeParams};
use crate::git::{self, GitBackend};
use crate::models::outcome::MergeOutcome;
use crate::store::FileStore;

use super::open::default_acting_user;

/// Execute the merge command
///
/// # Arguments
/// * `request_id` - The merge request to merge
/// * `message` - Commit message override
/// * `user` - Acting user; defaults to the repository git identity
/// * `delete_source_branch` - Delete the source branch after merging
pub fn execute(
    request_id: String,
    message: Option<String>,
    user: Option<String>,
    delete_source_branch: bool,
) -> Result<()> {
    let repo_root = git::repo_root()?;
    let config = CoordinatorConfig::load(&repo_root)?;

    let store = FileStore::new(config.requests_path(&repo_root));
    let backend = GitBackend::new(repo_root.clone());
    let resolver = ConfigIdentityResolver::new(config.users.clone());

    let desktop = DesktopNotifier;
    let log = LogNotifier;
    let notifier: &dyn Notifier = if config.notify { &desktop } else { &log };

    let coordinator = MergeCoordinator::new(&store, &backend, &resolver, notifier, &config);

    let mut params = MergeParams::new(match user {
        Some(user) => user,
        None => default_acting_user(&repo_root)?,
    });
    params.message = message;
    if delete_source_branch {
        params.delete_source_branch = Some(true);
    }

    match coordinator.execute(&request_id, &params) {
        MergeOutcome::Merged { commit_id } => {
            println!(
                "{} {} merged as {}",
                "✓".green(),
                request_id.bold(),
                commit_id
            );
            Ok(())
        }
        MergeOutcome::Aborted { reason } => {
            bail!("Merge aborted: {reason}");
        }
        MergeOutcome::AlreadyInProgress => {
            bail!("A merge attempt for {request_id} is already in progress");
        }
        MergeOutcome::Failed { reason, retryable } => {
            if retryable {
                eprintln!("{}", "The merge can be retried.".yellow());
            }
            bail!("Merge failed: {reason}");
        }
    }
}
