//! List command - show all merge requests
//! Usage: mergectl list

use anyhow::Result;
use colored::Colorize;

use crate::config::CoordinatorConfig;
use crate::git;
use crate::models::request::MergeRequestStatus;
use crate::store::FileStore;

pub fn execute() -> Result<()> {
    let repo_root = git::repo_root()?;
    let config = CoordinatorConfig::load(&repo_root)?;
    let store = FileStore::new(config.requests_path(&repo_root));

    let requests = store.list()?;
    if requests.is_empty() {
        println!("No merge requests.");
        return Ok(());
    }

    for request in requests {
        let status = match request.status {
            MergeRequestStatus::Open if request.mergeable => "open".green(),
            MergeRequestStatus::Open => "open (not mergeable)".yellow(),
            MergeRequestStatus::Merged => "merged".blue(),
            MergeRequestStatus::Closed => "closed".red(),
        };

        println!(
            "{}  {} -> {}  [{}]{}",
            request.id.bold(),
            request.source_branch,
            request.target_branch,
            status,
            request
                .title
                .as_deref()
                .map(|t| format!("  {t}"))
                .unwrap_or_default()
        );
    }

    Ok(())
}
