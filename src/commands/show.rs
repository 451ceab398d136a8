//! Show command - display one merge request in detail
//! Usage: mergectl show <request_id>

use anyhow::Result;
use colored::Colorize;

use crate::config::CoordinatorConfig;
use crate::git;
use crate::store::{FileStore, RequestStore};

pub fn execute(request_id: String) -> Result<()> {
    let repo_root = git::repo_root()?;
    let config = CoordinatorConfig::load(&repo_root)?;
    let store = FileStore::new(config.requests_path(&repo_root));

    let request = store.load(&request_id)?;

    println!("{}", request.id.bold());
    if let Some(title) = &request.title {
        println!("  title:     {title}");
    }
    println!("  author:    {}", request.author);
    println!(
        "  branches:  {} -> {}",
        request.source_branch, request.target_branch
    );
    println!("  status:    {}", request.status);
    println!("  mergeable: {}", request.mergeable);
    if let Some(commit) = &request.merge_commit {
        println!("  merged as: {commit}");
    }
    if let Some(merged_at) = &request.merged_at {
        println!("  merged at: {merged_at}");
    }
    if let Some(error) = &request.merge_error {
        println!("  {} {error}", "last error:".red());
    }
    if request.in_progress_token.is_some() {
        println!("  {}", "a merge attempt is in progress".yellow());
    }

    Ok(())
}
