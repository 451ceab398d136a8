//! Lifecycle commands for merge requests: approve, close, reopen
//!
//! `approve` flips the readiness flag that the coordinator's precondition
//! check reads. In a full platform that flag would be owned by the review
//! layer; here it is driven by hand.

use anyhow::Result;
use colored::Colorize;

use crate::config::CoordinatorConfig;
use crate::git;
use crate::models::request::MergeRequestStatus;
use crate::store::{FileStore, RequestStore};

fn open_store() -> Result<FileStore> {
    let repo_root = git::repo_root()?;
    let config = CoordinatorConfig::load(&repo_root)?;
    Ok(FileStore::new(config.requests_path(&repo_root)))
}

/// Mark a request as mergeable.
pub fn approve(request_id: String) -> Result<()> {
    let store = open_store()?;
    let mut request = store.load(&request_id)?;
    request.mergeable = true;
    request.touch();
    store.save(&request)?;

    println!("{} {} is now mergeable", "✓".green(), request_id.bold());
    Ok(())
}

/// Close a request without merging.
pub fn close(request_id: String) -> Result<()> {
    let store = open_store()?;
    let mut request = store.load(&request_id)?;
    request.transition(MergeRequestStatus::Closed)?;
    store.save(&request)?;

    println!("Closed {}", request_id.bold());
    Ok(())
}

/// Reopen a closed request.
pub fn reopen(request_id: String) -> Result<()> {
    let store = open_store()?;
    let mut request = store.load(&request_id)?;
    request.transition(MergeRequestStatus::Open)?;
    // Reopened work needs fresh review before it can merge again
    request.mergeable = false;
    store.save(&request)?;

    println!("Reopened {}", request_id.bold());
    Ok(())
}
