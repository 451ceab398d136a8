//! Git operations for merge coordination
//!
//! This module provides:
//! - A subprocess runner for git commands with consistent error handling
//! - Ref resolution and branch management helpers
//! - The merge executor: three-way merge via plumbing with an atomic
//!   compare-and-swap ref update
//!
//! The coordinator talks to the backend through the `VcsBackend` trait so
//! tests can substitute a fake; `GitBackend` is the real implementation.

pub mod backend;
pub mod merge;
pub mod refs;
pub mod runner;

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

use crate::models::attempt::Signature;

pub use backend::GitBackend;

/// Fault raised by the merge executor.
///
/// The coordinator normalizes these into a single user-visible reason string;
/// the variants exist so conflict and hook rejections can be reported
/// distinctly from generic backend faults.
#[derive(Debug, Error)]
pub enum MergeFault {
    /// The three-way merge produced unresolvable conflicts.
    #[error("Conflicts detected during merge")]
    Conflict { files: Vec<String> },

    /// The repository's pre-receive hook rejected the ref update.
    #[error("{message}")]
    HookRejected { message: String },

    /// Any other fault from the version-control backend.
    #[error("Something went wrong during merge: {message}")]
    Backend { message: String },
}

impl MergeFault {
    pub fn backend(message: impl Into<String>) -> Self {
        MergeFault::Backend {
            message: message.into(),
        }
    }

    /// Whether re-running the attempt without user intervention could help.
    /// Conflicts and hook rejections need the user to change something first.
    pub fn retryable(&self) -> bool {
        matches!(self, MergeFault::Backend { .. })
    }
}

/// Interface to the version-control backend the coordinator consumes.
pub trait VcsBackend {
    /// Resolve a ref name to a commit id, or `None` if it does not exist.
    fn resolve_ref(&self, name: &str) -> Result<Option<String>>;

    /// Merge `source_commit` into the current tip of `target_branch`,
    /// producing a new merge commit the target branch then points at.
    /// The ref update is atomic: readers observe either the old tip or the
    /// new commit, never a partial state.
    fn merge_commit(
        &self,
        source_commit: &str,
        target_branch: &str,
        author: &Signature,
        committer: &Signature,
        message: &str,
    ) -> std::result::Result<String, MergeFault>;

    fn branch_exists(&self, name: &str) -> Result<bool>;

    /// Delete a branch. Returns false (a skip, not an error) when the branch
    /// is missing or, without `force`, not fully merged.
    fn delete_branch(&self, name: &str, force: bool) -> Result<bool>;

    /// The repository's default branch (main/master).
    fn default_branch(&self) -> Result<String>;
}

/// Resolve the repository root from the current working directory.
pub fn repo_root() -> Result<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
        bail!("Not inside a git repository");
    }

    Ok(PathBuf::from(
        String::from_utf8_lossy(&output.stdout).trim(),
    ))
}
