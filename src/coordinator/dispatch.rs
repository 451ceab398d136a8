//! Post-merge effects dispatcher
//!
//! Runs after a successful merge, outside the in-progress guard: downstream
//! notification and conditional source-branch deletion. Nothing here can
//! change the merge outcome - the coordinator catches and logs any fault
//! raised by this module.

use anyhow::Result;

use super::notify::{MergeEvent, Notifier};
use crate::config::CoordinatorConfig;
use crate::git::VcsBackend;
use crate::models::request::MergeRequest;

pub struct PostMergeDispatcher<'a> {
    backend: &'a dyn VcsBackend,
    notifier: &'a dyn Notifier,
    config: &'a CoordinatorConfig,
}

impl<'a> PostMergeDispatcher<'a> {
    pub fn new(
        backend: &'a dyn VcsBackend,
        notifier: &'a dyn Notifier,
        config: &'a CoordinatorConfig,
    ) -> Self {
        Self {
            backend,
            notifier,
            config,
        }
    }

    /// Run post-merge effects for a merged request.
    ///
    /// Notification failures are logged here; only backend faults propagate,
    /// and the coordinator logs those without altering the outcome.
    pub fn on_merged(&self, request: &MergeRequest, delete_source: bool) -> Result<()> {
        if let Err(e) = self.notifier.notify(MergeEvent::Merged, request) {
            tracing::warn!(
                request = %request.to_reference(),
                "merge notification failed: {e:#}"
            );
        }

        if delete_source {
            self.delete_source_branch(request)?;
        }

        Ok(())
    }

    /// Delete the source branch if still permissible.
    ///
    /// Deletability is re-validated here rather than trusted from merge
    /// time: branch protection or the branch itself may have changed while
    /// the merge ran. Every disqualifier is a logged skip, never an error.
    fn delete_source_branch(&self, request: &MergeRequest) -> Result<()> {
        let branch = &request.source_branch;
        let reference = request.to_reference();

        if self.config.is_protected(branch) {
            tracing::info!(request = %reference, "skipping deletion of protected branch '{branch}'");
            return Ok(());
        }

        if branch == &request.target_branch {
            tracing::info!(request = %reference, "skipping deletion: source is the target branch");
            return Ok(());
        }

        let default = self.backend.default_branch()?;
        if branch == &default {
            tracing::info!(request = %reference, "skipping deletion of default branch '{branch}'");
            return Ok(());
        }

        if !self.backend.branch_exists(branch)? {
            tracing::info!(request = %reference, "source branch '{branch}' already gone");
            return Ok(());
        }

        // Non-force deletion: git refuses if the branch is not fully merged,
        // which we treat as a skip (the branch may have advanced since the
        // attempt snapshot was taken).
        if self.backend.delete_branch(branch, false)? {
            tracing::info!(request = %reference, "deleted source branch '{branch}'");
        } else {
            tracing::info!(
                request = %reference,
                "skipping deletion: source branch '{branch}' is not fully merged"
            );
        }

        Ok(())
    }
}
