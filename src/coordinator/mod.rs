//! Merge coordination - the single entry point for merging a request
//!
//! `MergeCoordinator::execute` validates preconditions, snapshots the source
//! tip, claims the request's in-progress marker, runs the merge executor,
//! records the outcome, and hands off to the post-merge dispatcher. Every
//! fault on the way is normalized into a `MergeOutcome` variant; nothing
//! escapes as an error, and the in-progress marker is cleared on every exit
//! path via the guard's drop discipline.

pub mod dispatch;
pub mod guard;
pub mod identity;
pub mod notify;

use crate::config::CoordinatorConfig;
use crate::git::{MergeFault, VcsBackend};
use crate::models::attempt::MergeAttempt;
use crate::models::outcome::MergeOutcome;
use crate::models::request::MergeRequest;
use crate::store::RequestStore;

use dispatch::PostMergeDispatcher;
use guard::InProgressGuard;
use identity::IdentityResolver;
use notify::{MergeEvent, Notifier};

/// Caller-supplied parameters for one merge attempt.
#[derive(Debug, Clone)]
pub struct MergeParams {
    /// Who is performing the merge; resolved to the commit signature.
    pub acting_user: String,
    /// Commit message override. Defaults to the request's own message.
    pub message: Option<String>,
    /// Override for post-merge source-branch deletion. `None` falls back to
    /// the request flag, then the config default.
    pub delete_source_branch: Option<bool>,
}

impl MergeParams {
    pub fn new(acting_user: impl Into<String>) -> Self {
        Self {
            acting_user: acting_user.into(),
            message: None,
            delete_source_branch: None,
        }
    }
}

pub struct MergeCoordinator<'a> {
    store: &'a dyn RequestStore,
    backend: &'a dyn VcsBackend,
    identity: &'a dyn IdentityResolver,
    notifier: &'a dyn Notifier,
    config: &'a CoordinatorConfig,
}

impl<'a> MergeCoordinator<'a> {
    pub fn new(
        store: &'a dyn RequestStore,
        backend: &'a dyn VcsBackend,
        identity: &'a dyn IdentityResolver,
        notifier: &'a dyn Notifier,
        config: &'a CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            backend,
            identity,
            notifier,
            config,
        }
    }

    /// Execute one merge attempt against a request.
    ///
    /// State machine: not mergeable → `Aborted`; source unresolvable →
    /// `Aborted`; marker held elsewhere → `AlreadyInProgress`; otherwise the
    /// executor runs and the attempt ends `Merged` or `Failed`. Mergeability
    /// is checked again on a fresh load once the marker is held, so an
    /// attempt that raced a completed merge aborts instead of merging twice.
    /// There is no internal retry on any path - retry is an external
    /// re-invocation.
    pub fn execute(&self, request_id: &str, params: &MergeParams) -> MergeOutcome {
        let mut request = match self.store.load(request_id) {
            Ok(request) => request,
            Err(e) => {
                return MergeOutcome::Failed {
                    reason: format!("Failed to load merge request: {e:#}"),
                    retryable: true,
                }
            }
        };

        if !request.is_mergeable() {
            return self.abort(&request, "Merge request is not mergeable");
        }

        // Snapshot the source tip once; the whole attempt merges this commit
        // even if the source branch advances concurrently.
        let source_commit = match self.backend.resolve_ref(&request.source_branch) {
            Ok(Some(commit)) => commit,
            Ok(None) => return self.abort(&request, "No source for merge"),
            Err(e) => return self.fail(&request, format!("Something went wrong during merge: {e:#}"), true),
        };

        let guard = match InProgressGuard::acquire(self.store, &request.id) {
            Ok(Some(guard)) => guard,
            Ok(None) => {
                tracing::debug!(
                    request = %request.to_reference(),
                    "concurrent merge attempt detected, backing off"
                );
                return MergeOutcome::AlreadyInProgress;
            }
            Err(e) => {
                return self.fail(
                    &request,
                    format!("Something went wrong during merge: {e:#}"),
                    true,
                )
            }
        };

        // The precondition held on a pre-claim view of the request. Another
        // attempt may have completed between that load and our claim, so
        // re-validate on a fresh load now that the marker is ours.
        request = match self.store.load(request_id) {
            Ok(request) => request,
            Err(e) => {
                return self.fail(
                    &request,
                    format!("Something went wrong during merge: {e:#}"),
                    true,
                )
            }
        };
        if !request.is_mergeable() {
            return self.abort(&request, "Merge request is not mergeable");
        }

        let signature = match self.identity.signature_for(&params.acting_user) {
            Ok(signature) => signature,
            Err(e) => {
                return self.fail(
                    &request,
                    format!("Something went wrong during merge: {e:#}"),
                    false,
                )
            }
        };

        let message = params
            .message
            .clone()
            .unwrap_or_else(|| request.merge_commit_message());
        let attempt = MergeAttempt::new(source_commit, message, signature);

        tracing::debug!(
            request = %request.to_reference(),
            source_commit = %attempt.source_commit,
            target = %request.target_branch,
            "starting merge attempt"
        );

        let commit_id = match self.backend.merge_commit(
            &attempt.source_commit,
            &request.target_branch,
            &attempt.author,
            &attempt.committer,
            &attempt.message,
        ) {
            Ok(commit_id) => commit_id,
            Err(fault) => {
                let retryable = fault.retryable();
                return self.fail(&request, normalize_fault(fault), retryable);
            }
        };

        // The ref moved: the merge is durable from here on. Record keeping
        // failures get logged, not turned into a failed outcome that would
        // contradict the repository state.
        if let Err(e) = self.store.record_merged(&request.id, &commit_id) {
            tracing::error!(
                request = %request.to_reference(),
                commit = %commit_id,
                "merged but failed to record outcome: {e:#}"
            );
        }

        // Marker must be cleared before post-merge effects run
        drop(guard);

        request.merge_commit = Some(commit_id.clone());
        self.after_merge(&request, params);

        MergeOutcome::Merged { commit_id }
    }

    /// Post-merge side effects. Faults here are logged and swallowed - the
    /// merge already committed and the outcome must not change.
    fn after_merge(&self, request: &MergeRequest, params: &MergeParams) {
        let delete_source = params
            .delete_source_branch
            .unwrap_or(request.remove_source_branch || self.config.remove_source_branch);

        let dispatcher = PostMergeDispatcher::new(self.backend, self.notifier, self.config);
        if let Err(e) = dispatcher.on_merged(request, delete_source) {
            tracing::error!(
                request = %request.to_reference(),
                "post-merge dispatch failed: {e:#}"
            );
        }
    }

    /// Precondition failure: record the user-visible reason.
    fn abort(&self, request: &MergeRequest, reason: &str) -> MergeOutcome {
        tracing::error!(request = %request.to_reference(), "merge aborted: {reason}");

        if let Err(e) = self.store.record_error(&request.id, reason) {
            tracing::warn!(
                request = %request.to_reference(),
                "failed to record abort reason: {e:#}"
            );
        }

        MergeOutcome::Aborted {
            reason: reason.to_string(),
        }
    }

    /// Attempt failure: record the normalized reason, notify, return Failed.
    fn fail(&self, request: &MergeRequest, reason: String, retryable: bool) -> MergeOutcome {
        tracing::error!(request = %request.to_reference(), "merge failed: {reason}");

        if let Err(e) = self.store.record_error(&request.id, &reason) {
            tracing::warn!(
                request = %request.to_reference(),
                "failed to record merge error: {e:#}"
            );
        }

        if let Err(e) = self.notifier.notify(MergeEvent::MergeFailed, request) {
            tracing::warn!(
                request = %request.to_reference(),
                "failure notification failed: {e:#}"
            );
        }

        MergeOutcome::Failed { reason, retryable }
    }
}

/// Collapse an executor fault into the single user-visible reason string.
fn normalize_fault(fault: MergeFault) -> String {
    if let MergeFault::Conflict { files } = &fault {
        tracing::debug!(files = ?files, "merge conflict details");
    }
    fault.to_string()
}
