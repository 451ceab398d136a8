//! Tagged result of a coordinator merge attempt
//!
//! Every exit path of `MergeCoordinator::execute` is one of these variants;
//! no fault escapes the coordinator as an error.

/// Result of one `execute` call against a merge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The merge completed and the target branch now points at `commit_id`.
    Merged { commit_id: String },
    /// A precondition failed before any lock was taken. The reason is also
    /// recorded on the request for user visibility.
    Aborted { reason: String },
    /// Another coordinator instance holds the in-progress marker. Benign;
    /// the request was not mutated and the merge must not be re-attempted
    /// by this caller.
    AlreadyInProgress,
    /// The merge attempt ran and failed. The reason is recorded on the
    /// request; a user may re-invoke `execute` after addressing the cause.
    Failed { reason: String, retryable: bool },
}

impl MergeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, MergeOutcome::Merged { .. })
    }

    /// User-visible reason for non-success outcomes.
    pub fn reason(&self) -> Option<&str> {
        match self {
            MergeOutcome::Merged { .. } => None,
            MergeOutcome::Aborted { reason } => Some(reason),
            MergeOutcome::AlreadyInProgress => Some("Merge already in progress"),
            MergeOutcome::Failed { reason, .. } => Some(reason),
        }
    }

    /// Whether re-invoking `execute` without further user action could
    /// plausibly succeed. Never used for automatic retry; retry is always
    /// an external, user-initiated call.
    pub fn retryable(&self) -> bool {
        match self {
            MergeOutcome::Merged { .. } => false,
            MergeOutcome::Aborted { .. } => false,
            MergeOutcome::AlreadyInProgress => false,
            MergeOutcome::Failed { retryable, .. } => *retryable,
        }
    }
}
