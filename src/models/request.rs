use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    pub id: String,
    pub title: Option<String>,
    pub author: String,
    pub source_branch: String,
    pub target_branch: String,
    pub status: MergeRequestStatus,
    /// Domain readiness flag owned by the surrounding review layer.
    /// The coordinator never sets this; it only reads it.
    #[serde(default)]
    pub mergeable: bool,
    /// Opaque lock token. Non-null only while a merge attempt is executing.
    pub in_progress_token: Option<String>,
    /// Last user-visible merge error, cleared on a successful merge.
    pub merge_error: Option<String>,
    /// Commit produced by the merge. Set if and only if the merge succeeded.
    pub merge_commit: Option<String>,
    /// Request-level default for deleting the source branch after merging.
    #[serde(default)]
    pub remove_source_branch: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

/// Status of a merge request in its lifecycle.
///
/// State machine transitions:
/// - `Open` → `Merged` (coordinator completed a merge attempt)
/// - `Open` → `Closed` (withdrawn without merging)
/// - `Closed` → `Open` (reopened)
/// - `Merged` is a terminal state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MergeRequestStatus {
    /// Request is open and may be merged once mergeable.
    Open,
    /// Request was merged; terminal state.
    Merged,
    /// Request was closed without merging. Can be reopened.
    Closed,
}

impl std::fmt::Display for MergeRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeRequestStatus::Open => write!(f, "open"),
            MergeRequestStatus::Merged => write!(f, "merged"),
            MergeRequestStatus::Closed => write!(f, "closed"),
        }
    }
}

impl MergeRequestStatus {
    /// Check if transitioning from the current status to the new status is valid.
    pub fn can_transition_to(&self, new: MergeRequestStatus) -> bool {
        use MergeRequestStatus::*;
        matches!(
            (self, new),
            (Open, Merged) | (Open, Closed) | (Closed, Open)
        )
    }
}

impl MergeRequest {
    pub fn new(source_branch: String, target_branch: String, author: String) -> Self {
        let now = Utc::now();

        Self {
            id: Self::generate_id(),
            title: None,
            author,
            source_branch,
            target_branch,
            status: MergeRequestStatus::Open,
            mergeable: false,
            in_progress_token: None,
            merge_error: None,
            merge_commit: None,
            remove_source_branch: false,
            created_at: now,
            updated_at: now,
            merged_at: None,
        }
    }

    fn generate_id() -> String {
        let uuid_short = uuid::Uuid::new_v4()
            .to_string()
            .split('-')
            .next()
            .unwrap_or("")
            .to_string();
        format!("mr-{uuid_short}")
    }

    /// Whether the coordinator may attempt a merge right now.
    ///
    /// Requires an open request, the readiness flag set by the review layer,
    /// and no previously recorded merge commit.
    pub fn is_mergeable(&self) -> bool {
        self.status == MergeRequestStatus::Open && self.mergeable && self.merge_commit.is_none()
    }

    /// Default commit message used when the caller supplies none.
    pub fn merge_commit_message(&self) -> String {
        let mut message = format!(
            "Merge branch '{}' into '{}'",
            self.source_branch, self.target_branch
        );
        if let Some(title) = &self.title {
            message.push_str(&format!("\n\n{title}"));
        }
        message.push_str(&format!("\n\nSee merge request {}", self.to_reference()));
        message
    }

    /// Short human-readable reference, used in log output.
    pub fn to_reference(&self) -> String {
        format!("!{}", self.id)
    }

    /// Transition to a new status, validating against the state machine.
    pub fn transition(&mut self, new: MergeRequestStatus) -> Result<()> {
        if !self.status.can_transition_to(new) {
            bail!(
                "Invalid status transition for {}: {} -> {new}",
                self.to_reference(),
                self.status
            );
        }
        self.status = new;
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
