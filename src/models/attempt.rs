//! Ephemeral state for a single merge attempt
//!
//! A `MergeAttempt` is built by the coordinator after preconditions pass and
//! is never persisted. The source commit is captured once at attempt start
//! and used for the whole attempt, even if the source branch advances
//! concurrently.

use serde::{Deserialize, Serialize};

/// Author/committer identity for commits produced by a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Parse a `Name <email>` string into a signature.
    ///
    /// Returns `None` if the input does not carry both a name and an email.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let open = input.find('<')?;
        let close = input.rfind('>')?;
        if close < open {
            return None;
        }

        let name = input[..open].trim();
        let email = input[open + 1..close].trim();
        if name.is_empty() || email.is_empty() {
            return None;
        }

        Some(Self::new(name, email))
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// One execution of the coordinator against one merge request.
#[derive(Debug, Clone)]
pub struct MergeAttempt {
    /// Tip of the source branch, snapshotted at attempt start.
    pub source_commit: String,
    /// Commit message for the merge commit.
    pub message: String,
    pub author: Signature,
    pub committer: Signature,
}

impl MergeAttempt {
    /// Build an attempt. The acting user's signature is used for both the
    /// author and the committer, matching how merge commits are attributed
    /// to the person pressing merge rather than the branch author.
    pub fn new(source_commit: String, message: String, signature: Signature) -> Self {
        Self {
            source_commit,
            message,
            author: signature.clone(),
            committer: signature,
        }
    }
}
