//! Persistence of merge request records
//!
//! Requests are stored one-per-file as YAML under a requests directory,
//! guarded by `fs2` advisory locks so that concurrent coordinator instances
//! see a consistent record. The in-progress marker check-and-set is a single
//! read-modify-write under one exclusive lock, which is what makes the
//! coordinator's mutual exclusion work.

pub mod locking;

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::models::request::{MergeRequest, MergeRequestStatus};
use locking::{locked_read, locked_update, locked_write};

/// Persistence operations the coordinator needs.
///
/// The check-and-set contract: `try_claim_in_progress` atomically transitions
/// the in-progress marker from empty to `token` and returns whether this
/// caller won. `clear_in_progress` only clears a marker this caller owns.
pub trait RequestStore {
    fn load(&self, id: &str) -> Result<MergeRequest>;

    /// Atomically claim the in-progress marker. Returns false if another
    /// attempt already holds it.
    fn try_claim_in_progress(&self, id: &str, token: &str) -> Result<bool>;

    /// Clear the in-progress marker if it still carries `token`.
    fn clear_in_progress(&self, id: &str, token: &str) -> Result<()>;

    /// Record a successful merge: commit id, merged status, cleared error.
    fn record_merged(&self, id: &str, commit_id: &str) -> Result<()>;

    /// Record a user-visible error on the request.
    fn record_error(&self, id: &str, message: &str) -> Result<()>;
}

/// File-backed request store: one `<id>.yml` per request.
#[derive(Debug, Clone)]
pub struct FileStore {
    requests_dir: PathBuf,
}

impl FileStore {
    pub fn new(requests_dir: PathBuf) -> Self {
        Self { requests_dir }
    }

    fn request_path(&self, id: &str) -> PathBuf {
        self.requests_dir.join(format!("{id}.yml"))
    }

    /// Persist a request, creating the requests directory if needed.
    pub fn save(&self, request: &MergeRequest) -> Result<()> {
        if !self.requests_dir.exists() {
            fs::create_dir_all(&self.requests_dir)
                .context("Failed to create requests directory")?;
        }

        let yaml = serde_yaml::to_string(request)
            .context("Failed to serialize merge request to YAML")?;
        locked_write(&self.request_path(&request.id), &yaml)
    }

    /// List all persisted requests, sorted by creation time.
    pub fn list(&self) -> Result<Vec<MergeRequest>> {
        if !self.requests_dir.exists() {
            return Ok(Vec::new());
        }

        let mut requests = Vec::new();
        let entries = fs::read_dir(&self.requests_dir).with_context(|| {
            format!(
                "Failed to read requests directory: {}",
                self.requests_dir.display()
            )
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("yml") {
                continue;
            }
            let content = locked_read(&path)?;
            let request: MergeRequest = serde_yaml::from_str(&content)
                .with_context(|| format!("Malformed request record: {}", path.display()))?;
            requests.push(request);
        }

        requests.sort_by_key(|r| r.created_at);
        Ok(requests)
    }

    /// Run a locked read-modify-write against one request record.
    fn update_request<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut MergeRequest) -> Result<(T, bool)>,
    ) -> Result<T> {
        let path = self.request_path(id);
        if !path.exists() {
            bail!("Merge request not found: {id}");
        }

        locked_update(&path, |content| {
            let mut request: MergeRequest = serde_yaml::from_str(content)
                .with_context(|| format!("Malformed request record: {}", path.display()))?;
            let (value, dirty) = f(&mut request)?;
            let new_content = if dirty {
                request.touch();
                Some(
                    serde_yaml::to_string(&request)
                        .context("Failed to serialize merge request to YAML")?,
                )
            } else {
                None
            };
            Ok((value, new_content))
        })
    }
}

impl RequestStore for FileStore {
    fn load(&self, id: &str) -> Result<MergeRequest> {
        let path = self.request_path(id);
        if !path.exists() {
            bail!("Merge request not found: {id}");
        }
        let content = locked_read(&path)?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Malformed request record: {}", path.display()))
    }

    fn try_claim_in_progress(&self, id: &str, token: &str) -> Result<bool> {
        self.update_request(id, |request| {
            if request.in_progress_token.is_some() {
                return Ok((false, false));
            }
            request.in_progress_token = Some(token.to_string());
            Ok((true, true))
        })
    }

    fn clear_in_progress(&self, id: &str, token: &str) -> Result<()> {
        self.update_request(id, |request| {
            if request.in_progress_token.as_deref() == Some(token) {
                request.in_progress_token = None;
                Ok(((), true))
            } else {
                // Someone else's marker (or none) - leave it alone
                Ok(((), false))
            }
        })
    }

    fn record_merged(&self, id: &str, commit_id: &str) -> Result<()> {
        self.update_request(id, |request| {
            request.transition(MergeRequestStatus::Merged)?;
            request.merge_commit = Some(commit_id.to_string());
            request.merged_at = Some(chrono::Utc::now());
            request.merge_error = None;
            Ok(((), true))
        })
    }

    fn record_error(&self, id: &str, message: &str) -> Result<()> {
        self.update_request(id, |request| {
            request.merge_error = Some(message.to_string());
            Ok(((), true))
        })
    }
}
