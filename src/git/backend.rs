//! Git implementation of the `VcsBackend` trait

use anyhow::Result;
use std::path::PathBuf;

use super::{merge, refs, MergeFault, VcsBackend};
use crate::models::attempt::Signature;

/// Backend driving a local git repository through subprocess plumbing.
#[derive(Debug, Clone)]
pub struct GitBackend {
    repo_root: PathBuf,
}

impl GitBackend {
    pub fn new(repo_root: PathBuf) -> Self {
        Self { repo_root }
    }

    pub fn repo_root(&self) -> &PathBuf {
        &self.repo_root
    }
}

impl VcsBackend for GitBackend {
    fn resolve_ref(&self, name: &str) -> Result<Option<String>> {
        refs::resolve_ref(name, &self.repo_root)
    }

    fn merge_commit(
        &self,
        source_commit: &str,
        target_branch: &str,
        author: &Signature,
        committer: &Signature,
        message: &str,
    ) -> std::result::Result<String, MergeFault> {
        merge::merge_commit(
            &self.repo_root,
            source_commit,
            target_branch,
            author,
            committer,
            message,
        )
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        refs::branch_exists(name, &self.repo_root)
    }

    fn delete_branch(&self, name: &str, force: bool) -> Result<bool> {
        refs::delete_branch(name, force, &self.repo_root)
    }

    fn default_branch(&self) -> Result<String> {
        refs::default_branch(&self.repo_root)
    }
}
