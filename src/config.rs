//! Repository-local coordinator configuration
//!
//! Loaded from `.mergectl/config.yml` at the repository root. Every field has
//! a default, so a missing file means default behavior.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::models::attempt::Signature;

pub const CONFIG_DIR: &str = ".mergectl";
pub const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Where request records live, relative to the repository root.
    pub requests_dir: PathBuf,
    /// Branches that must never be deleted by post-merge cleanup.
    pub protected_branches: Vec<String>,
    /// Default for deleting the source branch after a successful merge.
    /// A request-level flag or a per-merge override takes precedence.
    pub remove_source_branch: bool,
    /// Send desktop notifications for merge events.
    pub notify: bool,
    /// Acting-user name to version-control identity mapping.
    pub users: HashMap<String, Signature>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            requests_dir: PathBuf::from(CONFIG_DIR).join("requests"),
            protected_branches: Vec::new(),
            remove_source_branch: false,
            notify: false,
            users: HashMap::new(),
        }
    }
}

impl CoordinatorConfig {
    /// Load the config from `.mergectl/config.yml`, falling back to defaults
    /// when the file is missing.
    pub fn load(repo_root: &Path) -> Result<Self> {
        let path = repo_root.join(CONFIG_DIR).join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Malformed config: {}", path.display()))
    }

    /// Absolute path of the requests directory.
    pub fn requests_path(&self, repo_root: &Path) -> PathBuf {
        if self.requests_dir.is_absolute() {
            self.requests_dir.clone()
        } else {
            repo_root.join(&self.requests_dir)
        }
    }

    pub fn is_protected(&self, branch: &str) -> bool {
        self.protected_branches.iter().any(|b| b == branch)
    }
}
