//! Ref resolution and branch management operations

use anyhow::{bail, Result};
use std::path::Path;

use super::runner::{run_git, run_git_bool, run_git_checked};

/// Resolve a ref name (branch, tag, or raw id) to a full commit id.
///
/// Returns `None` when the ref does not exist or does not point at a commit.
pub fn resolve_ref(name: &str, repo_root: &Path) -> Result<Option<String>> {
    let spec = format!("{name}^{{commit}}");
    let output = run_git(&["rev-parse", "--verify", "--quiet", &spec], repo_root)?;

    if !output.status.success() {
        return Ok(None);
    }

    Ok(Some(
        String::from_utf8_lossy(&output.stdout).trim().to_string(),
    ))
}

/// Check if a local branch exists
pub fn branch_exists(name: &str, repo_root: &Path) -> Result<bool> {
    let output = run_git(
        &["rev-parse", "--verify", &format!("refs/heads/{name}")],
        repo_root,
    )?;
    Ok(output.status.success())
}

/// Delete a branch.
///
/// Returns true if the branch was deleted. Returns false when the branch
/// does not exist, or when `force` is false and git refuses because the
/// branch is not fully merged - both are skips for the caller, not errors.
pub fn delete_branch(name: &str, force: bool, repo_root: &Path) -> Result<bool> {
    let flag = if force { "-D" } else { "-d" };
    let output = run_git(&["branch", flag, name], repo_root)?;

    if output.status.success() {
        return Ok(true);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.contains("not fully merged") || stderr.contains("not found") {
        return Ok(false);
    }

    bail!("git branch delete failed: {stderr}");
}

/// Atomically move a ref from `old` to `new`.
///
/// `git update-ref <ref> <new> <old>` compare-and-swaps against the old
/// value: if the ref moved in the meantime the update fails and the ref is
/// left untouched.
pub fn update_ref(refname: &str, new: &str, old: &str, repo_root: &Path) -> Result<()> {
    let output = run_git(&["update-ref", refname, new, old], repo_root)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git update-ref failed: {}", stderr.trim());
    }

    Ok(())
}

/// Get the default branch (main or master)
pub fn default_branch(repo_root: &Path) -> Result<String> {
    // Try to get from remote origin
    let output = run_git(&["symbolic-ref", "refs/remotes/origin/HEAD"], repo_root);

    if let Ok(out) = output {
        if out.status.success() {
            let result = String::from_utf8_lossy(&out.stdout);
            // refs/remotes/origin/main -> main
            if let Some(branch) = result.trim().strip_prefix("refs/remotes/origin/") {
                return Ok(branch.to_string());
            }
        }
    }

    // Fall back to whichever of main/master exists locally
    for candidate in ["main", "master"] {
        if run_git_bool(
            &["rev-parse", "--verify", &format!("refs/heads/{candidate}")],
            repo_root,
        ) {
            return Ok(candidate.to_string());
        }
    }

    // Last resort: current HEAD
    run_git_checked(&["rev-parse", "--abbrev-ref", "HEAD"], repo_root)
}
