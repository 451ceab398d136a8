//! Merge executor plumbing
//!
//! Performs a three-way merge without touching any working tree:
//! `git merge-tree --write-tree` builds the merged tree (or reports
//! conflicts), `git commit-tree` wraps it in a merge commit, and
//! `git update-ref` compare-and-swaps the target branch onto it. The ref
//! update is the sole durable effect; a reader sees either the old tip or
//! the new merge commit.
//!
//! If the repository carries a `pre-receive` hook it is consulted before the
//! ref moves, mirroring server-side push validation. A rejecting hook
//! surfaces as `MergeFault::HookRejected` so the coordinator can report it
//! distinctly from conflicts and generic faults.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::refs::{resolve_ref, update_ref};
use super::runner::{run_git, run_git_checked, run_git_with_env};
use super::MergeFault;
use crate::models::attempt::Signature;

/// Merge `source_commit` into the current tip of `target_branch`.
///
/// Returns the id of the new merge commit. The target branch points at it
/// on return; on any fault the branch is left exactly where it was.
pub fn merge_commit(
    repo_root: &Path,
    source_commit: &str,
    target_branch: &str,
    author: &Signature,
    committer: &Signature,
    message: &str,
) -> Result<String, MergeFault> {
    let target_ref = format!("refs/heads/{target_branch}");

    let old_tip = resolve_ref(&target_ref, repo_root)
        .map_err(|e| MergeFault::backend(format!("{e:#}")))?
        .ok_or_else(|| {
            MergeFault::backend(format!("target branch '{target_branch}' does not exist"))
        })?;

    let tree = write_merge_tree(repo_root, &old_tip, source_commit)?;
    let new_commit = commit_tree(
        repo_root,
        &tree,
        &old_tip,
        source_commit,
        author,
        committer,
        message,
    )?;

    run_pre_receive_hook(repo_root, &old_tip, &new_commit, &target_ref)?;

    // Compare-and-swap against the tip we merged onto. If the target moved
    // while we were merging, the update fails and nothing is written.
    update_ref(&target_ref, &new_commit, &old_tip, repo_root).map_err(|e| {
        MergeFault::backend(format!(
            "target branch '{target_branch}' moved during merge: {e:#}"
        ))
    })?;

    Ok(new_commit)
}

/// Run `git merge-tree --write-tree` and return the merged tree id.
fn write_merge_tree(repo_root: &Path, target_tip: &str, source: &str) -> Result<String, MergeFault> {
    let output = run_git(
        &[
            "merge-tree",
            "--write-tree",
            "--name-only",
            target_tip,
            source,
        ],
        repo_root,
    )
    .map_err(|e| MergeFault::backend(format!("{e:#}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout);

    match output.status.code() {
        // Clean merge: first line is the tree id
        Some(0) => stdout
            .lines()
            .next()
            .map(|line| line.trim().to_string())
            .ok_or_else(|| MergeFault::backend("git merge-tree produced no output")),
        // Conflicted merge: first line is the (conflict-marked) tree id,
        // followed by the conflicted file names
        Some(1) => Err(MergeFault::Conflict {
            files: parse_conflicted_files(&stdout),
        }),
        _ => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(MergeFault::backend(format!(
                "git merge-tree failed: {}",
                stderr.trim()
            )))
        }
    }
}

/// Parse the conflicted-file section of `git merge-tree --name-only` output.
fn parse_conflicted_files(stdout: &str) -> Vec<String> {
    let mut files = Vec::new();
    for line in stdout.lines().skip(1) {
        // Informational messages follow the first blank line
        if line.is_empty() {
            break;
        }
        let file = line.trim().to_string();
        if !files.contains(&file) {
            files.push(file);
        }
    }
    files
}

/// Wrap a merged tree in a two-parent merge commit.
fn commit_tree(
    repo_root: &Path,
    tree: &str,
    target_tip: &str,
    source: &str,
    author: &Signature,
    committer: &Signature,
    message: &str,
) -> Result<String, MergeFault> {
    let envs = [
        ("GIT_AUTHOR_NAME", author.name.as_str()),
        ("GIT_AUTHOR_EMAIL", author.email.as_str()),
        ("GIT_COMMITTER_NAME", committer.name.as_str()),
        ("GIT_COMMITTER_EMAIL", committer.email.as_str()),
    ];

    let output = run_git_with_env(
        &[
            "commit-tree", tree, "-p", target_tip, "-p", source, "-m", message,
        ],
        &envs,
        repo_root,
    )
    .map_err(|e| MergeFault::backend(format!("{e:#}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MergeFault::backend(format!(
            "git commit-tree failed: {}",
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Consult the repository's pre-receive hook before moving the ref.
///
/// The hook receives `<old> <new> <refname>` on stdin, the same protocol git
/// uses server-side. A missing hook is a pass; a non-zero exit is a
/// rejection carrying the hook's own message.
fn run_pre_receive_hook(
    repo_root: &Path,
    old: &str,
    new: &str,
    refname: &str,
) -> Result<(), MergeFault> {
    let hook = match find_hook(repo_root) {
        Ok(Some(path)) => path,
        Ok(None) => return Ok(()),
        Err(e) => return Err(MergeFault::backend(format!("{e:#}"))),
    };

    let mut child = Command::new(&hook)
        .current_dir(repo_root)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            MergeFault::backend(format!("Failed to run pre-receive hook: {e}"))
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        // A closed stdin is the hook's problem; the exit code decides
        let _ = writeln!(stdin, "{old} {new} {refname}");
    }

    let output = child
        .wait_with_output()
        .map_err(|e| MergeFault::backend(format!("Failed to run pre-receive hook: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let message = if stderr.is_empty() { stdout } else { stderr };
        let message = if message.is_empty() {
            "pre-receive hook declined".to_string()
        } else {
            message
        };
        return Err(MergeFault::HookRejected { message });
    }

    Ok(())
}

fn find_hook(repo_root: &Path) -> anyhow::Result<Option<PathBuf>> {
    let git_dir = run_git_checked(&["rev-parse", "--git-dir"], repo_root)?;
    let hook = repo_root.join(git_dir).join("hooks").join("pre-receive");
    Ok(hook.exists().then_some(hook))
}
