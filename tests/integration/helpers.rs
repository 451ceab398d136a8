//! Shared test helpers for merge coordination integration tests

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use mergectl::config::CoordinatorConfig;
use mergectl::coordinator::identity::ConfigIdentityResolver;
use mergectl::coordinator::notify::LogNotifier;
use mergectl::coordinator::{MergeCoordinator, MergeParams};
use mergectl::git::GitBackend;
use mergectl::models::outcome::MergeOutcome;
use mergectl::models::request::MergeRequest;
use mergectl::store::FileStore;

/// Test helper: Create a temporary git repository with initial commit
pub fn init_test_repo() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let repo_root = temp_dir.path();

    Command::new("git")
        .args(["init"])
        .current_dir(repo_root)
        .output()
        .expect("Failed to init git repo");

    Command::new("git")
        .args(["config", "user.email", "test@test.com"])
        .current_dir(repo_root)
        .output()
        .expect("Failed to set git user.email");

    Command::new("git")
        .args(["config", "user.name", "Test User"])
        .current_dir(repo_root)
        .output()
        .expect("Failed to set git user.name");

    fs::write(repo_root.join("README.md"), "# Test Repository\n")
        .expect("Failed to write README.md");

    Command::new("git")
        .args(["add", "."])
        .current_dir(repo_root)
        .output()
        .expect("Failed to git add");

    Command::new("git")
        .args(["commit", "-m", "Initial commit"])
        .current_dir(repo_root)
        .output()
        .expect("Failed to git commit");

    Command::new("git")
        .args(["branch", "-M", "main"])
        .current_dir(repo_root)
        .output()
        .expect("Failed to rename branch to main");

    temp_dir
}

/// Test helper: Create a branch with a commit adding a file, then return
/// to main so the branch is free for deletion checks
pub fn create_branch_with_file(name: &str, filename: &str, content: &str, repo_root: &Path) {
    Command::new("git")
        .args(["checkout", "-b", name])
        .current_dir(repo_root)
        .output()
        .expect("Failed to checkout new branch");

    commit_file(filename, content, repo_root);

    Command::new("git")
        .args(["checkout", "main"])
        .current_dir(repo_root)
        .output()
        .expect("Failed to checkout main");
}

/// Test helper: Commit a file on the currently checked-out branch
pub fn commit_file(filename: &str, content: &str, repo_root: &Path) {
    fs::write(repo_root.join(filename), content).expect("Failed to write file");

    Command::new("git")
        .args(["add", filename])
        .current_dir(repo_root)
        .output()
        .expect("Failed to git add");

    Command::new("git")
        .args(["commit", "-m", &format!("Add {filename}")])
        .current_dir(repo_root)
        .output()
        .expect("Failed to git commit");
}

/// Test helper: Resolve a ref to its commit id
pub fn rev_parse(spec: &str, repo_root: &Path) -> String {
    let output = Command::new("git")
        .args(["rev-parse", spec])
        .current_dir(repo_root)
        .output()
        .expect("Failed to run git rev-parse");
    assert!(output.status.success(), "rev-parse {spec} failed");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Test helper: Latest commit field on a ref via git log formatting
pub fn log_format(format: &str, spec: &str, repo_root: &Path) -> String {
    let output = Command::new("git")
        .args(["log", "-1", &format!("--format={format}"), spec])
        .current_dir(repo_root)
        .output()
        .expect("Failed to run git log");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Test helper: Store plus a saved, approved merge request
pub fn store_with_request(repo_root: &Path, source: &str, target: &str) -> (FileStore, String) {
    let config = CoordinatorConfig::default();
    let store = FileStore::new(config.requests_path(repo_root));

    let mut request =
        MergeRequest::new(source.to_string(), target.to_string(), "alice".to_string());
    request.mergeable = true;
    store.save(&request).expect("Failed to save request");

    let id = request.id;
    (store, id)
}

/// Test helper: Run the coordinator with default config
pub fn execute_merge(
    repo_root: &Path,
    store: &FileStore,
    request_id: &str,
    params: &MergeParams,
) -> MergeOutcome {
    execute_merge_with_config(
        repo_root,
        store,
        request_id,
        params,
        &CoordinatorConfig::default(),
    )
}

/// Test helper: Run the coordinator with a custom config
pub fn execute_merge_with_config(
    repo_root: &Path,
    store: &FileStore,
    request_id: &str,
    params: &MergeParams,
    config: &CoordinatorConfig,
) -> MergeOutcome {
    let backend = GitBackend::new(repo_root.to_path_buf());
    let resolver = ConfigIdentityResolver::default();
    let notifier = LogNotifier;

    MergeCoordinator::new(store, &backend, &resolver, &notifier, config)
        .execute(request_id, params)
}

/// Test helper: Default attempt parameters
pub fn alice_params() -> MergeParams {
    MergeParams::new("Alice <alice@example.com>")
}
