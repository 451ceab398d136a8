//! End-to-end coordinator tests against real git repositories

use mergectl::config::CoordinatorConfig;
use mergectl::models::outcome::MergeOutcome;
use mergectl::models::request::MergeRequestStatus;
use mergectl::store::RequestStore;

use super::helpers::*;

#[test]
fn test_successful_merge_updates_ref_and_request() {
    let repo = init_test_repo();
    let repo_root = repo.path();
    create_branch_with_file("feature/login", "login.rs", "fn login() {}\n", repo_root);

    let feature_tip = rev_parse("feature/login", repo_root);
    let (store, request_id) = store_with_request(repo_root, "feature/login", "main");

    let outcome = execute_merge(repo_root, &store, &request_id, &alice_params());

    let commit_id = match outcome {
        MergeOutcome::Merged { commit_id } => commit_id,
        other => panic!("expected Merged, got {other:?}"),
    };

    // Round-trip consistency: the target tip, the recorded commit, and the
    // executor's return value all agree
    assert_eq!(rev_parse("main", repo_root), commit_id);
    let stored = store.load(&request_id).unwrap();
    assert_eq!(stored.merge_commit.as_deref(), Some(commit_id.as_str()));
    assert_eq!(stored.status, MergeRequestStatus::Merged);
    assert!(stored.merged_at.is_some());
    assert!(stored.in_progress_token.is_none());
    assert!(stored.merge_error.is_none());

    // Proper two-parent merge commit, second parent = snapshotted source tip
    assert_eq!(rev_parse(&format!("{commit_id}^2"), repo_root), feature_tip);

    // Attributed to the acting user, not the repo identity
    assert_eq!(log_format("%an", "main", repo_root), "Alice");
    assert_eq!(log_format("%ae", "main", repo_root), "alice@example.com");
}

#[test]
fn test_default_message_references_request() {
    let repo = init_test_repo();
    let repo_root = repo.path();
    create_branch_with_file("feature/x", "x.txt", "x\n", repo_root);

    let (store, request_id) = store_with_request(repo_root, "feature/x", "main");
    let outcome = execute_merge(repo_root, &store, &request_id, &alice_params());
    assert!(outcome.is_success());

    let message = log_format("%B", "main", repo_root);
    assert!(message.contains("Merge branch 'feature/x' into 'main'"));
    assert!(message.contains(&format!("!{request_id}")));
}

#[test]
fn test_caller_message_overrides_default() {
    let repo = init_test_repo();
    let repo_root = repo.path();
    create_branch_with_file("feature/x", "x.txt", "x\n", repo_root);

    let (store, request_id) = store_with_request(repo_root, "feature/x", "main");
    let mut params = alice_params();
    params.message = Some("Land the x feature".to_string());

    let outcome = execute_merge(repo_root, &store, &request_id, &params);
    assert!(outcome.is_success());
    assert_eq!(log_format("%s", "main", repo_root), "Land the x feature");
}

#[test]
fn test_not_mergeable_aborts_and_leaves_target_unchanged() {
    let repo = init_test_repo();
    let repo_root = repo.path();
    create_branch_with_file("feature/x", "x.txt", "x\n", repo_root);

    let main_before = rev_parse("main", repo_root);
    let (store, request_id) = store_with_request(repo_root, "feature/x", "main");

    // Withdraw approval
    let mut request = store.load(&request_id).unwrap();
    request.mergeable = false;
    store.save(&request).unwrap();

    let outcome = execute_merge(repo_root, &store, &request_id, &alice_params());

    assert_eq!(
        outcome,
        MergeOutcome::Aborted {
            reason: "Merge request is not mergeable".to_string()
        }
    );
    assert_eq!(rev_parse("main", repo_root), main_before);

    let stored = store.load(&request_id).unwrap();
    assert_eq!(
        stored.merge_error.as_deref(),
        Some("Merge request is not mergeable")
    );
    assert!(stored.merge_commit.is_none());
    assert!(stored.in_progress_token.is_none());
}

#[test]
fn test_missing_source_branch_aborts() {
    let repo = init_test_repo();
    let repo_root = repo.path();

    let (store, request_id) = store_with_request(repo_root, "feature/deleted", "main");
    let outcome = execute_merge(repo_root, &store, &request_id, &alice_params());

    assert_eq!(
        outcome,
        MergeOutcome::Aborted {
            reason: "No source for merge".to_string()
        }
    );
    assert_eq!(
        store.load(&request_id).unwrap().merge_error.as_deref(),
        Some("No source for merge")
    );
}

#[test]
fn test_conflicting_branches_fail_with_recorded_reason() {
    let repo = init_test_repo();
    let repo_root = repo.path();

    // Both sides edit the same file
    create_branch_with_file("feature/x", "shared.txt", "feature version\n", repo_root);
    commit_file("shared.txt", "main version\n", repo_root);

    let main_before = rev_parse("main", repo_root);
    let (store, request_id) = store_with_request(repo_root, "feature/x", "main");

    let outcome = execute_merge(repo_root, &store, &request_id, &alice_params());

    assert_eq!(
        outcome,
        MergeOutcome::Failed {
            reason: "Conflicts detected during merge".to_string(),
            retryable: false,
        }
    );

    // No durable effect, request left open and retryable by hand
    assert_eq!(rev_parse("main", repo_root), main_before);
    let stored = store.load(&request_id).unwrap();
    assert_eq!(stored.status, MergeRequestStatus::Open);
    assert_eq!(
        stored.merge_error.as_deref(),
        Some("Conflicts detected during merge")
    );
    assert!(stored.merge_commit.is_none());
    assert!(stored.in_progress_token.is_none());
}

#[cfg(unix)]
#[test]
fn test_pre_receive_hook_rejection_fails_and_leaves_target() {
    use std::os::unix::fs::PermissionsExt;

    let repo = init_test_repo();
    let repo_root = repo.path();
    create_branch_with_file("feature/x", "x.txt", "x\n", repo_root);

    let hook_path = repo_root.join(".git/hooks/pre-receive");
    std::fs::write(&hook_path, "#!/bin/sh\necho 'policy violation' >&2\nexit 1\n").unwrap();
    std::fs::set_permissions(&hook_path, std::fs::Permissions::from_mode(0o755)).unwrap();

    let main_before = rev_parse("main", repo_root);
    let (store, request_id) = store_with_request(repo_root, "feature/x", "main");

    let outcome = execute_merge(repo_root, &store, &request_id, &alice_params());

    match outcome {
        MergeOutcome::Failed { reason, retryable } => {
            assert!(reason.contains("policy violation"), "reason: {reason}");
            assert!(!retryable);
        }
        other => panic!("expected Failed, got {other:?}"),
    }

    assert_eq!(rev_parse("main", repo_root), main_before);
    let stored = store.load(&request_id).unwrap();
    assert!(stored.merge_error.as_deref().unwrap().contains("policy violation"));
    assert!(stored.in_progress_token.is_none());
}

#[cfg(unix)]
#[test]
fn test_target_moved_during_merge_fails_without_ref_update() {
    use std::os::unix::fs::PermissionsExt;

    let repo = init_test_repo();
    let repo_root = repo.path();
    create_branch_with_file("feature/x", "x.txt", "x\n", repo_root);
    create_branch_with_file("hotfix", "h.txt", "h\n", repo_root);
    let hotfix_tip = rev_parse("hotfix", repo_root);

    // The hook advances the target between the merge snapshot and the ref
    // update, so the compare-and-swap sees a moved tip and must write nothing
    let hook_path = repo_root.join(".git/hooks/pre-receive");
    std::fs::write(
        &hook_path,
        format!("#!/bin/sh\ngit update-ref refs/heads/main {hotfix_tip}\nexit 0\n"),
    )
    .unwrap();
    std::fs::set_permissions(&hook_path, std::fs::Permissions::from_mode(0o755)).unwrap();

    let (store, request_id) = store_with_request(repo_root, "feature/x", "main");
    let outcome = execute_merge(repo_root, &store, &request_id, &alice_params());

    match outcome {
        MergeOutcome::Failed { reason, retryable } => {
            assert!(reason.contains("moved during merge"), "reason: {reason}");
            assert!(retryable);
        }
        other => panic!("expected Failed, got {other:?}"),
    }

    // The target sits exactly where the concurrent update left it
    assert_eq!(rev_parse("main", repo_root), hotfix_tip);
    let stored = store.load(&request_id).unwrap();
    assert_eq!(stored.status, MergeRequestStatus::Open);
    assert!(stored
        .merge_error
        .as_deref()
        .unwrap()
        .contains("moved during merge"));
    assert!(stored.merge_commit.is_none());
    assert!(stored.in_progress_token.is_none());
}

#[test]
fn test_source_branch_deleted_when_requested() {
    let repo = init_test_repo();
    let repo_root = repo.path();
    create_branch_with_file("feature/x", "x.txt", "x\n", repo_root);

    let (store, request_id) = store_with_request(repo_root, "feature/x", "main");
    let mut params = alice_params();
    params.delete_source_branch = Some(true);

    let outcome = execute_merge(repo_root, &store, &request_id, &params);
    assert!(outcome.is_success());

    let backend = mergectl::git::GitBackend::new(repo_root.to_path_buf());
    use mergectl::git::VcsBackend;
    assert!(!backend.branch_exists("feature/x").unwrap());
}

#[test]
fn test_protected_source_branch_survives_merge() {
    let repo = init_test_repo();
    let repo_root = repo.path();
    create_branch_with_file("release/1.0", "r.txt", "r\n", repo_root);

    let (store, request_id) = store_with_request(repo_root, "release/1.0", "main");
    let mut config = CoordinatorConfig::default();
    config.protected_branches.push("release/1.0".to_string());

    let mut params = alice_params();
    params.delete_source_branch = Some(true);

    let outcome = execute_merge_with_config(repo_root, &store, &request_id, &params, &config);
    assert!(outcome.is_success());

    let backend = mergectl::git::GitBackend::new(repo_root.to_path_buf());
    use mergectl::git::VcsBackend;
    assert!(backend.branch_exists("release/1.0").unwrap());
}

#[test]
fn test_merged_request_cannot_merge_again() {
    let repo = init_test_repo();
    let repo_root = repo.path();
    create_branch_with_file("feature/x", "x.txt", "x\n", repo_root);

    let (store, request_id) = store_with_request(repo_root, "feature/x", "main");
    assert!(execute_merge(repo_root, &store, &request_id, &alice_params()).is_success());

    let main_after_merge = rev_parse("main", repo_root);
    let outcome = execute_merge(repo_root, &store, &request_id, &alice_params());

    assert_eq!(
        outcome,
        MergeOutcome::Aborted {
            reason: "Merge request is not mergeable".to_string()
        }
    );
    assert_eq!(rev_parse("main", repo_root), main_after_merge);
}
