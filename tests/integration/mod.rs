//! Integration tests for merge coordination
//!
//! These tests verify end-to-end coordinator behavior against real git
//! repositories: precondition handling, the merge executor, in-progress
//! locking, and post-merge cleanup.

pub mod helpers;
pub mod merge_flow;
