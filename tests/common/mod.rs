//! Shared test fixtures

#![allow(dead_code)]

mod mock_platform;

pub use mock_platform::{MergeBranchCall, MockRepositoryService, PageCall};

use org_automerge::merge::MergeOptions;
use org_automerge::types::{Permission, Reference, Repository};

/// Repository carrying `branch` with the given permission
pub fn repo_on(name: &str, permission: &str, branch: &str) -> Repository {
    Repository {
        id: format!("R_{name}"),
        name: name.to_string(),
        permission: Permission::from(permission),
        reference: Some(Reference {
            id: format!("REF_{name}_{branch}"),
            name: branch.to_string(),
            oid: format!("oid_{name}_{branch}"),
            message: format!("Latest commit on {branch}"),
        }),
    }
}

/// Repository without the queried branch
pub fn repo_without_branch(name: &str, permission: &str) -> Repository {
    Repository {
        id: format!("R_{name}"),
        name: name.to_string(),
        permission: Permission::from(permission),
        reference: None,
    }
}

/// Writable repositories carrying `branch`
pub fn writable_repos(names: &[&str], branch: &str) -> Vec<Repository> {
    names.iter().map(|n| repo_on(n, "WRITE", branch)).collect()
}

/// Merge options running one attempt at a time
pub fn sequential_options() -> MergeOptions {
    MergeOptions {
        concurrency: 1,
        ..MergeOptions::default()
    }
}

/// Repository names, in order
pub fn names(repos: &[Repository]) -> Vec<&str> {
    repos.iter().map(|r| r.name.as_str()).collect()
}
