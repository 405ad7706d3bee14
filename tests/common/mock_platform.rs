//! Mock repository service for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use async_trait::async_trait;
use org_automerge::error::{Error, Result};
use org_automerge::platform::{RepositoryPage, RepositoryService};
use org_automerge::types::{MergeOutcome, RemoteError, Repository};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Call record for `merge_branch`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeBranchCall {
    pub repository: String,
    pub base: String,
    pub head: String,
    pub commit_message: String,
}

/// Call record for `fetch_repository_page`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCall {
    pub branch: String,
    pub cursor: Option<String>,
}

/// Simple mock repository service for testing
///
/// This manually implements `RepositoryService` rather than using mockall,
/// because mockall has issues with methods returning references.
///
/// Features:
/// - Per-branch directory listings, split into pages of `page_size`
/// - Per-repository merge responses (default: success)
/// - Call tracking for verification
/// - Error injection and artificial latency
pub struct MockRepositoryService {
    organization: String,
    page_size: usize,
    listings: Mutex<HashMap<String, Vec<Repository>>>,
    merge_errors: Mutex<HashMap<String, RemoteError>>,
    merge_delays: Mutex<HashMap<String, Duration>>,
    rate_limit: Mutex<Option<u32>>,
    // Call tracking
    page_calls: Mutex<Vec<PageCall>>,
    merge_calls: Mutex<Vec<MergeBranchCall>>,
    // Error injection
    error_on_list: Mutex<Option<String>>,
    transport_error_on_merge: Mutex<Option<String>>,
    cancel_after_merges: Mutex<Option<(usize, CancellationToken)>>,
}

impl MockRepositoryService {
    /// Create a mock for an organization with unpaged listings
    pub fn new(organization: &str) -> Self {
        Self {
            organization: organization.to_string(),
            page_size: usize::MAX,
            listings: Mutex::new(HashMap::new()),
            merge_errors: Mutex::new(HashMap::new()),
            merge_delays: Mutex::new(HashMap::new()),
            rate_limit: Mutex::new(None),
            page_calls: Mutex::new(Vec::new()),
            merge_calls: Mutex::new(Vec::new()),
            error_on_list: Mutex::new(None),
            transport_error_on_merge: Mutex::new(None),
            cancel_after_merges: Mutex::new(None),
        }
    }

    /// Split listings into pages of this many repositories
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    // === Response setup ===

    /// Set the listing returned for a branch; unknown branches list nothing
    pub fn set_listing(&self, branch: &str, repositories: Vec<Repository>) {
        self.listings
            .lock()
            .unwrap()
            .insert(branch.to_string(), repositories);
    }

    /// Make `merge_branch` fail for a repository with a remote error
    pub fn fail_merge(&self, repository: &str, kind: &str, message: &str) {
        self.merge_errors
            .lock()
            .unwrap()
            .insert(repository.to_string(), RemoteError::new(kind, message));
    }

    /// Make `merge_branch` report "already merged" for a repository
    pub fn already_merged(&self, repository: &str) {
        self.fail_merge(repository, "UNPROCESSABLE", "Failed to merge: \"Already merged\"");
    }

    /// Delay `merge_branch` for a repository
    pub fn delay_merge(&self, repository: &str, delay: Duration) {
        self.merge_delays
            .lock()
            .unwrap()
            .insert(repository.to_string(), delay);
    }

    /// Report a remaining rate-limit budget
    pub fn set_rate_limit(&self, remaining: u32) {
        *self.rate_limit.lock().unwrap() = Some(remaining);
    }

    // === Error injection methods ===

    /// Make every listing fail with a transport error
    pub fn fail_list(&self, msg: &str) {
        *self.error_on_list.lock().unwrap() = Some(msg.to_string());
    }

    /// Make every merge fail with a transport error
    pub fn fail_merge_transport(&self, msg: &str) {
        *self.transport_error_on_merge.lock().unwrap() = Some(msg.to_string());
    }

    /// Cancel `token` once this many merges have been issued
    pub fn cancel_after(&self, merges: usize, token: CancellationToken) {
        *self.cancel_after_merges.lock().unwrap() = Some((merges, token));
    }

    // === Call verification methods ===

    /// Get all `fetch_repository_page` calls
    pub fn get_page_calls(&self) -> Vec<PageCall> {
        self.page_calls.lock().unwrap().clone()
    }

    /// Get all `merge_branch` calls
    pub fn get_merge_calls(&self) -> Vec<MergeBranchCall> {
        self.merge_calls.lock().unwrap().clone()
    }

    /// Get count of `merge_branch` calls
    pub fn merge_call_count(&self) -> usize {
        self.merge_calls.lock().unwrap().len()
    }

    /// Branches listed, in query order (first page only)
    pub fn listed_branches(&self) -> Vec<String> {
        self.get_page_calls()
            .into_iter()
            .filter(|c| c.cursor.is_none())
            .map(|c| c.branch)
            .collect()
    }

    /// Assert that `merge_branch` was called for a repository with head → base
    pub fn assert_merge_called(&self, repository: &str, base: &str, head: &str) {
        let calls = self.get_merge_calls();
        assert!(
            calls
                .iter()
                .any(|c| c.repository == repository && c.base == base && c.head == head),
            "Expected merge_branch({repository}, {base}, {head}) but got: {calls:?}"
        );
    }

    /// Assert that `merge_branch` was NOT called for a repository
    pub fn assert_merge_not_called(&self, repository: &str) {
        let calls = self.get_merge_calls();
        assert!(
            !calls.iter().any(|c| c.repository == repository),
            "Expected merge_branch({repository}) NOT to be called but it was: {calls:?}"
        );
    }
}

#[async_trait]
impl RepositoryService for MockRepositoryService {
    fn organization(&self) -> &str {
        &self.organization
    }

    async fn fetch_repository_page(
        &self,
        branch: &str,
        cursor: Option<&str>,
    ) -> Result<RepositoryPage> {
        self.page_calls.lock().unwrap().push(PageCall {
            branch: branch.to_string(),
            cursor: cursor.map(ToString::to_string),
        });

        // Check for injected error
        if let Some(msg) = self.error_on_list.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }

        let offset = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| Error::Platform(format!("invalid cursor: {c}")))?,
            None => 0,
        };

        let listing = self
            .listings
            .lock()
            .unwrap()
            .get(branch)
            .cloned()
            .unwrap_or_default();
        let end = offset.saturating_add(self.page_size).min(listing.len());
        let repositories = listing
            .get(offset..end)
            .map(<[Repository]>::to_vec)
            .unwrap_or_default();
        let next_cursor = (end < listing.len()).then(|| end.to_string());

        Ok(RepositoryPage {
            repositories,
            next_cursor,
        })
    }

    async fn merge_branch(
        &self,
        repository: &Repository,
        base: &str,
        head: &str,
        commit_message: &str,
    ) -> Result<MergeOutcome> {
        let issued = {
            let mut calls = self.merge_calls.lock().unwrap();
            calls.push(MergeBranchCall {
                repository: repository.name.clone(),
                base: base.to_string(),
                head: head.to_string(),
                commit_message: commit_message.to_string(),
            });
            calls.len()
        };

        if let Some((after, token)) = self.cancel_after_merges.lock().unwrap().as_ref()
            && issued >= *after
        {
            token.cancel();
        }

        let delay = self.merge_delays.lock().unwrap().get(&repository.name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        // Check for injected error
        if let Some(msg) = self.transport_error_on_merge.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }

        if let Some(err) = self.merge_errors.lock().unwrap().get(&repository.name) {
            return Err(Error::Remote(err.clone()));
        }

        Ok(MergeOutcome {
            commit_hash: format!("sha_{}_{head}_into_{base}", repository.name),
            commit_url: format!(
                "https://github.com/{}/{}/commit/sha_{}",
                self.organization, repository.name, repository.name
            ),
            commit_message: commit_message.to_string(),
        })
    }

    async fn rate_limit_remaining(&self) -> Result<Option<u32>> {
        Ok(*self.rate_limit.lock().unwrap())
    }
}
