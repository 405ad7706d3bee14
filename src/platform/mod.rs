//! Repository services
//!
//! Abstracts the remote directory (which repositories carry a branch) and
//! the remote merge operation, so the merge engine can run against GitHub
//! or an in-memory mock.

mod github;

pub use github::GitHubService;

use crate::error::Result;
use crate::types::{MergeOutcome, Repository};
use async_trait::async_trait;
use tracing::debug;

/// One batch of a paginated repository listing
#[derive(Debug, Clone, Default)]
pub struct RepositoryPage {
    /// Repositories in this batch, in listing order
    pub repositories: Vec<Repository>,
    /// Opaque cursor for the next batch (`None` on the last page)
    pub next_cursor: Option<String>,
}

/// Directory and merge operations against an organization
#[async_trait]
pub trait RepositoryService: Send + Sync {
    /// Organization this service operates on
    fn organization(&self) -> &str;

    /// Fetch one page of the organization's repositories, each annotated
    /// with the given branch's reference (or `None` when absent).
    ///
    /// `cursor` is `None` for the first page. Listing can be restarted from
    /// any cursor previously returned.
    async fn fetch_repository_page(
        &self,
        branch: &str,
        cursor: Option<&str>,
    ) -> Result<RepositoryPage>;

    /// List every repository of the organization for a branch.
    ///
    /// Follows cursors from [`fetch_repository_page`] until the last page.
    /// Implementors should override `fetch_repository_page`, not this method.
    ///
    /// [`fetch_repository_page`]: Self::fetch_repository_page
    async fn list_repositories(&self, branch: &str) -> Result<Vec<Repository>> {
        let mut repositories = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .fetch_repository_page(branch, cursor.as_deref())
                .await?;
            repositories.extend(page.repositories);

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(branch, count = repositories.len(), "listed repositories");
        Ok(repositories)
    }

    /// Merge `head` into `base` in one repository.
    ///
    /// Structured refusals from the remote side come back as
    /// [`Error::Remote`](crate::error::Error::Remote); any other error means
    /// the service itself is unusable.
    async fn merge_branch(
        &self,
        repository: &Repository,
        base: &str,
        head: &str,
        commit_message: &str,
    ) -> Result<MergeOutcome>;

    /// Remaining API request budget, if the service tracks one
    async fn rate_limit_remaining(&self) -> Result<Option<u32>> {
        Ok(None)
    }
}
