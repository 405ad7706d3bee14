//! GitHub repository service implementation

use crate::error::{Error, Result};
use crate::platform::{RepositoryPage, RepositoryService};
use crate::types::{MergeOutcome, Permission, Reference, RemoteError, RemoteErrorKind, Repository};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Repositories requested per directory page (GitHub's maximum)
const PAGE_SIZE: u32 = 100;

const USER_AGENT: &str = "org-automerge";

const LIST_REPOSITORIES_QUERY: &str = r"
    query ListRepositories($org: String!, $qualifiedName: String!, $first: Int!, $after: String) {
        organization(login: $org) {
            repositories(first: $first, after: $after) {
                pageInfo {
                    hasNextPage
                    endCursor
                }
                nodes {
                    id
                    name
                    viewerPermission
                    ref(qualifiedName: $qualifiedName) {
                        id
                        name
                        target {
                            oid
                            ... on Commit {
                                message
                            }
                        }
                    }
                }
            }
        }
    }
";

const MERGE_BRANCH_MUTATION: &str = r"
    mutation MergeBranch($input: MergeBranchInput!) {
        mergeBranch(input: $input) {
            mergeCommit {
                oid
                commitUrl
                message
            }
        }
    }
";

// GraphQL response types

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    message: String,
}

impl From<GraphQlError> for RemoteError {
    fn from(e: GraphQlError) -> Self {
        Self::new(e.kind.unwrap_or_default(), e.message)
    }
}

#[derive(Deserialize)]
struct ListRepositoriesData {
    organization: Option<OrganizationNode>,
}

#[derive(Deserialize)]
struct OrganizationNode {
    repositories: RepositoryConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryConnection {
    page_info: PageInfo,
    nodes: Vec<Option<RepositoryNode>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    id: String,
    name: String,
    viewer_permission: Option<String>,
    #[serde(rename = "ref")]
    reference: Option<RefNode>,
}

#[derive(Deserialize)]
struct RefNode {
    id: String,
    name: String,
    target: Option<TargetNode>,
}

#[derive(Deserialize)]
struct TargetNode {
    oid: String,
    #[serde(default)]
    message: String,
}

impl From<RepositoryNode> for Repository {
    fn from(node: RepositoryNode) -> Self {
        let reference = node.reference.map(|r| {
            let (oid, message) = r
                .target
                .map(|t| (t.oid, t.message))
                .unwrap_or_default();
            Reference {
                id: r.id,
                name: r.name,
                oid,
                message,
            }
        });

        Self {
            id: node.id,
            name: node.name,
            permission: node
                .viewer_permission
                .map_or_else(|| Permission::Unknown("NONE".to_string()), Permission::from),
            reference,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MergeBranchData {
    merge_branch: Option<MergeBranchPayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MergeBranchPayload {
    merge_commit: Option<MergeCommitNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MergeCommitNode {
    oid: String,
    commit_url: String,
    message: String,
}

/// Split a GraphQL response into its data or the first reported error
fn into_data<T>(response: GraphQlResponse<T>) -> Result<T> {
    if let Some(errors) = response.errors
        && let Some(first) = errors.into_iter().next()
    {
        return Err(Error::Remote(first.into()));
    }

    response
        .data
        .ok_or_else(|| Error::GitHubApi("No data in GraphQL response".to_string()))
}

/// Map a `mergeBranch` payload to the merge it produced
///
/// A payload without a merge commit means GitHub had nothing to merge; it
/// is reported like GitHub's own "Already merged" refusal.
fn merge_outcome(data: MergeBranchData) -> std::result::Result<MergeOutcome, RemoteError> {
    let commit = data
        .merge_branch
        .and_then(|payload| payload.merge_commit)
        .ok_or_else(|| {
            RemoteError::new(
                RemoteErrorKind::Unprocessable,
                "Failed to merge: \"Already merged\"",
            )
        })?;

    Ok(MergeOutcome {
        commit_hash: commit.oid,
        commit_url: commit.commit_url,
        commit_message: commit.message,
    })
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    organization: String,
    /// Token for raw HTTP requests (rate limit checks)
    token: String,
    /// HTTP client for raw requests (rate limit checks)
    http_client: Client,
    /// REST API host for raw requests
    api_host: String,
}

impl GitHubService {
    /// Create a new GitHub service for an organization
    ///
    /// `host` selects a GitHub Enterprise server; `None` means github.com.
    pub fn new(token: &str, organization: String, host: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        let api_host = if let Some(h) = host {
            // GraphQL lives at /api/graphql on Enterprise, REST at /api/v3
            builder = builder
                .base_uri(format!("https://{h}/api"))
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
            format!("{h}/api/v3")
        } else {
            "api.github.com".to_string()
        };

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            organization,
            token: token.to_string(),
            http_client,
            api_host,
        })
    }
}

#[async_trait]
impl RepositoryService for GitHubService {
    fn organization(&self) -> &str {
        &self.organization
    }

    async fn fetch_repository_page(
        &self,
        branch: &str,
        cursor: Option<&str>,
    ) -> Result<RepositoryPage> {
        debug!(branch, cursor, "fetching repository page");

        let response: GraphQlResponse<ListRepositoriesData> = self
            .client
            .graphql(&serde_json::json!({
                "query": LIST_REPOSITORIES_QUERY,
                "variables": {
                    "org": self.organization,
                    "qualifiedName": format!("refs/heads/{branch}"),
                    "first": PAGE_SIZE,
                    "after": cursor,
                }
            }))
            .await
            .map_err(|e| Error::GitHubApi(format!("Repository query failed: {e}")))?;

        let organization = into_data(response)?.organization.ok_or_else(|| {
            Error::Platform(format!("Organization not found: {}", self.organization))
        })?;

        let connection = organization.repositories;
        let repositories: Vec<Repository> = connection
            .nodes
            .into_iter()
            .flatten()
            .map(Repository::from)
            .collect();

        let next_cursor = if connection.page_info.has_next_page {
            connection.page_info.end_cursor
        } else {
            None
        };

        debug!(
            branch,
            count = repositories.len(),
            has_next = next_cursor.is_some(),
            "fetched repository page"
        );
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
        debug!(repository = %repository.name, base, head, "merging branch");

        let response: GraphQlResponse<MergeBranchData> = self
            .client
            .graphql(&serde_json::json!({
                "query": MERGE_BRANCH_MUTATION,
                "variables": {
                    "input": {
                        "repositoryId": repository.id,
                        "base": base,
                        "head": head,
                        "commitMessage": commit_message,
                    }
                }
            }))
            .await
            .map_err(|e| Error::GitHubApi(format!("GraphQL mutation failed: {e}")))?;

        let outcome = merge_outcome(into_data(response)?)?;

        debug!(repository = %repository.name, sha = %outcome.commit_hash, "merge complete");
        Ok(outcome)
    }

    async fn rate_limit_remaining(&self) -> Result<Option<u32>> {
        #[derive(Deserialize)]
        struct RateLimitResponse {
            resources: Resources,
        }

        #[derive(Deserialize)]
        struct Resources {
            graphql: Option<Rate>,
        }

        #[derive(Deserialize)]
        struct Rate {
            remaining: u32,
        }

        let url = format!("https://{}/rate_limit", self.api_host);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to fetch rate limit: {e}")))?;

        if !response.status().is_success() {
            debug!(
                status = %response.status(),
                "Rate limit check returned non-success, treating budget as unknown"
            );
            return Ok(None);
        }

        let limits: RateLimitResponse = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse rate limit: {e}")))?;

        let remaining = limits.resources.graphql.map(|rate| rate.remaining);
        debug!(?remaining, "GraphQL rate limit");
        Ok(remaining)
    }
}
