//! Core types for org-automerge

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the separator lines in phase reports
const REPORT_RULE_WIDTH: usize = 30;

/// Caller's permission level on a repository
///
/// Mirrors GitHub's `viewerPermission` values. Anything GitHub adds later
/// lands in `Unknown` rather than failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Permission {
    /// Full administrative access
    Admin,
    /// Manage the repository without admin-only actions
    Maintain,
    /// Push access
    Write,
    /// Manage issues and pull requests, no push
    Triage,
    /// Read-only access
    Read,
    /// Unrecognized level, kept verbatim
    Unknown(String),
}

impl Permission {
    /// Levels allowed to merge by default
    pub const MERGE_DEFAULTS: [Self; 3] = [Self::Admin, Self::Maintain, Self::Write];

    /// Upper-case name as GitHub reports it
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "ADMIN",
            Self::Maintain => "MAINTAIN",
            Self::Write => "WRITE",
            Self::Triage => "TRIAGE",
            Self::Read => "READ",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for Permission {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Self::Admin,
            "MAINTAIN" => Self::Maintain,
            "WRITE" => Self::Write,
            "TRIAGE" => Self::Triage,
            "READ" => Self::Read,
            _ => Self::Unknown(raw.to_string()),
        }
    }
}

impl From<String> for Permission {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<Permission> for String {
    fn from(permission: Permission) -> Self {
        permission.as_str().to_string()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A branch reference inside one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// GraphQL node ID of the ref
    pub id: String,
    /// Branch name
    pub name: String,
    /// Latest commit hash
    pub oid: String,
    /// Latest commit message
    pub message: String,
}

/// A repository as seen by one directory query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// GraphQL node ID of the repository
    pub id: String,
    /// Repository name, unique within the organization
    pub name: String,
    /// Caller's permission level
    pub permission: Permission,
    /// The queried branch, `None` when the repository lacks it
    pub reference: Option<Reference>,
}

impl Repository {
    /// Whether the queried branch exists in this repository
    pub const fn has_reference(&self) -> bool {
        self.reference.is_some()
    }
}

/// Result of a successful merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// Hash of the merge commit
    pub commit_hash: String,
    /// Web URL of the merge commit
    pub commit_url: String,
    /// Message of the merge commit
    pub commit_message: String,
}

/// Category of a remote error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RemoteErrorKind {
    /// Caller lacks the permission level required to merge
    Permission,
    /// GitHub refused the operation (conflicts, already merged, ...)
    Unprocessable,
    /// Access denied by GitHub
    Forbidden,
    /// Repository or branch not found
    NotFound,
    /// Any other error type, kept verbatim
    Other(String),
}

impl RemoteErrorKind {
    /// Upper-case name as GitHub reports it
    pub fn as_str(&self) -> &str {
        match self {
            Self::Permission => "PERMISSION",
            Self::Unprocessable => "UNPROCESSABLE",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Other(raw) => raw,
        }
    }
}

impl From<&str> for RemoteErrorKind {
    fn from(raw: &str) -> Self {
        match raw {
            "PERMISSION" => Self::Permission,
            "UNPROCESSABLE" => Self::Unprocessable,
            "FORBIDDEN" => Self::Forbidden,
            "NOT_FOUND" => Self::NotFound,
            _ => Self::Other(raw.to_string()),
        }
    }
}

impl From<String> for RemoteErrorKind {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<RemoteErrorKind> for String {
    fn from(kind: RemoteErrorKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Structured error returned by the remote service for one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Error category
    pub kind: RemoteErrorKind,
    /// Human-readable message
    pub message: String,
}

impl RemoteError {
    /// Create a remote error
    pub fn new(kind: impl Into<RemoteErrorKind>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.as_str().is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{} ({})", self.message, self.kind.as_str())
        }
    }
}

impl std::error::Error for RemoteError {}

/// Classified result of one merge attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryOutcome {
    /// The merge produced a commit
    Succeeded(MergeOutcome),
    /// Nothing to do, the branches were already merged
    Unprocessed(String),
    /// The merge was refused or failed
    Failed(RemoteError),
}

/// A repository merged during a phase
#[derive(Debug, Clone, Serialize)]
pub struct MergedRepository {
    /// The repository
    pub repository: Repository,
    /// The resulting merge commit
    pub merge: MergeOutcome,
}

/// A repository left untouched because it was already merged
#[derive(Debug, Clone, Serialize)]
pub struct UnprocessedRepository {
    /// The repository
    pub repository: Repository,
    /// Message returned by the remote service
    pub message: String,
}

/// A repository whose merge failed
#[derive(Debug, Clone, Serialize)]
pub struct FailedRepository {
    /// The repository
    pub repository: Repository,
    /// Why the merge failed
    pub error: RemoteError,
}

/// Outcome of one merge phase (head → base across many repositories)
///
/// Every repository that entered the phase sits in exactly one bucket.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PhaseResult {
    /// Branch merged into
    pub base: String,
    /// Branch merged from
    pub head: String,
    /// Repositories where a merge commit was created
    pub succeeded: Vec<MergedRepository>,
    /// Repositories that were already merged
    pub unprocessed: Vec<UnprocessedRepository>,
    /// Repositories where the merge failed
    pub failed: Vec<FailedRepository>,
}

impl PhaseResult {
    /// Create an empty result for a head → base phase
    pub fn new(base: impl Into<String>, head: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            head: head.into(),
            ..Self::default()
        }
    }

    /// File a repository into the bucket matching its outcome
    pub fn record(&mut self, repository: Repository, outcome: RepositoryOutcome) {
        match outcome {
            RepositoryOutcome::Succeeded(merge) => {
                self.succeeded.push(MergedRepository { repository, merge });
            }
            RepositoryOutcome::Unprocessed(message) => {
                self.unprocessed
                    .push(UnprocessedRepository { repository, message });
            }
            RepositoryOutcome::Failed(error) => {
                self.failed.push(FailedRepository { repository, error });
            }
        }
    }

    /// Number of repositories that entered the phase
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.unprocessed.len() + self.failed.len()
    }

    /// Whether no repository entered the phase
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Whether any repository failed
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Repositories now containing the head branch's content
    ///
    /// Succeeded followed by unprocessed; failed repositories never appear.
    pub fn eligible(&self) -> impl Iterator<Item = &Repository> {
        self.succeeded
            .iter()
            .map(|m| &m.repository)
            .chain(self.unprocessed.iter().map(|u| &u.repository))
    }

    /// Names of merged repositories
    pub fn succeeded_names(&self) -> Vec<&str> {
        self.succeeded
            .iter()
            .map(|m| m.repository.name.as_str())
            .collect()
    }

    /// Names of already-merged repositories
    pub fn unprocessed_names(&self) -> Vec<&str> {
        self.unprocessed
            .iter()
            .map(|u| u.repository.name.as_str())
            .collect()
    }

    /// Names of failed repositories
    pub fn failed_names(&self) -> Vec<&str> {
        self.failed
            .iter()
            .map(|f| f.repository.name.as_str())
            .collect()
    }
}

fn write_section<'a>(
    f: &mut fmt::Formatter<'_>,
    heading: &str,
    lines: impl Iterator<Item = (&'a str, &'a str)>,
) -> fmt::Result {
    let rule = "-".repeat(REPORT_RULE_WIDTH);
    writeln!(f, "{rule}")?;
    writeln!(f, "{heading}")?;
    writeln!(f, "{rule}")?;
    for (name, detail) in lines {
        writeln!(f, "{name}: {detail}")?;
    }
    writeln!(f, "{rule}")
}

impl fmt::Display for PhaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_section(
            f,
            "SUCCEEDED",
            self.succeeded
                .iter()
                .map(|m| (m.repository.name.as_str(), m.merge.commit_url.as_str())),
        )?;
        write_section(
            f,
            "UNPROCESSED",
            self.unprocessed
                .iter()
                .map(|u| (u.repository.name.as_str(), u.message.as_str())),
        )?;
        write_section(
            f,
            "FAILED",
            self.failed
                .iter()
                .map(|r| (r.repository.name.as_str(), r.error.message.as_str())),
        )
    }
}
