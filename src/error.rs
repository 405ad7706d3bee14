//! Error types for org-automerge

use crate::types::{PhaseResult, RemoteError};
use thiserror::Error;

/// Errors that abort an automerge run
///
/// Per-repository failures (permissions, already merged, refused merges)
/// are not errors: they are recorded in a [`PhaseResult`].
#[derive(Debug, Error)]
pub enum Error {
    /// No repository carries the head branch
    #[error("no repositories were found matching the head branch: {0}")]
    NoHeadMatch(String),

    /// None of the head-branch repositories carries the base branch
    #[error("no repositories were found matching the base branch: {0}")]
    NoBaseMatch(String),

    /// None of the eligible repositories carries the release branch
    #[error("no eligible repositories matching the current release branch: {0}")]
    NoEligibleRelease(String),

    /// Structured error reported by the remote service
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// GitHub API or transport failure
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Repository service failure outside the GitHub client
    #[error("platform error: {0}")]
    Platform(String),

    /// Invalid or missing configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// The run was cancelled before every repository was attempted
    #[error("merge of {head} into {base} cancelled after {} repositories", .partial.total())]
    Cancelled {
        /// Branch being merged into
        base: String,
        /// Branch being merged from
        head: String,
        /// Repositories attempted before cancellation
        partial: Box<PhaseResult>,
    },

    /// Unexpected internal failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this is one of the "no repositories match" errors
    #[must_use]
    pub const fn is_no_match(&self) -> bool {
        matches!(self, Self::NoHeadMatch(_) | Self::NoBaseMatch(_))
    }
}

impl From<octocrab::Error> for Error {
    fn from(e: octocrab::Error) -> Self {
        Self::GitHubApi(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::GitHubApi(e.to_string())
    }
}

/// Result type for org-automerge operations
pub type Result<T> = std::result::Result<T, Error>;
