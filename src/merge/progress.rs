//! Progress reporting for merge runs

use crate::types::{PhaseResult, Repository, RepositoryOutcome};
use async_trait::async_trait;

/// Receives progress updates while a merge run executes
///
/// The CLI renders these to the terminal; tests use [`NoopProgress`].
#[async_trait]
pub trait MergeProgress: Send + Sync {
    /// A phase is about to merge `head` into `base` for `count` repositories
    async fn on_phase_start(&self, base: &str, head: &str, count: usize);

    /// One repository finished its merge attempt
    async fn on_repository_done(&self, repository: &Repository, outcome: &RepositoryOutcome);

    /// A phase finished; `result` holds every repository that entered it
    async fn on_phase_complete(&self, result: &PhaseResult);

    /// Free-form status message
    async fn on_message(&self, message: &str);
}

/// Progress callback that ignores every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl MergeProgress for NoopProgress {
    async fn on_phase_start(&self, _base: &str, _head: &str, _count: usize) {}

    async fn on_repository_done(&self, _repository: &Repository, _outcome: &RepositoryOutcome) {}

    async fn on_phase_complete(&self, _result: &PhaseResult) {}

    async fn on_message(&self, _message: &str) {}
}
