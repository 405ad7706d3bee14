//! Merge execution - effectful operations
//!
//! Runs one merge phase: a merge attempt per repository, each classified
//! into succeeded, unprocessed or failed. Attempts are independent and run
//! through a bounded pool; a refused merge never affects its neighbours.

use crate::error::{Error, Result};
use crate::merge::classify::classify_merge_error;
use crate::merge::guard::PermissionGuard;
use crate::merge::progress::MergeProgress;
use crate::platform::RepositoryService;
use crate::types::{PhaseResult, Repository, RepositoryOutcome};
use futures_util::StreamExt;
use futures_util::stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Commit message used when none is configured
pub const DEFAULT_COMMIT_MESSAGE: &str = "Merge completed by AutoMerge utility";

/// Merge attempts in flight per phase when none is configured
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Options shared by every merge phase of a run
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Permission levels allowed to merge
    pub guard: PermissionGuard,
    /// Commit message template; `{base}`, `{head}` and `{repo}` are substituted
    pub commit_message: String,
    /// Maximum merge attempts in flight (values below 1 mean 1)
    pub concurrency: usize,
    /// Stops attempts that have not started yet
    pub cancel: Option<CancellationToken>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            guard: PermissionGuard::default(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            cancel: None,
        }
    }
}

impl MergeOptions {
    /// Render the commit message for one repository
    #[must_use]
    pub fn commit_message_for(&self, repository: &Repository, base: &str, head: &str) -> String {
        self.commit_message
            .replace("{base}", base)
            .replace("{head}", head)
            .replace("{repo}", &repository.name)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Attempt to merge `head` into `base` in one repository
///
/// Permission rejections and remote refusals are folded into the returned
/// outcome. Only errors that make the service itself unusable are returned
/// as `Err`.
pub async fn attempt_merge(
    service: &dyn RepositoryService,
    base: &str,
    head: &str,
    repository: &Repository,
    options: &MergeOptions,
) -> Result<RepositoryOutcome> {
    if let Err(denied) = options.guard.check(repository) {
        warn!(
            repository = %repository.name,
            permission = %repository.permission,
            "permission denied"
        );
        return Ok(RepositoryOutcome::Failed(denied));
    }

    info!(repository = %repository.name, "{head} ==>> {base}");
    let message = options.commit_message_for(repository, base, head);

    match service.merge_branch(repository, base, head, &message).await {
        Ok(merge) => {
            info!(repository = %repository.name, sha = %merge.commit_hash, "merge completed");
            Ok(RepositoryOutcome::Succeeded(merge))
        }
        Err(Error::Remote(remote)) => {
            let outcome = classify_merge_error(remote);
            match &outcome {
                RepositoryOutcome::Unprocessed(_) => {
                    warn!(repository = %repository.name, "already merged");
                }
                RepositoryOutcome::Failed(e) => {
                    warn!(repository = %repository.name, error = %e, "merge failed");
                }
                RepositoryOutcome::Succeeded(_) => {}
            }
            Ok(outcome)
        }
        Err(e) => Err(e),
    }
}

/// Warn when the service's remaining request budget looks too small
async fn check_rate_limit(service: &dyn RepositoryService, needed: usize) {
    match service.rate_limit_remaining().await {
        Ok(Some(remaining)) if (remaining as usize) < needed => {
            warn!(remaining, needed, "rate limit budget is lower than the number of merges");
        }
        Ok(remaining) => debug!(?remaining, needed, "rate limit budget"),
        Err(e) => debug!(error = %e, "could not read rate limit"),
    }
}

/// Run one merge phase (EFFECTFUL)
///
/// Attempts one merge per repository, at most `options.concurrency` at a
/// time. Results are recorded in input order whatever order the attempts
/// finish in.
///
/// # Errors
/// * transport or service failures abort the phase immediately
/// * [`Error::Cancelled`] when the cancellation token fired before every
///   repository was attempted; it carries the repositories that completed
pub async fn run_phase(
    service: &dyn RepositoryService,
    base: &str,
    head: &str,
    repositories: Vec<Repository>,
    options: &MergeOptions,
    progress: &dyn MergeProgress,
) -> Result<PhaseResult> {
    let mut result = PhaseResult::new(base, head);
    let count = repositories.len();

    progress.on_phase_start(base, head, count).await;

    if count > 0 {
        check_rate_limit(service, count).await;
    }

    let mut attempts = stream::iter(repositories.into_iter().enumerate())
        .map(|(index, repository)| async move {
            if options.is_cancelled() {
                return (index, repository, None);
            }
            let outcome = attempt_merge(service, base, head, &repository, options).await;
            (index, repository, Some(outcome))
        })
        .buffer_unordered(options.concurrency.max(1));

    let mut finished = Vec::with_capacity(count);
    let mut skipped = 0usize;

    while let Some((index, repository, outcome)) = attempts.next().await {
        match outcome {
            Some(Ok(outcome)) => {
                progress.on_repository_done(&repository, &outcome).await;
                finished.push((index, repository, outcome));
            }
            Some(Err(e)) => return Err(e),
            None => skipped += 1,
        }
    }

    finished.sort_by_key(|(index, ..)| *index);
    for (_, repository, outcome) in finished {
        result.record(repository, outcome);
    }

    if skipped > 0 {
        warn!(skipped, "merge phase cancelled");
        return Err(Error::Cancelled {
            base: base.to_string(),
            head: head.to_string(),
            partial: Box::new(result),
        });
    }

    info!(
        succeeded = result.succeeded.len(),
        unprocessed = result.unprocessed.len(),
        failed = result.failed.len(),
        "merge of {head} into {base} complete"
    );
    progress.on_phase_complete(&result).await;

    Ok(result)
}
