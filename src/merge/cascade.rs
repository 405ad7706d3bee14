//! Cascade controller - head → base, then optionally base → release
//!
//! Phase 2 depends on phase 1's results, so it only starts once phase 1
//! has fully completed.

use crate::error::Result;
use crate::merge::execute::{MergeOptions, run_phase};
use crate::merge::matcher::{match_repositories, select_release_candidates};
use crate::merge::progress::MergeProgress;
use crate::platform::RepositoryService;
use crate::types::{PhaseResult, Repository};
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

/// Branches involved in one automerge run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoMergeRequest {
    /// Branch to merge into (e.g. `master`)
    pub base: String,
    /// Branch to merge from (e.g. `REL-2910`)
    pub head: String,
    /// Release branch to receive base afterwards, if any
    pub current_release: Option<String>,
}

impl AutoMergeRequest {
    /// Create a request without a cascade
    pub fn new(base: impl Into<String>, head: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            head: head.into(),
            current_release: None,
        }
    }

    /// Also cascade base into the given release branch
    #[must_use]
    pub fn with_current_release(mut self, release: impl Into<String>) -> Self {
        self.current_release = Some(release.into());
        self
    }

    /// The release branch, ignoring blank values
    fn release_branch(&self) -> Option<&str> {
        self.current_release
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

/// List both branches and match repositories carrying both
async fn gather_phase_one(
    request: &AutoMergeRequest,
    service: &dyn RepositoryService,
) -> Result<Vec<Repository>> {
    let head_snapshot = service.list_repositories(&request.head).await?;
    let head_count = head_snapshot.iter().filter(|r| r.has_reference()).count();
    info!(count = head_count, head = %request.head, "found repositories matching head");

    let base_snapshot = service.list_repositories(&request.base).await?;
    let matched = match_repositories(&request.head, &head_snapshot, &request.base, base_snapshot)?;
    info!(count = matched.len(), base = %request.base, "found repositories matching base");

    Ok(matched)
}

/// Run an automerge (EFFECTFUL)
///
/// Phase 1 merges head into base in every repository carrying both. When
/// a release branch is requested, phase 2 merges base into it for the
/// repositories that succeeded or were already merged in phase 1 and that
/// carry the release branch.
///
/// Returns the phase results in phase order (one or two entries).
///
/// # Errors
/// * [`Error::NoHeadMatch`] / [`Error::NoBaseMatch`] from matching
/// * [`Error::NoEligibleRelease`] when no eligible repository carries the
///   release branch
/// * service failures and cancellation from either phase
///
/// [`Error::NoHeadMatch`]: crate::error::Error::NoHeadMatch
/// [`Error::NoBaseMatch`]: crate::error::Error::NoBaseMatch
/// [`Error::NoEligibleRelease`]: crate::error::Error::NoEligibleRelease
pub async fn auto_merge(
    request: &AutoMergeRequest,
    service: &dyn RepositoryService,
    options: &MergeOptions,
    progress: &dyn MergeProgress,
) -> Result<Vec<PhaseResult>> {
    let candidates = gather_phase_one(request, service).await?;

    let phase_one = run_phase(
        service,
        &request.base,
        &request.head,
        candidates,
        options,
        progress,
    )
    .await?;

    let eligible: HashSet<&str> = phase_one.eligible().map(|r| r.name.as_str()).collect();

    let Some(release) = request.release_branch() else {
        return Ok(vec![phase_one]);
    };

    if eligible.is_empty() {
        progress
            .on_message(&format!(
                "No eligible repositories to merge into {release}"
            ))
            .await;
        return Ok(vec![phase_one]);
    }

    progress
        .on_message(&format!(
            "Merging {} into current release branch {release}",
            request.base
        ))
        .await;

    let release_snapshot = service.list_repositories(release).await?;
    let release_candidates = select_release_candidates(release, &eligible, release_snapshot)?;
    info!(
        count = release_candidates.len(),
        release,
        "found eligible repositories matching release"
    );

    let phase_two = run_phase(
        service,
        release,
        &request.base,
        release_candidates,
        options,
        progress,
    )
    .await?;

    Ok(vec![phase_one, phase_two])
}

/// What an automerge would do, without merging anything
#[derive(Debug, Clone, Serialize)]
pub struct AutoMergePlan {
    /// Branch to merge into
    pub base: String,
    /// Branch to merge from
    pub head: String,
    /// Repositories phase 1 would attempt
    pub candidates: Vec<Repository>,
    /// Candidates the permission guard would reject
    pub denied: Vec<String>,
    /// Release branch, if requested
    pub current_release: Option<String>,
    /// Repositories phase 2 would attempt if every permitted candidate
    /// succeeded in phase 1
    pub release_candidates: Vec<Repository>,
}

/// Plan an automerge (dry run)
///
/// Performs the same listings and matching as [`auto_merge`] but no
/// merges. The release candidates assume every phase-1 candidate that
/// passes the permission guard ends up eligible.
///
/// # Errors
/// Same matching errors as [`auto_merge`], plus service failures.
pub async fn plan_auto_merge(
    request: &AutoMergeRequest,
    service: &dyn RepositoryService,
    options: &MergeOptions,
) -> Result<AutoMergePlan> {
    let candidates = gather_phase_one(request, service).await?;

    let denied: Vec<String> = candidates
        .iter()
        .filter(|r| !options.guard.permits(r))
        .map(|r| r.name.clone())
        .collect();

    let release = request.release_branch().map(str::to_string);
    let release_candidates = match release.as_deref() {
        Some(release) => {
            let assumed: HashSet<&str> = candidates
                .iter()
                .filter(|r| options.guard.permits(r))
                .map(|r| r.name.as_str())
                .collect();
            if assumed.is_empty() {
                Vec::new()
            } else {
                let snapshot = service.list_repositories(release).await?;
                select_release_candidates(release, &assumed, snapshot)?
            }
        }
        None => Vec::new(),
    };

    Ok(AutoMergePlan {
        base: request.base.clone(),
        head: request.head.clone(),
        candidates,
        denied,
        current_release: release,
        release_candidates,
    })
}
