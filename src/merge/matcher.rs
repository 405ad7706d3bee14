//! Repository matching - pure functions over directory snapshots
//!
//! Repositories are joined by name. A repository only takes part in a
//! join when the queried branch exists in it.

use crate::error::{Error, Result};
use crate::types::Repository;
use std::collections::HashSet;
use std::hash::BuildHasher;

/// Names of repositories in a snapshot that carry the queried branch
fn referenced_names(snapshot: &[Repository]) -> HashSet<&str> {
    snapshot
        .iter()
        .filter(|r| r.has_reference())
        .map(|r| r.name.as_str())
        .collect()
}

/// Match repositories carrying both the head and the base branch (PURE)
///
/// Returns the base-snapshot entries, in base-snapshot order, whose base
/// reference exists and whose name appears in the head snapshot with a
/// head reference.
///
/// # Errors
/// * [`Error::NoHeadMatch`] when no repository carries the head branch
/// * [`Error::NoBaseMatch`] when none of those carries the base branch
pub fn match_repositories(
    head: &str,
    head_snapshot: &[Repository],
    base: &str,
    base_snapshot: Vec<Repository>,
) -> Result<Vec<Repository>> {
    let head_names = referenced_names(head_snapshot);
    if head_names.is_empty() {
        return Err(Error::NoHeadMatch(head.to_string()));
    }

    let matched: Vec<Repository> = base_snapshot
        .into_iter()
        .filter(|r| r.has_reference() && head_names.contains(r.name.as_str()))
        .collect();

    if matched.is_empty() {
        return Err(Error::NoBaseMatch(base.to_string()));
    }

    Ok(matched)
}

/// Select cascade candidates from a release-branch snapshot (PURE)
///
/// Keeps release-snapshot entries that carry the release branch and whose
/// name is in `eligible`, preserving snapshot order.
///
/// # Errors
/// [`Error::NoEligibleRelease`] when nothing qualifies.
pub fn select_release_candidates<S: BuildHasher>(
    release: &str,
    eligible: &HashSet<&str, S>,
    release_snapshot: Vec<Repository>,
) -> Result<Vec<Repository>> {
    let candidates: Vec<Repository> = release_snapshot
        .into_iter()
        .filter(|r| r.has_reference() && eligible.contains(r.name.as_str()))
        .collect();

    if candidates.is_empty() {
        return Err(Error::NoEligibleRelease(release.to_string()));
    }

    Ok(candidates)
}
