//! Merge engine for organization-wide branch merges
//!
//! Pure parts (matching, permission checks, classification) are kept
//! apart from the effectful executor and cascade controller:
//! 1. Match - join directory snapshots by repository name (pure)
//! 2. Execute - one merge attempt per repository, classified (effectful)
//! 3. Cascade - feed phase-1 eligibility into an optional second phase

mod cascade;
mod classify;
mod execute;
mod guard;
mod matcher;
mod progress;

pub use cascade::{AutoMergePlan, AutoMergeRequest, auto_merge, plan_auto_merge};
pub use classify::{classify_merge_error, is_already_merged};
pub use execute::{
    DEFAULT_COMMIT_MESSAGE, DEFAULT_CONCURRENCY, MergeOptions, attempt_merge, run_phase,
};
pub use guard::PermissionGuard;
pub use matcher::{match_repositories, select_release_candidates};
pub use progress::{MergeProgress, NoopProgress};
