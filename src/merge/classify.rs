//! Outcome classification for failed merges

use crate::types::{RemoteError, RepositoryOutcome};

/// Marker GitHub puts in the message when head is already contained in base
const ALREADY_MERGED: &str = "already merged";

/// Whether a remote error message reports that the branches were already merged
///
/// The check is a case-insensitive substring match.
#[must_use]
pub fn is_already_merged(message: &str) -> bool {
    message.to_lowercase().contains(ALREADY_MERGED)
}

/// Classify a remote merge error (PURE)
///
/// "Already merged" is the desired end state and becomes
/// [`RepositoryOutcome::Unprocessed`]; everything else is a failure that
/// keeps the original message for the report.
#[must_use]
pub fn classify_merge_error(error: RemoteError) -> RepositoryOutcome {
    if is_already_merged(&error.message) {
        RepositoryOutcome::Unprocessed(error.message)
    } else {
        RepositoryOutcome::Failed(error)
    }
}
