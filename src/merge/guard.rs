//! Permission guard - who may merge

use crate::types::{Permission, RemoteError, RemoteErrorKind, Repository};

/// Allow-list of permission levels required to merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGuard {
    allowed: Vec<Permission>,
}

impl Default for PermissionGuard {
    fn default() -> Self {
        Self::new(Permission::MERGE_DEFAULTS.to_vec())
    }
}

impl PermissionGuard {
    /// Create a guard allowing exactly the given levels
    pub const fn new(allowed: Vec<Permission>) -> Self {
        Self { allowed }
    }

    /// Levels this guard accepts
    pub fn allowed(&self) -> &[Permission] {
        &self.allowed
    }

    /// Whether the caller may merge in this repository
    #[must_use]
    pub fn permits(&self, repository: &Repository) -> bool {
        self.allowed.contains(&repository.permission)
    }

    /// Check a repository right before merging into it.
    ///
    /// A rejection is a `PERMISSION` remote error naming the offending level
    /// and the allow-list, so it can be filed with the phase's failures.
    pub fn check(&self, repository: &Repository) -> Result<(), RemoteError> {
        if self.permits(repository) {
            return Ok(());
        }

        let allowed: Vec<&str> = self.allowed.iter().map(Permission::as_str).collect();
        Err(RemoteError::new(
            RemoteErrorKind::Permission,
            format!(
                "Invalid permission for merge ({}). Valid permissions are: [{}]",
                repository.permission,
                allowed.join(",")
            ),
        ))
    }
}
