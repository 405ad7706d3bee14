//! org-automerge: merge one branch into another across an organization
//!
//! Every repository of a GitHub organization that carries both branches
//! gets the head branch merged into the base branch. Optionally, the base
//! branch is then cascaded into a current release branch for every
//! repository that now contains it.
//!
//! The entry point is [`merge::auto_merge`], driven by a
//! [`platform::RepositoryService`].

pub mod config;
pub mod error;
pub mod merge;
pub mod platform;
pub mod types;
